//! 參考網路情境分析示例
//!
//! 用法: `cargo run --example reference_network [資料目錄]`
//! 資料目錄需包含 plants.csv、distribution_centers.csv、markets.csv、transportation.csv；
//! 未提供時使用內建的小型網路。

use netopt::{
    ApiResponse, DistributionCenter, Location, Market, NetworkOptimizer, OptimizerConfig, Plant, Route, Topology,
    TransportMode,
};
use netopt_core::loader;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== 供應鏈網路情境分析 ===\n");

    let topology = match std::env::args().nth(1) {
        Some(dir) => {
            println!("從 {} 載入網路資料", dir);
            loader::from_csv_dir(dir)?
        }
        None => reference_topology()?,
    };

    let optimizer = NetworkOptimizer::new(topology, OptimizerConfig::default())?;

    println!("可用情境:");
    for scenario in optimizer.list_scenarios() {
        println!("  - {} ({}): {}", scenario.id, scenario.name, scenario.description);
    }

    let ids: Vec<String> = optimizer.list_scenarios().into_iter().map(|s| s.id).collect();
    for id in &ids {
        println!("\n--- {} ---", id);
        match optimizer.optimize(id) {
            ApiResponse::Success(response) => {
                let summary = &response.solution_summary;
                println!(
                    "  狀態: {:?}，總成本: {:.0}，滿足率: {:.1}%",
                    summary.status, summary.objective_value, summary.fill_rate_pct
                );
                for kpi in response.kpis.iter() {
                    println!("  {:<26} {:>14}  {}", kpi.name.as_str(), kpi.formatted, kpi.benchmark);
                }
                for insight in &response.insights {
                    println!("  [{}] {}", insight.priority.as_str(), insight.title);
                }
            }
            ApiResponse::Failure(err) => {
                println!("  失敗 [{}]: {}", err.error.kind, err.error.message);
            }
        }
    }

    if let Some(flows) = optimizer.get_network_data().latest_flows {
        println!("\n最近一次解（{}）共 {} 條有流量的路線", flows.scenario_id, flows.flows.len());
    }

    Ok(())
}

fn reference_topology() -> netopt::Result<Topology> {
    let fuschl = Location::new(47.79, 13.30);
    let concord = Location::new(35.41, -80.58);
    let sao_paulo = Location::new(-23.55, -46.63);
    let hamburg = Location::new(53.55, 9.99);
    let atlanta = Location::new(33.75, -84.39);
    let santos = Location::new(-23.96, -46.33);

    let plants = vec![
        Plant::new("P1", fuschl, 4_000_000.0, 0.12).with_name("Fuschl am See"),
        Plant::new("P2", concord, 2_500_000.0, 0.10).with_name("Concord"),
        Plant::new("P3", sao_paulo, 1_000_000.0, 0.09).with_name("São Paulo"),
    ];
    let dcs = vec![
        DistributionCenter::new("DC1", hamburg, 3_000_000.0, 250_000.0, 0.03).with_region("Europe"),
        DistributionCenter::new("DC2", atlanta, 2_500_000.0, 220_000.0, 0.03).with_region("North America"),
        DistributionCenter::new("DC3", santos, 1_000_000.0, 120_000.0, 0.02).with_region("Latin America"),
    ];
    let markets = vec![
        Market::new("DE", hamburg, 1_800_000.0, 1.45).with_name("Germany"),
        Market::new("UK", Location::new(51.51, -0.13), 900_000.0, 1.40).with_name("United Kingdom"),
        Market::new("US", atlanta, 2_600_000.0, 1.55).with_name("United States"),
        Market::new("BR", sao_paulo, 700_000.0, 1.10).with_name("Brazil"),
    ];
    let routes = vec![
        Route::supply("P1", "DC1", TransportMode::Road, 0.04, 2.0),
        Route::supply("P1", "DC2", TransportMode::Sea, 0.09, 18.0),
        Route::supply("P2", "DC2", TransportMode::Road, 0.03, 1.0),
        Route::supply("P2", "DC1", TransportMode::Sea, 0.08, 16.0),
        Route::supply("P3", "DC3", TransportMode::Road, 0.02, 1.0),
        Route::supply("P3", "DC2", TransportMode::Sea, 0.07, 14.0),
        Route::delivery("DC1", "DE", TransportMode::Road, 0.02, 1.0),
        Route::delivery("DC1", "UK", TransportMode::Road, 0.05, 3.0),
        Route::delivery("DC2", "US", TransportMode::Road, 0.04, 3.0),
        Route::delivery("DC3", "BR", TransportMode::Road, 0.03, 2.0),
        Route::delivery("DC2", "BR", TransportMode::Sea, 0.08, 12.0),
    ];

    Topology::new(plants, dcs, markets, routes)
}
