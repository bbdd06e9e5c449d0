//! 報表匯出（KPI 表與洞察表，CSV 格式）
//!
//! 只格式化已計算好的 KPI 與洞察，不做任何求解。

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::Writer;
use netopt_core::{NetoptError, Result};
use netopt_kpi::{format, Insight, KpiSet};
use serde::Serialize;

const KPI_SHEET_HEADER: &[&str] = &[
    "kpi",
    "value",
    "formatted",
    "unit",
    "benchmark",
    "context",
    "impact",
    "driver",
    "action",
    "delta",
    "delta_pct",
    "priority",
];

const INSIGHT_SHEET_HEADER: &[&str] = &[
    "rank",
    "priority",
    "title",
    "description",
    "impact",
    "implementation",
    "impact_eur",
    "service_impact_pp",
];

/// 匯出結果（兩張 CSV 表）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub scenario_id: String,
    pub generated_at: DateTime<Utc>,
    pub kpi_sheet: String,
    pub insight_sheet: String,
}

impl Report {
    /// 寫入 `<dir>/<scenario>_kpis.csv` 與 `<dir>/<scenario>_insights.csv`
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(dir.join(format!("{}_kpis.csv", self.scenario_id)), &self.kpi_sheet)?;
        fs::write(dir.join(format!("{}_insights.csv", self.scenario_id)), &self.insight_sheet)?;
        tracing::info!("報表已寫入 {}", dir.display());
        Ok(())
    }
}

/// 將 KPI 與洞察格式化為報表
pub fn export_report(scenario_id: &str, kpis: &KpiSet, insights: &[Insight]) -> Result<Report> {
    let report = Report {
        scenario_id: scenario_id.to_string(),
        generated_at: Utc::now(),
        kpi_sheet: kpi_sheet(kpis)?,
        insight_sheet: insight_sheet(insights)?,
    };
    tracing::debug!("情境 {} 報表: {} 項 KPI，{} 則洞察", scenario_id, kpis.len(), insights.len());
    Ok(report)
}

fn kpi_sheet(kpis: &KpiSet) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(KPI_SHEET_HEADER)?;

    for kpi in kpis.iter() {
        let (delta, delta_pct) = match &kpi.delta {
            Some(d) => (
                format::number(d.absolute, 2),
                d.percent.map(|p| format::number(p, 1)).unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        writer.write_record([
            kpi.name.as_str().to_string(),
            format::number(kpi.value, 3),
            kpi.formatted.clone(),
            kpi.unit.clone(),
            kpi.benchmark.clone(),
            kpi.context.clone(),
            kpi.impact.clone(),
            kpi.driver.clone(),
            kpi.action.clone(),
            delta,
            delta_pct,
            kpi.priority.map(|p| p.as_str().to_string()).unwrap_or_default(),
        ])?;
    }

    finish(writer)
}

fn insight_sheet(insights: &[Insight]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(INSIGHT_SHEET_HEADER)?;

    for (rank, insight) in insights.iter().enumerate() {
        writer.write_record([
            (rank + 1).to_string(),
            insight.priority.as_str().to_string(),
            insight.title.clone(),
            insight.description.clone(),
            insight.impact.clone(),
            insight.implementation.clone(),
            format::number(insight.impact_eur, 2),
            format::number(insight.service_impact_pp, 1),
        ])?;
    }

    finish(writer)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| NetoptError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| NetoptError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
