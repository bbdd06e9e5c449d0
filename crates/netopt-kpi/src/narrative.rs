//! KPI 敘述規則表
//!
//! 每張表由遞增的區間組成，取第一個 `value < below` 的模板；
//! 模板中的 `{name}` 由 [`render`] 以變數替換。

/// 數值區間上界（不含）與對應模板
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub below: f64,
    pub template: &'static str,
}

/// 區間 → 模板的查表規則
#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    pub name: &'static str,
    pub bands: &'static [Band],
}

impl RuleTable {
    /// 依數值選擇模板；超出所有區間時使用最後一個
    pub fn select(&self, value: f64) -> &'static str {
        self.bands
            .iter()
            .find(|band| value < band.below)
            .or_else(|| self.bands.last())
            .map_or("", |band| band.template)
    }

    /// 選擇並渲染
    pub fn render(&self, value: f64, vars: &[(&str, String)]) -> String {
        render(self.select(value), vars)
    }
}

/// 以 `{name}` 佔位符替換變數；未提供的佔位符保持原樣
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}

const fn band(below: f64, template: &'static str) -> Band {
    Band { below, template }
}

pub const FILL_RATE_ACTION: RuleTable = RuleTable {
    name: "fill_rate.action",
    bands: &[
        band(90.0, "URGENT: Expand production capacity and add regional DCs"),
        band(95.0, "Increase DC capacity in constrained regions (e.g., {worst_market})"),
        band(f64::INFINITY, "Maintain current service levels with continuous monitoring"),
    ],
};

/// 以總成本相對基準的百分比變化（%）為鍵
pub const COST_DELTA_CONTEXT: RuleTable = RuleTable {
    name: "total_cost.context",
    bands: &[
        band(-5.0, "Optimized configuration running {delta_pct} below baseline network cost"),
        band(5.0, "Network cost in line with the baseline configuration"),
        band(f64::INFINITY, "Network cost running {delta_pct} above baseline"),
    ],
};

/// 以總成本相對基準的絕對差異為鍵
pub const COST_DELTA_IMPACT: RuleTable = RuleTable {
    name: "total_cost.impact",
    bands: &[
        band(0.0, "{delta_abs} annual savings vs baseline"),
        band(f64::MIN_POSITIVE, "No cost change vs baseline"),
        band(f64::INFINITY, "{delta_abs} annual cost increase vs baseline"),
    ],
};

pub const COST_DELTA_ACTION: RuleTable = RuleTable {
    name: "total_cost.action",
    bands: &[
        band(0.0, "Implement phased network reconfiguration over 9-12 months"),
        band(f64::MIN_POSITIVE, "Run cost optimization scenario to identify savings opportunities"),
        band(f64::INFINITY, "Establish backup capacity agreements and emergency production protocols"),
    ],
};

pub const LEAD_TIME_CONTEXT: RuleTable = RuleTable {
    name: "avg_lead_time.context",
    bands: &[
        band(3.0, "Short lead times keep safety stock low and product fresh"),
        band(7.0, "Moderate lead times require regional safety stock"),
        band(f64::INFINITY, "Long lead times raise safety stock and reduce freshness"),
    ],
};

pub const LEAD_TIME_ACTION: RuleTable = RuleTable {
    name: "avg_lead_time.action",
    bands: &[
        band(3.0, "Maintain current routing"),
        band(7.0, "Review the longest sea legs for faster alternatives"),
        band(f64::INFINITY, "Expand regional DC coverage to shorten long-haul legs"),
    ],
};

/// 以排放量 / 目標為鍵
pub const CO2_CONTEXT: RuleTable = RuleTable {
    name: "co2_emissions.context",
    bands: &[
        band(1.0, "On track for carbon targets"),
        band(f64::INFINITY, "Missing carbon reduction target"),
    ],
};

pub const CO2_ACTION: RuleTable = RuleTable {
    name: "co2_emissions.action",
    bands: &[
        band(1.0, "Maintain emission monitoring and renewable energy sourcing"),
        band(f64::INFINITY, "Modal shift to rail and renewable energy at plants"),
    ],
};

/// 以單位成本 - 預算為鍵
pub const COST_PER_UNIT_ACTION: RuleTable = RuleTable {
    name: "cost_per_unit.action",
    bands: &[
        band(0.0, "Hold cost position and monitor transport rates"),
        band(f64::INFINITY, "Route optimization and DC consolidation"),
    ],
};

pub const RESILIENCE_CONTEXT: RuleTable = RuleTable {
    name: "network_resilience_score.context",
    bands: &[
        band(60.0, "Low resilience - high risk of severe disruption impact"),
        band(80.0, "Moderate resilience - vulnerable to major facility outages"),
        band(f64::INFINITY, "High resilience - network can absorb disruptions effectively"),
    ],
};

pub const RESILIENCE_ACTION: RuleTable = RuleTable {
    name: "network_resilience_score.action",
    bands: &[
        band(60.0, "Dual-sourcing strategy for top markets and backup capacity investment"),
        band(80.0, "Add backup capacity agreements for {largest_plant}"),
        band(f64::INFINITY, "Maintain distributed production footprint"),
    ],
};

/// 以最大工廠產能占比為鍵
pub const CONCENTRATION_DRIVER: RuleTable = RuleTable {
    name: "network_resilience_score.driver",
    bands: &[
        band(0.40, "Distributed production with backup options available"),
        band(f64::INFINITY, "Over-concentration at single plant ({share} of capacity)"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(85.0, "URGENT")]
    #[case(92.0, "Increase DC capacity")]
    #[case(95.0, "Maintain")]
    #[case(100.0, "Maintain")]
    fn test_fill_rate_action_bands(#[case] fill_rate: f64, #[case] prefix: &str) {
        assert!(FILL_RATE_ACTION.select(fill_rate).starts_with(prefix));
    }

    #[rstest]
    #[case(-1.0, "Implement")]
    #[case(0.0, "Run cost optimization")]
    #[case(2.5, "Establish")]
    fn test_cost_action_bands(#[case] delta: f64, #[case] prefix: &str) {
        assert!(COST_DELTA_ACTION.select(delta).starts_with(prefix));
    }

    #[test]
    fn test_render() {
        let text = FILL_RATE_ACTION.render(92.0, &[("worst_market", "Germany".to_string())]);
        assert_eq!(text, "Increase DC capacity in constrained regions (e.g., Germany)");

        let untouched = render("{a} and {b}", &[("a", "x".to_string())]);
        assert_eq!(untouched, "x and {b}");
    }

    #[test]
    fn test_nan_falls_back_to_last_band() {
        assert_eq!(CO2_CONTEXT.select(f64::NAN), "Missing carbon reduction target");
    }
}
