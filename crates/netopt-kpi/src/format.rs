//! 顯示用數值格式化（金額以 Decimal 四捨五入）

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// 四捨五入到指定小數位數（遠離零）
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// 固定小數位數
pub fn number(value: f64, dp: u32) -> String {
    match Decimal::from_f64(value) {
        Some(d) => {
            let rounded = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", dp as usize, rounded)
        }
        None => format!("{:.*}", dp as usize, value),
    }
}

/// 金額：€338.7M / €12.5K / €160.00
pub fn eur(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1e6 {
        format!("{}€{}M", sign, number(abs / 1e6, 1))
    } else if abs >= 1e3 {
        format!("{}€{}K", sign, number(abs / 1e3, 1))
    } else {
        format!("{}€{}", sign, number(abs, 2))
    }
}

/// 單位成本：€0.244
pub fn eur_per_unit(value: f64) -> String {
    format!("€{}", number(value, 3))
}

/// 帶正負號的金額：+€1.2M / -€300.00
pub fn signed_eur(value: f64) -> String {
    if value >= 0.0 {
        format!("+{}", eur(value))
    } else {
        eur(value)
    }
}

/// 數量：12.3M / 45.0K / 80
pub fn units(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e6 {
        format!("{}M", number(value / 1e6, 1))
    } else if abs >= 1e3 {
        format!("{}K", number(value / 1e3, 1))
    } else {
        number(value, 0)
    }
}

/// 百分比：98.2%
pub fn pct(value: f64) -> String {
    format!("{}%", number(value, 1))
}

/// 帶正負號的數值：+1.5 / -0.3
pub fn signed(value: f64, dp: u32) -> String {
    let text = number(value, dp);
    if value >= 0.0 && !text.starts_with('-') {
        format!("+{}", text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(338_700_000.0, "€338.7M")]
    #[case(-20_250_000.0, "-€20.3M")]
    #[case(12_500.0, "€12.5K")]
    #[case(160.0, "€160.00")]
    fn test_eur(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(eur(value), expected);
    }

    #[test]
    fn test_other_formats() {
        assert_eq!(eur_per_unit(0.2444), "€0.244");
        assert_eq!(signed_eur(1_500_000.0), "+€1.5M");
        assert_eq!(units(80.0), "80");
        assert_eq!(units(1_250_000.0), "1.3M");
        assert_eq!(pct(97.25), "97.3%");
        assert_eq!(signed(-1.25, 1), "-1.3");
        assert_eq!(signed(0.0, 1), "+0.0");
        assert_eq!(round_dp(2.345, 2), 2.35);
    }
}
