//! Ratio outcomes and threshold classification.

use crate::domain::model::Tier;
use serde::{Deserialize, Serialize};

/// Result of a derived ratio. Division by zero and missing inputs are `Undefined`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    Undefined,
}

impl Ratio {
    /// `numerator / denominator * 100`, for day-over-day deltas.
    pub fn percent(numerator: Option<i64>, denominator: Option<i64>) -> Self {
        match (numerator, denominator) {
            (Some(_), Some(0)) => Ratio::Undefined,
            (Some(n), Some(d)) => Ratio::finite(n as f64 / d as f64 * 100.0),
            _ => Ratio::Undefined,
        }
    }

    /// `numerator / denominator * factor`, for per-facility load.
    pub fn scaled(numerator: Option<u64>, denominator: Option<u64>, factor: f64) -> Self {
        match (numerator, denominator) {
            (Some(_), Some(0)) => Ratio::Undefined,
            (Some(n), Some(d)) => Ratio::finite(n as f64 / d as f64 * factor),
            _ => Ratio::Undefined,
        }
    }

    fn finite(value: f64) -> Self {
        if value.is_finite() {
            Ratio::Value(value)
        } else {
            Ratio::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// The tier applies when the value is strictly greater than this.
    pub above: f64,
    pub tier: Tier,
}

/// A descending cutoff table with a floor tier for values that clear none of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cutoffs: Vec<Threshold>,
    pub floor: Tier,
}

impl Thresholds {
    pub fn trend() -> Self {
        Self {
            cutoffs: vec![
                Threshold {
                    above: 140.0,
                    tier: Tier::TooDanger,
                },
                Threshold {
                    above: 120.0,
                    tier: Tier::Danger,
                },
                Threshold {
                    above: 100.0,
                    tier: Tier::Warning,
                },
                Threshold {
                    above: 80.0,
                    tier: Tier::Caution,
                },
            ],
            floor: Tier::Attention,
        }
    }

    pub fn capacity() -> Self {
        Self {
            cutoffs: vec![
                Threshold {
                    above: 1000.0,
                    tier: Tier::TooDangerArea,
                },
                Threshold {
                    above: 700.0,
                    tier: Tier::DangerArea,
                },
                Threshold {
                    above: 400.0,
                    tier: Tier::WarningArea,
                },
                Threshold {
                    above: 100.0,
                    tier: Tier::CautionArea,
                },
            ],
            floor: Tier::AttentionArea,
        }
    }

    /// Cutoffs must be finite and strictly descending.
    pub fn check(&self) -> Result<(), String> {
        if let Some(bad) = self.cutoffs.iter().find(|t| !t.above.is_finite()) {
            return Err(format!("cutoff {} is not a finite number", bad.above));
        }
        for pair in self.cutoffs.windows(2) {
            if pair[0].above <= pair[1].above {
                return Err(format!(
                    "cutoffs must be strictly descending, found {} before {}",
                    pair[0].above, pair[1].above
                ));
            }
        }
        Ok(())
    }

    /// Every cutoff tier and the floor must belong to `family`.
    pub fn check_tiers(&self, family: &[Tier]) -> Result<(), String> {
        let tiers = self
            .cutoffs
            .iter()
            .map(|t| t.tier)
            .chain(std::iter::once(self.floor));
        for tier in tiers {
            if !family.contains(&tier) {
                return Err(format!("tier {} does not belong in this table", tier));
            }
        }
        Ok(())
    }
}

pub fn classify(ratio: Ratio, thresholds: &Thresholds) -> Tier {
    match ratio {
        Ratio::Value(value) if value.is_finite() => thresholds
            .cutoffs
            .iter()
            .find(|t| value > t.above)
            .map(|t| t.tier)
            .unwrap_or(thresholds.floor),
        _ => Tier::NoData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_boundaries_are_exclusive() {
        let table = Thresholds::trend();
        assert_eq!(classify(Ratio::Value(140.0), &table), Tier::Danger);
        assert_eq!(classify(Ratio::Value(140.0001), &table), Tier::TooDanger);
        assert_eq!(classify(Ratio::Value(120.0), &table), Tier::Warning);
        assert_eq!(classify(Ratio::Value(100.5), &table), Tier::Warning);
        assert_eq!(classify(Ratio::Value(80.0), &table), Tier::Attention);
        assert_eq!(classify(Ratio::Value(80.01), &table), Tier::Caution);
        assert_eq!(classify(Ratio::Value(-50.0), &table), Tier::Attention);
    }

    #[test]
    fn test_capacity_boundaries() {
        let table = Thresholds::capacity();
        assert_eq!(classify(Ratio::Value(1000.0), &table), Tier::DangerArea);
        assert_eq!(classify(Ratio::Value(1000.5), &table), Tier::TooDangerArea);
        assert_eq!(classify(Ratio::Value(400.0), &table), Tier::CautionArea);
        assert_eq!(classify(Ratio::Value(114.0), &table), Tier::CautionArea);
        assert_eq!(classify(Ratio::Value(100.0), &table), Tier::AttentionArea);
        assert_eq!(classify(Ratio::Value(0.0), &table), Tier::AttentionArea);
    }

    #[test]
    fn test_undefined_is_no_data() {
        assert_eq!(classify(Ratio::Undefined, &Thresholds::trend()), Tier::NoData);
        assert_eq!(classify(Ratio::Value(f64::NAN), &Thresholds::trend()), Tier::NoData);
        assert_eq!(
            classify(Ratio::Value(f64::INFINITY), &Thresholds::capacity()),
            Tier::NoData
        );
    }

    #[test]
    fn test_percent_handles_zero_and_missing() {
        assert_eq!(Ratio::percent(Some(5), Some(0)), Ratio::Undefined);
        assert_eq!(Ratio::percent(None, Some(3)), Ratio::Undefined);
        assert_eq!(Ratio::percent(Some(5), None), Ratio::Undefined);
        assert_eq!(Ratio::percent(Some(0), Some(3)), Ratio::Value(0.0));
        let ratio = Ratio::percent(Some(5), Some(3)).value().unwrap();
        assert!((ratio - 166.666).abs() < 0.01);
        assert_eq!(Ratio::percent(Some(-6), Some(3)), Ratio::Value(-200.0));
    }

    #[test]
    fn test_scaled_utilization() {
        let utilization = Ratio::scaled(Some(2000), Some(10), 0.57).value().unwrap();
        assert!((utilization - 114.0).abs() < 1e-9);
        assert_eq!(Ratio::scaled(Some(2000), Some(0), 0.57), Ratio::Undefined);
        assert_eq!(Ratio::scaled(None, Some(10), 0.57), Ratio::Undefined);
    }

    #[test]
    fn test_check_rejects_unsorted_table() {
        assert!(Thresholds::trend().check().is_ok());
        assert!(Thresholds::capacity().check().is_ok());

        let mut table = Thresholds::trend();
        table.cutoffs.swap(0, 1);
        assert!(table.check().is_err());

        table.cutoffs = vec![Threshold {
            above: f64::NAN,
            tier: Tier::Danger,
        }];
        assert!(table.check().is_err());
    }

    #[test]
    fn test_check_tiers_rejects_other_families() {
        assert!(Thresholds::trend().check_tiers(&Tier::TREND).is_ok());
        assert!(Thresholds::capacity().check_tiers(&Tier::CAPACITY).is_ok());
        assert!(Thresholds::trend().check_tiers(&Tier::CAPACITY).is_err());

        let mut table = Thresholds::trend();
        table.floor = Tier::NoData;
        assert!(table.check_tiers(&Tier::TREND).is_err());

        let mut table = Thresholds::capacity();
        table.cutoffs[1].tier = Tier::Timeout;
        assert!(table.check_tiers(&Tier::CAPACITY).is_err());
    }
}
