use pqms_schemas::batch::YieldRange;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YieldVerdict {
    WithinLimit,
    OutOfLimit,
}

impl YieldVerdict {
    pub fn is_within(&self) -> bool {
        matches!(self, YieldVerdict::WithinLimit)
    }
}

impl fmt::Display for YieldVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YieldVerdict::WithinLimit => f.write_str("within limit"),
            YieldVerdict::OutOfLimit => f.write_str("out of limit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldReconciliation {
    pub percentage: f64,
    /// Two decimals followed by `%`, as printed on the batch record.
    pub formatted: String,
    pub verdict: YieldVerdict,
}

fn yield_percentage(actual_yield: f64, batch_size: f64) -> f64 {
    let raw = if batch_size > 0.0 {
        actual_yield * 100.0 / batch_size
    } else {
        0.0
    };
    if raw.is_finite() {
        raw
    } else {
        0.0
    }
}

/// `"98.50%"` style rendering of a yield, without a verdict.
pub fn format_yield(actual_yield: f64, batch_size: f64) -> String {
    format!("{:.2}%", yield_percentage(actual_yield, batch_size))
}

/// Actual yield as a percentage of the batch size, checked against the
/// master formula's theoretical range. Both range bounds are inclusive.
///
/// A non-positive batch size reconciles to 0%.
pub fn reconcile_yield(actual_yield: f64, batch_size: f64, range: YieldRange) -> YieldReconciliation {
    let percentage = yield_percentage(actual_yield, batch_size);
    // The verdict uses the unrounded figure; `formatted` is display only.
    let formatted = format!("{:.2}%", percentage);

    let verdict = if range.min <= percentage && percentage <= range.max {
        YieldVerdict::WithinLimit
    } else {
        YieldVerdict::OutOfLimit
    };

    YieldReconciliation {
        percentage,
        formatted,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: YieldRange = YieldRange { min: 98.0, max: 101.0 };

    #[test]
    fn within_range() {
        let r = reconcile_yield(985.0, 1000.0, RANGE);
        assert_eq!(r.formatted, "98.50%");
        assert_eq!(r.verdict, YieldVerdict::WithinLimit);
        assert_eq!(r.verdict.to_string(), "within limit");
    }

    #[test]
    fn below_range() {
        let r = reconcile_yield(970.0, 1000.0, RANGE);
        assert_eq!(r.formatted, "97.00%");
        assert_eq!(r.verdict, YieldVerdict::OutOfLimit);
        assert_eq!(r.verdict.to_string(), "out of limit");
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(reconcile_yield(980.0, 1000.0, RANGE).verdict.is_within());
        assert!(reconcile_yield(1010.0, 1000.0, RANGE).verdict.is_within());
        assert!(!reconcile_yield(1010.5, 1000.0, RANGE).verdict.is_within());
    }

    #[test]
    fn verdict_uses_the_unrounded_percentage() {
        let low = reconcile_yield(979.96, 1000.0, RANGE);
        assert_eq!(low.formatted, "98.00%");
        assert_eq!(low.verdict, YieldVerdict::OutOfLimit);
        assert!(low.percentage < 98.0);

        let high = reconcile_yield(1010.04, 1000.0, RANGE);
        assert_eq!(high.formatted, "101.00%");
        assert_eq!(high.verdict, YieldVerdict::OutOfLimit);
    }

    #[test]
    fn formatting_without_range() {
        assert_eq!(format_yield(1234.5, 1250.0), "98.76%");
    }

    #[test]
    fn zero_batch_size() {
        let r = reconcile_yield(500.0, 0.0, RANGE);
        assert_eq!(r.formatted, "0.00%");
        assert_eq!(r.verdict, YieldVerdict::OutOfLimit);
    }
}
