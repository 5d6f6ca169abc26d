//! Period planning: cut the aligned frames into consecutive windows.

use pipbench_core::domain::PeriodId;
use pipbench_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One period's slice of the data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPlan {
    pub period_id: PeriodId,
    pub start: usize,
    pub len: usize,
}

impl PeriodPlan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Plan `period_count` back-to-back periods over `total` frames.
///
/// Without `period_minutes` the frames are split equally and any remainder
/// at the end is left unused.
pub fn plan_periods(
    total: usize,
    period_count: usize,
    period_minutes: Option<usize>,
) -> CoreResult<Vec<PeriodPlan>> {
    if period_count == 0 {
        return Err(CoreError::validation("period_count must be at least 1"));
    }
    let len = match period_minutes {
        Some(0) => return Err(CoreError::validation("period_minutes must be at least 1")),
        Some(minutes) => minutes,
        None => total / period_count,
    };
    let needed = len.checked_mul(period_count).unwrap_or(usize::MAX);
    if len == 0 || needed > total {
        return Err(CoreError::data(format!(
            "{total} aligned minutes cannot fill {period_count} periods{}",
            period_minutes
                .map(|m| format!(" of {m} minutes"))
                .unwrap_or_default()
        )));
    }
    Ok((0..period_count)
        .map(|i| PeriodPlan {
            period_id: PeriodId(i),
            start: i * len,
            len,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn equal_split_drops_remainder() {
        let plans = plan_periods(103, 4, None).unwrap();
        assert_eq!(plans.len(), 4);
        assert!(plans.iter().all(|p| p.len == 25));
        assert_eq!(plans[3].range(), 75..100);
        assert_eq!(plans[2].period_id, PeriodId(2));
    }

    #[test]
    fn explicit_length_is_respected() {
        let plans = plan_periods(100, 3, Some(30)).unwrap();
        assert_eq!(plans[1].range(), 30..60);
    }

    #[test]
    fn too_little_data_is_a_data_error() {
        assert!(plan_periods(10, 3, Some(4)).unwrap_err().is_data());
        assert!(plan_periods(2, 3, None).unwrap_err().is_data());
        assert!(plan_periods(0, 1, None).unwrap_err().is_data());
    }

    #[test]
    fn zero_counts_are_validation_errors() {
        assert!(plan_periods(10, 0, None).unwrap_err().is_validation());
        assert!(plan_periods(10, 1, Some(0)).unwrap_err().is_validation());
    }

    proptest! {
        #[test]
        fn plans_are_contiguous_and_in_bounds(
            total in 1usize..5_000,
            count in 1usize..40,
        ) {
            if let Ok(plans) = plan_periods(total, count, None) {
                prop_assert_eq!(plans.len(), count);
                for (i, plan) in plans.iter().enumerate() {
                    prop_assert_eq!(plan.period_id, PeriodId(i));
                    prop_assert_eq!(plan.start, i * plan.len);
                    prop_assert!(plan.range().end <= total);
                }
            } else {
                prop_assert!(total < count);
            }
        }
    }
}
