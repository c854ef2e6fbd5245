use serde::{Deserialize, Serialize};

use crate::primitives::{DelinquencyBucketId, DelinquencyRangeId};

/// One ageing band. The label is presentation-only; the band itself is
/// immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelinquencyRange {
    pub id: DelinquencyRangeId,
    pub classification: String,
    pub min_age_days: u32,
    pub max_age_days: Option<u32>,
}

impl DelinquencyRange {
    pub fn contains(&self, days_past_due: u32) -> bool {
        days_past_due >= self.min_age_days
            && self.max_age_days.map_or(true, |max| days_past_due <= max)
    }
}

/// An ordered, gapless cover of `[0, ∞)` by ranges. Validated on creation;
/// held by loan products to opt into classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelinquencyBucket {
    pub id: DelinquencyBucketId,
    pub name: String,
    pub range_ids: Vec<DelinquencyRangeId>,
}

pub(crate) fn validate_cover(
    ranges: &[DelinquencyRange],
) -> Result<(), super::error::DelinquencyBucketError> {
    use super::error::DelinquencyBucketError::*;

    let Some(first) = ranges.first() else {
        return Err(EmptyBucket);
    };
    if first.min_age_days != 0 {
        return Err(FirstRangeMustStartAtZero(first.min_age_days));
    }
    for window in ranges.windows(2) {
        let (prior, next) = (&window[0], &window[1]);
        let Some(prior_max) = prior.max_age_days else {
            return Err(UnboundedRangeBeforeLast(prior.min_age_days));
        };
        if next.min_age_days != prior_max + 1 {
            return Err(GapOrOverlapBetweenRanges {
                prior_max,
                next_min: next.min_age_days,
            });
        }
    }
    let last = ranges.last().expect("non-empty checked above");
    if let Some(max) = last.max_age_days {
        return Err(LastRangeMustBeUnbounded(max));
    }
    Ok(())
}
