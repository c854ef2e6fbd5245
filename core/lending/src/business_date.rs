use std::sync::{Arc, RwLock};

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessDateConfig {
    #[serde(default = "default_rollover_enabled")]
    pub rollover_enabled: bool,
}

impl Default for BusinessDateConfig {
    fn default() -> Self {
        Self {
            rollover_enabled: default_rollover_enabled(),
        }
    }
}

fn default_rollover_enabled() -> bool {
    false
}

/// The logical processing date all end-of-day engines read. Distinct from
/// wall-clock time so an operator can hold or replay a day.
#[derive(Clone)]
pub struct BusinessDates {
    config: BusinessDateConfig,
    current: Arc<RwLock<NaiveDate>>,
}

impl BusinessDates {
    pub fn new(config: BusinessDateConfig) -> Self {
        Self {
            config,
            current: Arc::new(RwLock::new(Utc::now().date_naive())),
        }
    }

    pub fn current(&self) -> NaiveDate {
        *self.current.read().expect("business date lock")
    }

    pub fn set(&self, date: NaiveDate) {
        *self.current.write().expect("business date lock") = date;
    }

    /// Advances the date by one day when rollover is enabled. Returns the
    /// new date, or `None` when the rollover flag is off.
    pub fn increment(&self) -> Option<NaiveDate> {
        if !self.config.rollover_enabled {
            return None;
        }
        let mut current = self.current.write().expect("business date lock");
        *current = current
            .checked_add_days(Days::new(1))
            .expect("date within chrono range");
        Some(*current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_is_gated_by_config() {
        let dates = BusinessDates::new(BusinessDateConfig::default());
        let before = dates.current();
        assert_eq!(dates.increment(), None);
        assert_eq!(dates.current(), before);

        let dates = BusinessDates::new(BusinessDateConfig {
            rollover_enabled: true,
        });
        dates.set(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(
            dates.increment(),
            Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
        );
    }
}
