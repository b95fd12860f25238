use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// An election, identified by a short key such as "2020_LRS", held on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub key: String,
    pub date: NaiveDate,
}

impl Election {
    pub fn new(key: &str, date: NaiveDate) -> Self {
        Self { key: key.to_string(), date }
    }

    /// Calendar year, used to look up party value surveys.
    #[inline] pub fn year(&self) -> i32 { self.date.year() }

    /// Signed number of days from `other` to this election.
    #[inline] pub fn days_since(&self, other: &Election) -> i64 { (self.date - other.date).num_days() }
}
