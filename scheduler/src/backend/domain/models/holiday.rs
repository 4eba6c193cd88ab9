use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A public holiday on the civil calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    pub local_name: String,
}

impl Holiday {
    pub fn new(date: NaiveDate, name: &str, local_name: &str) -> Self {
        Self {
            date,
            name: name.to_string(),
            local_name: local_name.to_string(),
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
