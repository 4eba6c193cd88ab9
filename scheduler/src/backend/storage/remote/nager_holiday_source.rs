//! Public holidays from the Nager.Date API
//! (`GET {base}/api/v3/PublicHolidays/{year}/{country}`).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::backend::domain::models::holiday::Holiday;
use crate::backend::storage::traits::HolidaySource;

pub const DEFAULT_HOLIDAY_API_BASE: &str = "https://date.nager.at";
pub const HOLIDAY_COUNTRY_CODE: &str = "HK";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NagerHoliday {
    date: NaiveDate,
    name: String,
    local_name: String,
}

#[derive(Clone)]
pub struct NagerHolidaySource {
    client: Client,
    base_url: String,
    country_code: String,
}

impl NagerHolidaySource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build holiday API client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country_code: HOLIDAY_COUNTRY_CODE.to_string(),
        })
    }
}

#[async_trait]
impl HolidaySource for NagerHolidaySource {
    async fn fetch_year(&self, year: i32) -> Result<Vec<Holiday>> {
        let url = format!(
            "{}/api/v3/PublicHolidays/{}/{}",
            self.base_url, year, self.country_code
        );
        debug!("Fetching holidays from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Holiday request to {url} failed"))?;
        if !response.status().is_success() {
            bail!("Holiday API returned {} for {}", response.status(), year);
        }

        let holidays: Vec<NagerHoliday> = response
            .json()
            .await
            .context("Holiday API returned an unexpected body")?;
        Ok(holidays
            .into_iter()
            .map(|holiday| Holiday {
                date: holiday.date,
                name: holiday.name,
                local_name: holiday.local_name,
            })
            .collect())
    }
}
