//! Measurement API client
//!
//! One authenticated GET per run: `start_date`/`end_date` as ISO dates in the
//! query string, the key in the `X-Api-Key` header. Any non-success status is
//! fatal; nothing is aggregated from a failed fetch.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use ecal_common::config::validate_date_range;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "https://api.sweep.net/api/v1/measurements";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const API_KEY_HEADER: &str = "X-Api-Key";
const USER_AGENT: &str = concat!("ecal/", env!("CARGO_PKG_VERSION"));

/// Response body of the measurements endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeasurementsResponse {
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Free-form attributes attached by the customer (Facility, Site, ...)
    #[serde(default)]
    pub customer_data: Map<String, Value>,
    pub result_value: f64,
}

impl Measurement {
    /// Grouping key for `field`, `None` when the attribute is absent or null
    pub fn group_key(&self, field: &str) -> Option<String> {
        match self.customer_data.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Inclusive date range, start never after end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        validate_date_range(start, end)?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

pub struct MeasurementClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl MeasurementClient {
    pub fn new(api_url: impl Into<String>, api_key: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_url: api_url.into(),
            api_key,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch every measurement in `range`
    pub async fn fetch(&self, range: &DateRange) -> Result<Vec<Measurement>> {
        let params = [
            ("start_date", range.start().format("%Y-%m-%d").to_string()),
            ("end_date", range.end().format("%Y-%m-%d").to_string()),
        ];

        debug!(
            url = %self.api_url,
            start = %range.start(),
            end = %range.end(),
            "Querying measurement API"
        );

        let response = self
            .http_client
            .get(&self.api_url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::RemoteFetch {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let parsed: MeasurementsResponse =
            serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))?;

        info!(
            measurements = parsed.measurements.len(),
            "Measurements retrieved"
        );
        Ok(parsed.measurements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = MeasurementClient::new(
            DEFAULT_API_URL,
            "test_key".to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        );
        assert!(client.is_ok());
        assert_eq!(client.unwrap().api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        assert!(DateRange::new(date(2022, 1, 1), date(2022, 12, 31)).is_ok());
        assert!(DateRange::new(date(2022, 6, 1), date(2022, 6, 1)).is_ok());
        assert!(DateRange::new(date(2023, 1, 1), date(2022, 12, 31)).is_err());
    }

    #[test]
    fn test_decode_measurements() {
        let body = json!({
            "measurements": [
                {"customerData": {"Facility": "Paris"}, "resultValue": 12.5},
                {"customerData": {"Facility": 42}, "resultValue": 1},
                {"customerData": {"Site": "Lyon"}, "resultValue": 3.0},
                {"resultValue": 4.0}
            ]
        });
        let parsed: MeasurementsResponse = serde_json::from_value(body).unwrap();

        assert_eq!(parsed.measurements.len(), 4);
        assert_eq!(parsed.measurements[0].group_key("Facility").as_deref(), Some("Paris"));
        assert_eq!(parsed.measurements[1].group_key("Facility").as_deref(), Some("42"));
        assert_eq!(parsed.measurements[2].group_key("Facility"), None);
        assert_eq!(parsed.measurements[3].group_key("Facility"), None);
        assert_eq!(parsed.measurements[1].result_value, 1.0);
    }

    #[test]
    fn test_null_group_is_absent() {
        let m: Measurement =
            serde_json::from_value(json!({"customerData": {"Facility": null}, "resultValue": 2.0}))
                .unwrap();
        assert_eq!(m.group_key("Facility"), None);
    }
}
