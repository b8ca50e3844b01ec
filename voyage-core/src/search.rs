use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::{CoreError, CoreResult};

/// Raw train search body as sent by the mobile client.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainSearchRequest {
    pub from: String,
    pub to: String,
    pub date: String, // YYYY-MM-DD
}

/// A validated search: upper-case station codes and a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainSearchQuery {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
}

impl TrainSearchRequest {
    pub fn validate(&self) -> CoreResult<TrainSearchQuery> {
        let from = normalize_station(&self.from, "from")?;
        let to = normalize_station(&self.to, "to")?;

        if from == to {
            return Err(CoreError::ValidationError(
                "origin and destination must differ".to_string(),
            ));
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|_| {
            CoreError::ValidationError(format!("date must be YYYY-MM-DD, got '{}'", self.date))
        })?;

        Ok(TrainSearchQuery { from, to, date })
    }
}

fn normalize_station(raw: &str, field: &str) -> CoreResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = (2..=5).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(CoreError::ValidationError(format!(
            "{} must be a 2-5 character station code",
            field
        )));
    }
    Ok(code)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub train_number: String,
    pub train_name: String,
    pub from: String,
    pub to: String,
    pub departure_time: chrono::NaiveDateTime,
    pub arrival_time: chrono::NaiveDateTime,
    pub duration_minutes: i64,
    pub duration: String, // "7h 35m"
    pub classes: Vec<TrainClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainClass {
    pub class_code: String,
    pub class_name: String,
    pub available_seats: i32,
    pub price_cents: i64,
    pub currency: String,
}

/// Formats a duration in minutes as "Xh Ym".
pub fn format_duration(minutes: i64) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(from: &str, to: &str, date: &str) -> TrainSearchRequest {
        TrainSearchRequest {
            from: from.to_string(),
            to: to.to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_search_request_deserialization() {
        let json = r#"{ "from": "ndls", "to": "BCT", "date": "2026-12-25" }"#;
        let req: TrainSearchRequest = serde_json::from_str(json).expect("Failed to deserialize");
        let query = req.validate().unwrap();
        assert_eq!(query.from, "NDLS");
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2026, 12, 25).unwrap());
    }

    #[test]
    fn test_identical_stations_rejected() {
        let err = request("NDLS", "ndls", "2026-12-25").validate().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(msg) if msg.contains("must differ")));
    }

    #[test]
    fn test_bad_codes_and_dates_rejected() {
        assert!(request("N", "BCT", "2026-12-25").validate().is_err());
        assert!(request("NDLS!", "BCT", "2026-12-25").validate().is_err());
        assert!(request("NDLS", "BCT", "25/12/2026").validate().is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(455), "7h 35m");
        assert_eq!(format_duration(60), "1h 00m");
    }
}
