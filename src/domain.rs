use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local() -> Self {
        Self("local".to_string())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_lowercase())
    }
}

impl FromStr for SourceId {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(FetchError::InvalidSource(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub source: SourceId,
    pub url: String,
}

impl SourceEntry {
    pub fn new(source: &str, url: String) -> Self {
        Self {
            source: SourceId::from(source),
            url,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSpec {
    pub date: Option<DateTime<Utc>>,
    pub valid_date: Option<DateTime<Utc>>,
    pub model: String,
    pub fxx: u32,
    pub product: Option<String>,
    pub member: u32,
}

#[derive(Debug, Clone)]
pub struct Run {
    pub date: DateTime<Utc>,
    pub valid_date: DateTime<Utc>,
    pub fxx: u32,
    pub model: String,
    pub product: String,
    pub member: u32,
}

impl Run {
    pub fn describe(&self) -> String {
        format!(
            "{} {} F{:02} [{}]",
            self.model.to_uppercase(),
            self.date.format("%Y-%m-%d %H:%M UTC"),
            self.fxx,
            self.product
        )
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }
}

pub fn resolve_times(
    date: Option<DateTime<Utc>>,
    valid_date: Option<DateTime<Utc>>,
    fxx: u32,
) -> Result<(DateTime<Utc>, DateTime<Utc>), FetchError> {
    let lead = Duration::hours(i64::from(fxx));
    let (init, valid) = match (date, valid_date) {
        (Some(init), None) => (init, init + lead),
        (None, Some(valid)) => (valid - lead, valid),
        _ => return Err(FetchError::DateInput),
    };
    if init > Utc::now() {
        return Err(FetchError::FutureDate(
            init.format("%Y-%m-%d %H:%M UTC").to_string(),
        ));
    }
    Ok((init, valid))
}

pub fn normalize_model(model: &str) -> String {
    let lowered = model.trim().to_lowercase();
    if lowered == "alaska" {
        "hrrrak".to_string()
    } else {
        lowered
    }
}

pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, FetchError> {
    let trimmed = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.and_utc());
        }
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(parsed.and_time(NaiveTime::MIN).and_utc());
    }
    Err(FetchError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn source_id_is_lowercased() {
        let id: SourceId = "AWS".parse().unwrap();
        assert_eq!(id.as_str(), "aws");
    }

    #[test]
    fn source_id_rejects_empty() {
        let err = "  ".parse::<SourceId>().unwrap_err();
        assert_matches!(err, FetchError::InvalidSource(_));
    }

    #[test]
    fn valid_date_derived_from_init() {
        let init = parse_datetime("2022-01-26 00:00").unwrap();
        let (date, valid) = resolve_times(Some(init), None, 6).unwrap();
        assert_eq!(date, init);
        assert_eq!(valid, init + Duration::hours(6));
    }

    #[test]
    fn init_derived_from_valid_date() {
        let valid = parse_datetime("2022-01-26 06:00").unwrap();
        let (date, derived) = resolve_times(None, Some(valid), 6).unwrap();
        assert_eq!(date, parse_datetime("2022-01-26 00:00").unwrap());
        assert_eq!(derived, valid);
    }

    #[test]
    fn both_dates_rejected() {
        let init = parse_datetime("2022-01-26 00:00").unwrap();
        let err = resolve_times(Some(init), Some(init), 0).unwrap_err();
        assert_matches!(err, FetchError::DateInput);
    }

    #[test]
    fn missing_dates_rejected() {
        let err = resolve_times(None, None, 0).unwrap_err();
        assert_matches!(err, FetchError::DateInput);
    }

    #[test]
    fn future_init_rejected() {
        let future = Utc::now() + Duration::days(2);
        let err = resolve_times(Some(future), None, 0).unwrap_err();
        assert_matches!(err, FetchError::FutureDate(_));
    }

    #[test]
    fn alaska_alias_maps_to_hrrrak() {
        assert_eq!(normalize_model("Alaska"), "hrrrak");
        assert_eq!(normalize_model("HRRR"), "hrrr");
    }

    #[test]
    fn parse_datetime_formats() {
        assert!(parse_datetime("2022-01-26 00:00").is_ok());
        assert!(parse_datetime("2022-01-26T12:30").is_ok());
        assert!(parse_datetime("2022-01-26").is_ok());
        assert_matches!(
            parse_datetime("yesterday").unwrap_err(),
            FetchError::InvalidDate(_)
        );
    }
}
