use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::domain::SourceId;
use crate::error::FetchError;
use crate::model::IdxStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub message: f64,
    pub start_byte: u64,
    pub end_byte: Option<u64>,
    pub range: String,
    pub reference_time: DateTime<Utc>,
    pub valid_time: DateTime<Utc>,
    pub variable: String,
    pub level: String,
    pub forecast_time: String,
}

impl IndexEntry {
    pub fn byte_range(&self) -> ByteRange {
        ByteRange {
            start: self.start_byte,
            end: self.end_byte,
        }
    }

    pub fn search_key(&self) -> String {
        format!("{}:{}:{}", self.variable, self.level, self.forecast_time)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexAttrs {
    pub source: Option<SourceId>,
    pub model: String,
    pub product: String,
    pub lead_hours: u32,
    pub run_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexTable {
    pub entries: Vec<IndexEntry>,
    pub attrs: IndexAttrs,
}

impl IndexTable {
    pub fn parse(text: &str, style: IdxStyle, attrs: IndexAttrs) -> Result<Self, FetchError> {
        let lead = Duration::hours(i64::from(attrs.lead_hours));
        let entries = match style {
            IdxStyle::Wgrib2 => parse_wgrib2(text, lead)?,
            IdxStyle::Eccodes => parse_eccodes(text, lead)?,
        };
        Ok(Self { entries, attrs })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn message_numbers(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.message).collect()
    }

    pub fn filter(&self, pattern: &str) -> Result<Self, FetchError> {
        let regex =
            Regex::new(pattern).map_err(|err| FetchError::InvalidPattern(err.to_string()))?;
        let entries: Vec<IndexEntry> = self
            .entries
            .iter()
            .filter(|entry| regex.is_match(&entry.search_key()))
            .cloned()
            .collect();
        if entries.is_empty() {
            warn!(
                pattern,
                "no GRIB messages matched; the search pattern may have a typo"
            );
            warn!("{}", search_help());
        }
        Ok(Self {
            entries,
            attrs: self.attrs.clone(),
        })
    }
}

fn parse_wgrib2(text: &str, lead: Duration) -> Result<Vec<IndexEntry>, FetchError> {
    // The raw text ends with a newline, leaving one empty trailing line.
    let trimmed = text.strip_suffix('\n').unwrap_or(text);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for (number, line) in trimmed.split('\n').enumerate() {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 6 && fields.len() != 7 {
            return Err(format_error(number + 1, line));
        }
        let message: f64 = fields[0]
            .parse()
            .map_err(|_| format_error(number + 1, line))?;
        let start_byte: u64 = fields[1]
            .parse()
            .map_err(|_| format_error(number + 1, line))?;
        let reference_time = parse_reference_time(fields[2], number + 1, line)?;
        entries.push(IndexEntry {
            message,
            start_byte,
            end_byte: None,
            range: String::new(),
            reference_time,
            valid_time: reference_time + lead,
            variable: fields[3].to_string(),
            level: fields[4].to_string(),
            forecast_time: fields[5].to_string(),
        });
    }

    // End byte of each message is the next message's start byte; the last
    // message runs to the end of the file.
    for i in 0..entries.len() {
        if i + 1 < entries.len() {
            entries[i].end_byte = Some(entries[i + 1].start_byte);
        }
        entries[i].range = entries[i].byte_range().to_string();
    }
    Ok(entries)
}

fn parse_eccodes(text: &str, lead: Duration) -> Result<Vec<IndexEntry>, FetchError> {
    let mut entries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|_| format_error(number + 1, line))?;
        let offset = value
            .get("_offset")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| format_error(number + 1, line))?;
        let length = value
            .get("_length")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| format_error(number + 1, line))?;
        let reference_time = parse_eccodes_datetime(&value, number + 1, line)?;

        let variable = string_field(&value, "param");
        let levtype = string_field(&value, "levtype");
        let level = match value.get("levelist") {
            Some(levelist) => format!("{} {levtype}", json_display(levelist)),
            None => levtype,
        };
        let forecast_time = value
            .get("step")
            .map(json_display)
            .unwrap_or_else(|| "0".to_string());

        let mut entry = IndexEntry {
            message: (entries.len() + 1) as f64,
            start_byte: offset,
            end_byte: Some(offset + length),
            range: String::new(),
            reference_time,
            valid_time: reference_time + lead,
            variable,
            level,
            forecast_time,
        };
        entry.range = entry.byte_range().to_string();
        entries.push(entry);
    }
    Ok(entries)
}

fn format_error(line: usize, content: &str) -> FetchError {
    FetchError::IndexFormat {
        line,
        content: content.to_string(),
    }
}

fn parse_reference_time(
    field: &str,
    line: usize,
    content: &str,
) -> Result<DateTime<Utc>, FetchError> {
    let digits = field.strip_prefix("d=").unwrap_or(field);
    if digits.len() < 10 {
        return Err(format_error(line, content));
    }
    let date = NaiveDate::parse_from_str(&digits[..8], "%Y%m%d")
        .map_err(|_| format_error(line, content))?;
    let hour: u32 = digits[8..10]
        .parse()
        .map_err(|_| format_error(line, content))?;
    date.and_hms_opt(hour, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format_error(line, content))
}

fn parse_eccodes_datetime(
    value: &serde_json::Value,
    line: usize,
    content: &str,
) -> Result<DateTime<Utc>, FetchError> {
    let date = value
        .get("date")
        .map(json_display)
        .ok_or_else(|| format_error(line, content))?;
    let time = value
        .get("time")
        .map(json_display)
        .unwrap_or_else(|| "0000".to_string());
    let time = format!("{:0>4}", time);
    let day =
        NaiveDate::parse_from_str(&date, "%Y%m%d").map_err(|_| format_error(line, content))?;
    let hour: u32 = time[..2].parse().map_err(|_| format_error(line, content))?;
    let minute: u32 = time[2..4]
        .parse()
        .map_err(|_| format_error(line, content))?;
    day.and_hms_opt(hour, minute, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format_error(line, content))
}

fn string_field(value: &serde_json::Value, key: &str) -> String {
    value.get(key).map(json_display).unwrap_or_default()
}

fn json_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn search_help() -> String {
    [
        "Use a regular expression to select lines of the index file, for example:",
        "  ':TMP:2 m'            temperature at 2 m",
        "  ':TMP:'               temperature fields at all levels",
        "  ':UGRD:.* mb'         U wind at all pressure levels",
        "  ':500 mb:'            all variables on the 500 mb level",
        "  ':APCP:'              all accumulated precipitation fields",
        "  ':UGRD:10 m'          U wind component at 10 meters",
        "  ':(U|V)GRD:(10|80) m' U and V wind components at 10 and 80 m",
        "  ':(TMP|DPT|RH):'      temperature, dew point, and relative humidity",
        "  ':REFC:'              composite reflectivity",
        "  ':surface:'           all variables at the surface",
    ]
    .join("\n")
}
