use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Remote,
    Unknown,
}

impl JobType {
    /// Types a user can filter on, in menu order.
    pub const SELECTABLE: [JobType; 5] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Internship,
        JobType::Remote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Remote => "remote",
            JobType::Unknown => "unknown",
        }
    }

    /// Short label used on badges and in tables.
    pub fn badge(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            other => other.as_str(),
        }
    }

    /// Lenient parse for upstream payloads: anything unrecognised is `Unknown`.
    pub fn from_payload(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or(JobType::Unknown)
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "full_time" => Ok(JobType::FullTime),
            "part_time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "internship" => Ok(JobType::Internship),
            "remote" => Ok(JobType::Remote),
            other => Err(format!(
                "unknown job type '{}' (expected full_time, part_time, contract, internship, remote)",
                other
            )),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a record: the internal id when the backend has one,
/// otherwise the external application URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum JobKey {
    Id(i64),
    Url(String),
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKey::Id(id) => write!(f, "#{}", id),
            JobKey::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub key: JobKey,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub source: Option<String>, // "LinkedIn", "Indeed", "Naukri", ...
    pub application_url: Option<String>,
    pub match_score: Option<f64>, // 0-100, profile-match results only
}

impl JobRecord {
    pub fn id(&self) -> Option<i64> {
        match self.key {
            JobKey::Id(id) => Some(id),
            JobKey::Url(_) => None,
        }
    }

    pub fn salary_range(&self) -> Option<String> {
        let min = self.salary_min.filter(|v| *v > 0.0)?;
        let max = self
            .salary_max
            .map(|v| format_amount(v))
            .unwrap_or_else(|| "?".to_string());
        Some(format!("${} - ${}", format_amount(min), max))
    }

    pub fn match_label(&self) -> Option<String> {
        self.match_score
            .filter(|s| *s > 0.0)
            .map(|s| format!("{}% Match", s.round() as i64))
    }

    pub fn description_preview(&self) -> String {
        let preview: String = self.description.chars().take(100).collect();
        format!("{}...", preview)
    }

    pub fn posted_label(&self) -> String {
        match &self.created_at {
            Some(at) => format!("Posted {}", at.format("%Y-%m-%d")),
            None => "From external source".to_string(),
        }
    }
}

fn format_amount(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// A job as the backend sends it, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub salary_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub salary_max: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub application_url: Option<String>,
}

/// One profile-match result: the job nested next to its score.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchItem {
    #[serde(default)]
    pub job: Option<JobPayload>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub match_score: Option<f64>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

// Decimal fields may arrive as JSON strings ("800000.00").
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let value = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    // "NaN" and "inf" parse as floats but are not amounts or scores.
    Ok(value.filter(|v| v.is_finite()))
}

/// Accepts RFC 3339, naive ISO datetimes (assumed UTC) and plain dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_parse() {
        assert_eq!("full_time".parse::<JobType>().unwrap(), JobType::FullTime);
        assert_eq!("Part-Time".parse::<JobType>().unwrap(), JobType::PartTime);
        assert!("gig".parse::<JobType>().is_err());
        assert_eq!(JobType::from_payload(Some("freelance")), JobType::Unknown);
        assert_eq!(JobType::from_payload(None), JobType::Unknown);
        assert_eq!(JobType::FullTime.badge(), "full-time");
        assert_eq!(JobType::Contract.badge(), "contract");
    }

    #[test]
    fn test_payload_tolerates_missing_and_odd_fields() {
        let payload: JobPayload = serde_json::from_value(serde_json::json!({
            "title": "Backend Engineer",
            "company_name": "Acme",
            "created_at": 12345,
            "application_url": "https://jobs.example/1",
            "keywords": ["rust"]
        }))
        .unwrap();
        assert_eq!(payload.title.as_deref(), Some("Backend Engineer"));
        assert!(payload.id.is_none());
        assert!(payload.created_at.is_none());
        assert!(payload.salary_min.is_none());
    }

    #[test]
    fn test_decimal_strings_are_numbers() {
        let payload: JobPayload = serde_json::from_value(serde_json::json!({
            "id": 4,
            "salary_min": "800000.00",
            "salary_max": 950000
        }))
        .unwrap();
        assert_eq!(payload.salary_min, Some(800000.0));
        assert_eq!(payload.salary_max, Some(950000.0));
    }

    #[test]
    fn test_non_finite_strings_are_absent() {
        let item: MatchItem = serde_json::from_value(serde_json::json!({
            "job": {"id": 2, "salary_min": "inf"},
            "match_score": "NaN"
        }))
        .unwrap();
        assert!(item.match_score.is_none());
        assert!(item.job.and_then(|j| j.salary_min).is_none());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T10:00:00.123456Z").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00+05:30").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_display_helpers() {
        let record = JobRecord {
            key: JobKey::Id(7),
            title: "SRE".to_string(),
            company_name: "Acme".to_string(),
            location: "Pune, India".to_string(),
            job_type: JobType::FullTime,
            salary_min: Some(800000.0),
            salary_max: None,
            description: "x".repeat(150),
            created_at: None,
            source: None,
            application_url: None,
            match_score: Some(72.6),
        };
        assert_eq!(record.salary_range().as_deref(), Some("$800,000 - $?"));
        assert_eq!(record.match_label().as_deref(), Some("73% Match"));
        assert_eq!(record.description_preview().chars().count(), 103);
        assert_eq!(record.posted_label(), "From external source");
        assert_eq!(record.id(), Some(7));
    }
}
