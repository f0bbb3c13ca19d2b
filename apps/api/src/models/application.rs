use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Lifecycle state of a tracked application. Wire and storage values are lowercase.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Interview,
    Rejected,
    Closed,
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid status '{0}', expected one of: applied, interview, rejected, closed")]
pub struct InvalidStatus(pub String);

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Closed => "closed",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "applied" => Ok(ApplicationStatus::Applied),
            "interview" => Ok(ApplicationStatus::Interview),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "closed" => Ok(ApplicationStatus::Closed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub company_name: String,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub source_url: Option<String>,
    pub status: ApplicationStatus,
    pub apply_time: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// An application together with its linked skill names, one list per category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub soft_skills: Vec<String>,
    pub skills: Vec<String>,
}

/// Input shape for creating an application, shared by the REST layer and the
/// import pipeline. Values are validated by the store, not on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationInput {
    #[serde(default)]
    pub company_name: String,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub source_url: Option<String>,
    pub status: Option<String>,
    pub apply_time: Option<String>,
    /// Comma-separated soft skill names; `None` skips reconciliation.
    pub soft_skills: Option<String>,
    /// Comma-separated required skill names; `None` skips reconciliation.
    pub skills: Option<String>,
}

/// Partial update. For nullable columns the outer `Option` tells whether the
/// field was sent at all, the inner one whether it was `null` (clear).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationInput {
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub job_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub source_url: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub apply_time: Option<Option<String>>,
    pub soft_skills: Option<String>,
    pub skills: Option<String>,
}

impl UpdateApplicationInput {
    /// True when at least one column of the application row is being written.
    pub fn touches_columns(&self) -> bool {
        self.company_name.is_some()
            || self.job_title.is_some()
            || self.location.is_some()
            || self.source_url.is_some()
            || self.status.is_some()
            || self.apply_time.is_some()
    }

    pub fn touches_skills(&self) -> bool {
        self.soft_skills.is_some() || self.skills.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_apply_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
