use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Partition of the skill dictionary. Persisted as the `is_soft_skill` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Soft,
    Required,
}

impl SkillCategory {
    pub fn is_soft(self) -> bool {
        matches!(self, SkillCategory::Soft)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Soft => "soft",
            SkillCategory::Required => "required",
        }
    }
}

/// One entry of the shared skill dictionary, unique per `(name, is_soft_skill)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillRow {
    pub id: i64,
    pub name: String,
    pub is_soft_skill: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}
