//! Generated advice models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /generate_advice`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAdvice {
    pub user_id: String,
}

/// AI-generated advice. Only the latest one is kept client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    #[serde(default)]
    pub advice: String,
    #[serde(default)]
    pub generated_at: String,
}

impl Advice {
    /// Parse `generated_at`, accepting RFC 3339 or a naive timestamp (taken as UTC)
    pub fn generated_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.generated_at) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.generated_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
