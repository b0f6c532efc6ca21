//! Diagnostic content of completion markers.
//!
//! A marker's existence is the only thing ever checked; this record is
//! written for operators and never read back.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Tier, Time};

/// What a marker records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    /// Rung encoded successfully
    Completed,
    /// Rung settled after a failed pass
    Failed,
    /// Every rung of an item was already done
    ItemComplete,
    /// Every episode of a season was already done
    SeasonComplete,
}

/// Marker file body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerRecord {
    /// Record kind
    pub kind: MarkerKind,

    /// Source media
    pub source: PathBuf,

    /// Output the marker stands for
    pub target: PathBuf,

    /// Rung tier, for rung markers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    /// Invocation start
    pub started_at: Time,

    /// Invocation end
    pub finished_at: Time,

    /// Wall time in seconds
    pub duration_secs: f64,

    /// Arguments of the last invocation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarkerRecord {
    /// Record for a directory-level marker (item or season).
    pub fn settled(kind: MarkerKind, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let now = chrono::Utc::now();
        Self {
            kind,
            source: path.clone(),
            target: path,
            tier: None,
            started_at: now,
            finished_at: now,
            duration_secs: 0.0,
            args: Vec::new(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_kebab_case() {
        let record = MarkerRecord::settled(MarkerKind::SeasonComplete, "/tv/show/Season 01");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "season-complete");
        assert!(json.get("tier").is_none());
        assert!(json.get("args").is_none());
    }
}
