use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::behavior_records;

/// Detached copy of a `behavior_records` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorRecord {
    pub id: i32,
    pub student_id: i32,
    pub recorded_by_id: i32,
    pub behavior_type: String,
    pub description: String,
    pub points: i32,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<behavior_records::Model> for BehaviorRecord {
    fn from(model: behavior_records::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            recorded_by_id: model.recorded_by_id,
            behavior_type: model.behavior_type,
            description: model.description,
            points: model.points,
            timestamp: model.timestamp,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Input for recording an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBehaviorRecord {
    pub student_id: i32,
    pub recorded_by_id: i32,
    pub behavior_type: String,
    pub description: String,
    pub points: i32,
    /// Incident time; the moment of recording when `None`.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewBehaviorRecord {
    pub fn new(
        student_id: i32,
        recorded_by_id: i32,
        behavior_type: impl Into<String>,
        description: impl Into<String>,
        points: i32,
    ) -> Self {
        Self {
            student_id,
            recorded_by_id,
            behavior_type: behavior_type.into(),
            description: description.into(),
            points,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Patch for a behavior record. Only description and points are mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BehaviorPatch {
    /// Ignored when blank.
    pub description: Option<String>,
    /// Applied whenever present, zero included.
    pub points: Option<i32>,
}

impl BehaviorPatch {
    /// The description to write, if the patch carries a non-blank one.
    #[must_use]
    pub fn effective_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|description| !description.trim().is_empty())
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.effective_description().is_none() && self.points.is_none()
    }
}

/// Inclusive, independently optional bounds on a record's `timestamp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    #[must_use]
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    #[must_use]
    pub const fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    #[must_use]
    pub const fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// Filters for searching incidents across all students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentSearch {
    /// Matched case-insensitively against type and description.
    pub text: Option<String>,
    pub student_id: Option<i32>,
    pub range: DateRange,
    pub skip: u64,
    pub limit: u64,
}

impl Default for IncidentSearch {
    fn default() -> Self {
        Self {
            text: None,
            student_id: None,
            range: DateRange::all(),
            skip: 0,
            limit: 100,
        }
    }
}

impl IncidentSearch {
    /// Search text with surrounding whitespace removed, if any is left.
    #[must_use]
    pub fn needle(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Breakdown of a student's records over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PointsSummary {
    pub positive: u64,
    pub negative: u64,
    pub other: u64,
    pub total_points: i64,
}

impl PointsSummary {
    #[must_use]
    pub fn from_records(records: &[BehaviorRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, record| {
            if record.behavior_type.eq_ignore_ascii_case("positive") {
                acc.positive += 1;
            } else if record.behavior_type.eq_ignore_ascii_case("negative") {
                acc.negative += 1;
            } else {
                acc.other += 1;
            }
            acc.total_points += i64::from(record.points);
            acc
        })
    }

    #[must_use]
    pub const fn record_count(&self) -> u64 {
        self.positive + self.negative + self.other
    }
}
