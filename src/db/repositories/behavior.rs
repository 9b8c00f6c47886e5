use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use tracing::{debug, info, warn};

use crate::domain::{BehaviorError, BehaviorRules};
use crate::entities::{behavior_records, prelude::*};
use crate::models::behavior::{
    BehaviorPatch, BehaviorRecord, DateRange, IncidentSearch, NewBehaviorRecord, PointsSummary,
};

pub struct BehaviorRepository<'a> {
    conn: &'a DatabaseConnection,
    rules: &'a BehaviorRules,
}

impl<'a> BehaviorRepository<'a> {
    #[must_use]
    pub const fn new(conn: &'a DatabaseConnection, rules: &'a BehaviorRules) -> Self {
        Self { conn, rules }
    }

    /// Records of one student within `range`. Shared by every per-student read
    /// so listing, summing and summarizing always see the same set.
    fn student_query(student_id: i32, range: DateRange) -> Select<BehaviorRecords> {
        Self::within(
            BehaviorRecords::find().filter(behavior_records::Column::StudentId.eq(student_id)),
            range,
        )
    }

    fn within(mut query: Select<BehaviorRecords>, range: DateRange) -> Select<BehaviorRecords> {
        if let Some(start) = range.start {
            query = query.filter(behavior_records::Column::Timestamp.gte(start));
        }

        if let Some(end) = range.end {
            query = query.filter(behavior_records::Column::Timestamp.lte(end));
        }

        query
    }

    /// Log an incident. `timestamp` defaults to now.
    pub async fn record(&self, new: NewBehaviorRecord) -> Result<BehaviorRecord, BehaviorError> {
        if new.description.trim().is_empty() {
            return Err(BehaviorError::InvalidRecord(
                "description must not be empty".to_string(),
            ));
        }

        if let Err(reason) = self.rules.check(&new.behavior_type, new.points) {
            warn!(student_id = new.student_id, %reason, "Rejected behavior record");
            return Err(BehaviorError::InvalidRecord(reason));
        }

        let now = Utc::now();
        let active_model = behavior_records::ActiveModel {
            student_id: Set(new.student_id),
            recorded_by_id: Set(new.recorded_by_id),
            behavior_type: Set(new.behavior_type),
            description: Set(new.description),
            points: Set(new.points),
            timestamp: Set(new.timestamp.unwrap_or(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(self.conn).await?;
        info!(
            record_id = model.id,
            student_id = model.student_id,
            behavior_type = %model.behavior_type,
            points = model.points,
            "Recorded behavior"
        );

        Ok(BehaviorRecord::from(model))
    }

    pub async fn get(&self, record_id: i32) -> Result<Option<BehaviorRecord>, BehaviorError> {
        let record = BehaviorRecords::find_by_id(record_id)
            .one(self.conn)
            .await?;

        Ok(record.map(BehaviorRecord::from))
    }

    /// Most recent first.
    pub async fn list_for_student(
        &self,
        student_id: i32,
        range: DateRange,
    ) -> Result<Vec<BehaviorRecord>, BehaviorError> {
        let rows = Self::student_query(student_id, range)
            .order_by_desc(behavior_records::Column::Timestamp)
            .all(self.conn)
            .await?;

        debug!(student_id, count = rows.len(), "Listed behavior records");

        Ok(rows.into_iter().map(BehaviorRecord::from).collect())
    }

    /// Incidents across all students, newest first, paged by `skip`/`limit`.
    pub async fn search(
        &self,
        search: &IncidentSearch,
    ) -> Result<Vec<BehaviorRecord>, BehaviorError> {
        let mut query = Self::within(BehaviorRecords::find(), search.range);

        if let Some(student_id) = search.student_id {
            query = query.filter(behavior_records::Column::StudentId.eq(student_id));
        }

        if let Some(needle) = search.needle() {
            query = query.filter(
                Condition::any()
                    .add(behavior_records::Column::BehaviorType.contains(needle))
                    .add(behavior_records::Column::Description.contains(needle)),
            );
        }

        let rows = query
            .order_by_desc(behavior_records::Column::Timestamp)
            .order_by_desc(behavior_records::Column::Id)
            .offset(search.skip)
            .limit(search.limit)
            .all(self.conn)
            .await?;

        debug!(
            text = search.needle(),
            student_id = search.student_id,
            count = rows.len(),
            "Searched behavior records"
        );

        Ok(rows.into_iter().map(BehaviorRecord::from).collect())
    }

    /// Sum of `points` over exactly what [`Self::list_for_student`] returns.
    pub async fn sum_points(&self, student_id: i32, range: DateRange) -> Result<i64, BehaviorError> {
        let records = self.list_for_student(student_id, range).await?;

        Ok(records.iter().map(|r| i64::from(r.points)).sum())
    }

    pub async fn summarize(
        &self,
        student_id: i32,
        range: DateRange,
    ) -> Result<PointsSummary, BehaviorError> {
        let records = self.list_for_student(student_id, range).await?;

        Ok(PointsSummary::from_records(&records))
    }

    /// Apply `patch`, bumping `updated_at` when anything changes.
    ///
    /// Missing records yield `Ok(None)` and nothing is written.
    pub async fn update(
        &self,
        record_id: i32,
        patch: BehaviorPatch,
    ) -> Result<Option<BehaviorRecord>, BehaviorError> {
        let Some(record) = BehaviorRecords::find_by_id(record_id)
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        if patch.is_noop() {
            return Ok(Some(BehaviorRecord::from(record)));
        }

        if let Some(points) = patch.points {
            self.rules
                .check(&record.behavior_type, points)
                .map_err(BehaviorError::InvalidRecord)?;
        }

        let description = patch.effective_description().map(str::to_string);
        let mut active: behavior_records::ActiveModel = record.into();
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(points) = patch.points {
            active.points = Set(points);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        info!(record_id, points = model.points, "Updated behavior record");

        Ok(Some(BehaviorRecord::from(model)))
    }
}
