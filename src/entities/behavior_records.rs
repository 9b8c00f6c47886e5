use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "behavior_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub student_id: i32,

    pub recorded_by_id: i32,

    /// Conventionally "positive" or "negative"
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub behavior_type: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(default_value = 0)]
    pub points: i32,

    /// Moment of the incident.
    pub timestamp: DateTimeUtc,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RecordedById",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    RecordedBy,
}

impl ActiveModelBehavior for ActiveModel {}
