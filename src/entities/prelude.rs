pub use super::behavior_records::Entity as BehaviorRecords;
pub use super::users::Entity as Users;
