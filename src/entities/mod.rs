pub mod prelude;

pub mod behavior_records;
pub mod users;
