mod behavior;
mod init;
mod status;
mod user;

pub use behavior::{
    cmd_behavior_list, cmd_behavior_points, cmd_behavior_record, cmd_behavior_search,
    cmd_behavior_update,
};
pub use init::cmd_init;
pub use status::cmd_status;
pub use user::{cmd_user_add, cmd_user_list, cmd_user_remove, cmd_user_show, cmd_user_update};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Accepts RFC 3339 or a bare `YYYY-MM-DD`. A bare date means the start of
/// that day, or its last instant when `end_of_day` is set.
pub(crate) fn parse_datetime(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("expected RFC 3339 or YYYY-MM-DD, got '{value}'"))?;

    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| "invalid time of day".to_string())?;

    Ok(date.and_time(time).and_utc())
}
