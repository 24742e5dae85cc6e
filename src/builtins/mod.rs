//! The user-facing value types.

pub mod calendar;
pub mod date;
pub mod datetime;
pub mod duration;
pub mod instant;
pub mod month_day;
pub mod time;
pub mod timezone;
pub mod year_month;
pub mod zoneddatetime;
