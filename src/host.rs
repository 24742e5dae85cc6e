//! Trait definitions for delegating work to the host environment.
//!
//! Locale-aware output is deliberately kept out of this crate. A host
//! that wants `to_locale_string` behavior implements [`HostFormatter`]
//! over the calendar-resolved field record.

use alloc::string::String;

use crate::builtins::calendar::MonthCode;

/// The calendar-resolved fields of a value, ready for presentation.
///
/// Time fields are zero for date-only values; `offset_nanoseconds` and
/// `time_zone` are present only for zoned values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFields {
    pub calendar: &'static str,
    pub era: Option<String>,
    pub era_year: Option<i32>,
    pub year: i32,
    pub month: u8,
    pub month_code: MonthCode,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub microsecond: u16,
    pub nanosecond: u16,
    pub offset_nanoseconds: Option<i64>,
    pub time_zone: Option<String>,
}

/// A host-provided locale formatter.
pub trait HostFormatter {
    fn format(&self, fields: &ResolvedFields) -> String;
}

impl<F> HostFormatter for F
where
    F: Fn(&ResolvedFields) -> String,
{
    fn format(&self, fields: &ResolvedFields) -> String {
        self(fields)
    }
}
