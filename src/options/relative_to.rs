//! The `relativeTo` anchor for duration arithmetic.

use crate::builtins::date::PlainDate;
use crate::builtins::zoneddatetime::ZonedDateTime;
use crate::options::{Disambiguation, OffsetDisambiguation};
use crate::provider::TimeZoneProvider;
use crate::TempusResult;

/// An anchor date that gives calendar and day units a concrete length.
#[derive(Debug, Clone)]
pub enum RelativeTo {
    PlainDate(PlainDate),
    ZonedDateTime(ZonedDateTime),
}

impl From<PlainDate> for RelativeTo {
    fn from(value: PlainDate) -> Self {
        Self::PlainDate(value)
    }
}

impl From<ZonedDateTime> for RelativeTo {
    fn from(value: ZonedDateTime) -> Self {
        Self::ZonedDateTime(value)
    }
}

impl RelativeTo {
    /// Parses an anchor from text. Strings with a bracketed time-zone
    /// annotation produce a [`ZonedDateTime`] anchor, everything else a
    /// [`PlainDate`].
    pub fn try_from_str_with_provider(
        source: &str,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<Self> {
        match ZonedDateTime::from_str_with_provider(
            source,
            Disambiguation::Compatible,
            OffsetDisambiguation::Reject,
            provider,
        ) {
            Ok(zdt) => Ok(Self::ZonedDateTime(zdt)),
            Err(_) => Ok(Self::PlainDate(source.parse::<PlainDate>()?)),
        }
    }

    /// Parses an anchor using the compiled time-zone data.
    #[cfg(feature = "compiled_data")]
    pub fn try_from_str(source: &str) -> TempusResult<Self> {
        Self::try_from_str_with_provider(source, &*crate::tzdb::TZ_PROVIDER)
    }
}
