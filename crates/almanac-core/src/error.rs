use thiserror::Error;

/// Non-fatal misuse of a calendar operation.
///
/// The engine state is untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarWarning {
  #[error(
    "set_month is only supported for \
     single-month calendars"
  )]
  SetMonthUnsupported,

  #[error(
    "set_interval_start is only available \
     when length_of_time sets days or months"
  )]
  SetIntervalStartUnsupported,

  #[error("month index {0} is outside 0..=11")]
  MonthOutOfRange(i64),

  #[error("unrecognized month name: {0:?}")]
  UnrecognizedMonth(String),

  #[error("unparseable date input: {0}")]
  InvalidDate(String)
}
