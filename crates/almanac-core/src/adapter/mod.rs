//! Date-library abstraction used by the calendar engine.
//!
//! The engine never touches a date library directly: every boundary,
//! shift, comparison and label goes through [`DateAdapter`] and the
//! [`AdapterDate`] values it produces. Two interchangeable
//! implementations ship with the crate:
//!
//! | Adapter | Library | Invalid marker |
//! |---------|---------|----------------|
//! | [`ChronoAdapter`] | `chrono` + `chrono-tz` | `Invalid date` |
//! | [`JiffAdapter`] | `jiff` | `Invalid DateTime` |
//!
//! Format patterns are written once in the canonical token set
//! (`YYYY`, `MMMM`, `DD`, `dd`, ...) and each adapter translates them
//! through [`DateAdapter::normalize_tokens`].

mod chrono_adapter;
mod jiff_adapter;
pub mod locale;
pub(crate) mod tokens;

use std::fmt;

pub use chrono_adapter::{
  ChronoAdapter,
  ChronoDate
};
pub use jiff_adapter::{
  JiffAdapter,
  JiffDate
};

/// Boundary and comparison granularity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum DateUnit {
  Millisecond,
  Second,
  Minute,
  Hour,
  Day,
  /// Locale-aware: starts on the locale's first day of week.
  Week,
  Month,
  Year
}

/// Display width for localized weekday labels.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum WeekdayLabelStyle {
  /// One character (`S`, `M`, ...).
  Narrow,
  /// Abbreviated (`Sun`, `Mon`, ...).
  Short,
  /// Full name (`Sunday`, ...).
  Long
}

/// Duration payload for [`AdapterDate::plus`] and
/// [`AdapterDate::minus`].
///
/// Calendar units (years, months, weeks, days) are applied before clock
/// units, so adding a month to January 31st clamps to the end of
/// February before any hours are added.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub struct DurationLike {
  pub years:        i64,
  pub months:       i64,
  pub weeks:        i64,
  pub days:         i64,
  pub hours:        i64,
  pub minutes:      i64,
  pub seconds:      i64,
  pub milliseconds: i64
}

impl DurationLike {
  pub fn years(years: i64) -> Self {
    Self {
      years,
      ..Self::default()
    }
  }

  pub fn months(months: i64) -> Self {
    Self {
      months,
      ..Self::default()
    }
  }

  pub fn weeks(weeks: i64) -> Self {
    Self {
      weeks,
      ..Self::default()
    }
  }

  pub fn days(days: i64) -> Self {
    Self {
      days,
      ..Self::default()
    }
  }

  pub fn hours(hours: i64) -> Self {
    Self {
      hours,
      ..Self::default()
    }
  }

  pub fn minutes(minutes: i64) -> Self {
    Self {
      minutes,
      ..Self::default()
    }
  }

  pub fn seconds(seconds: i64) -> Self {
    Self {
      seconds,
      ..Self::default()
    }
  }

  pub fn milliseconds(
    milliseconds: i64
  ) -> Self {
    Self {
      milliseconds,
      ..Self::default()
    }
  }

  /// One `amount` of the given unit.
  pub fn of(
    unit: DateUnit,
    amount: i64
  ) -> Self {
    match unit {
      | DateUnit::Millisecond => {
        Self::milliseconds(amount)
      }
      | DateUnit::Second => {
        Self::seconds(amount)
      }
      | DateUnit::Minute => {
        Self::minutes(amount)
      }
      | DateUnit::Hour => {
        Self::hours(amount)
      }
      | DateUnit::Day => Self::days(amount),
      | DateUnit::Week => {
        Self::weeks(amount)
      }
      | DateUnit::Month => {
        Self::months(amount)
      }
      | DateUnit::Year => {
        Self::years(amount)
      }
    }
  }

  #[must_use]
  pub fn negated(self) -> Self {
    Self {
      years:        self
        .years
        .saturating_neg(),
      months:       self
        .months
        .saturating_neg(),
      weeks:        self
        .weeks
        .saturating_neg(),
      days:         self.days.saturating_neg(),
      hours:        self
        .hours
        .saturating_neg(),
      minutes:      self
        .minutes
        .saturating_neg(),
      seconds:      self
        .seconds
        .saturating_neg(),
      milliseconds: self
        .milliseconds
        .saturating_neg()
    }
  }

  /// Months after folding years in, or `None` on overflow.
  pub(crate) fn total_months(
    &self
  ) -> Option<i64> {
    self
      .years
      .checked_mul(12)?
      .checked_add(self.months)
  }

  /// Days after folding weeks in, or `None` on overflow.
  pub(crate) fn total_days(
    &self
  ) -> Option<i64> {
    self
      .weeks
      .checked_mul(7)?
      .checked_add(self.days)
  }
}

/// An immutable date-time value produced by a [`DateAdapter`].
///
/// Values are never mutated in place. A value may be *invalid* when it
/// came from unparseable input: invalid values format to the adapter's
/// invalid marker, compare `false` against everything and stay invalid
/// through arithmetic.
pub trait AdapterDate:
  Copy + fmt::Debug + PartialEq + Send + Sync + 'static
{
  /// The wrapped library value.
  type Native: Clone
    + fmt::Debug
    + Send
    + Sync
    + 'static;

  /// The underlying library value, `None` when invalid.
  fn value(&self) -> Option<Self::Native>;

  fn is_valid(&self) -> bool;

  /// Local ISO-8601 rendering with millisecond precision.
  fn to_iso(&self) -> String;

  /// Formats using canonical tokens (`YYYY-MM-DD`, `MMMM`, ...).
  fn format(&self, pattern: &str) -> String;

  fn start_of(&self, unit: DateUnit) -> Self;

  /// Last millisecond of the unit containing this value.
  fn end_of(&self, unit: DateUnit) -> Self {
    self
      .start_of(unit)
      .plus(DurationLike::of(unit, 1))
      .minus(DurationLike::milliseconds(1))
  }

  fn plus(&self, delta: DurationLike) -> Self;

  fn minus(
    &self,
    delta: DurationLike
  ) -> Self {
    self.plus(delta.negated())
  }

  /// Calendar year, `0` when invalid.
  fn year(&self) -> i32;

  /// Month of year (1..=12), `0` when invalid.
  fn month(&self) -> u32;

  /// ISO weekday (Monday = 1 ... Sunday = 7), `0` when invalid.
  fn weekday(&self) -> u32;

  /// Day of month (1..=31), `0` when invalid.
  fn day(&self) -> u32;

  fn days_in_month(&self) -> u32;

  fn is_before(&self, other: &Self) -> bool;

  fn is_after(&self, other: &Self) -> bool;

  /// Whether both values fall in the same `unit`.
  fn has_same(
    &self,
    other: &Self,
    unit: DateUnit
  ) -> bool {
    let left = self.start_of(unit);
    let right = other.start_of(unit);
    left.is_valid()
      && right.is_valid()
      && !left.is_before(&right)
      && !left.is_after(&right)
  }
}

/// Uniform surface over one date library.
pub trait DateAdapter:
  Clone + fmt::Debug + Send + Sync + 'static
{
  type Native: Clone
    + fmt::Debug
    + Send
    + Sync
    + 'static;
  type Date: AdapterDate<Native = Self::Native>;

  /// Current wall-clock time. The engine reads no other clock.
  fn now(&self) -> Self::Date;

  fn from_iso(&self, iso: &str) -> Self::Date;

  /// Parses `text` with a canonical-token `pattern`. Patterns without
  /// a day-of-month resolve to the first of the month.
  fn from_format(
    &self,
    text: &str,
    pattern: &str
  ) -> Self::Date;

  fn from_native(
    &self,
    value: Self::Native
  ) -> Self::Date;

  fn from_epoch_millis(
    &self,
    millis: i64
  ) -> Self::Date;

  /// The invalid sentinel for this adapter.
  fn invalid(&self) -> Self::Date;

  #[must_use]
  fn with_locale(
    &self,
    locale: &str
  ) -> Self;

  fn locale(&self) -> &str;

  /// 0..=6, 0 = Sunday.
  fn first_day_of_week(&self) -> u32;

  /// Moves `date` to the `index`-th day of its week, where index 0 is
  /// the locale's first day of week (not ISO Monday).
  fn set_weekday(
    &self,
    date: &Self::Date,
    index: i64
  ) -> Self::Date;

  /// Weekday labels starting at the locale's first day of week.
  fn weekday_labels(
    &self,
    style: WeekdayLabelStyle
  ) -> Vec<String>;

  /// Maps canonical tokens to the library's own format syntax.
  fn normalize_tokens(
    &self,
    pattern: &str
  ) -> String;
}

/// Rotates `items` left by `by` steps; negative values rotate right.
pub fn rotate<T: Clone>(
  items: &[T],
  by: i64
) -> Vec<T> {
  if items.is_empty() {
    return Vec::new();
  }
  let len = items.len() as i64;
  let shift = by.rem_euclid(len) as usize;
  items[shift..]
    .iter()
    .chain(items[..shift].iter())
    .cloned()
    .collect()
}

/// Days to step back from `iso_weekday` to reach the week start.
pub(crate) fn days_back_to_week_start(
  iso_weekday: u32,
  first_day_of_week: u32
) -> i64 {
  let desired = if first_day_of_week == 0 {
    7
  } else {
    first_day_of_week
  };
  i64::from((iso_weekday + 7 - desired) % 7)
}
