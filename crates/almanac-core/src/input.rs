//! Coercion of loosely-typed date input into adapter dates.
//!
//! Branches are checked in a fixed order: ISO string, epoch
//! milliseconds, adapter-native value, adapter date. A missing value
//! means "now".

use std::fmt;

use serde::{
  Deserialize,
  Serialize
};

use crate::adapter::{
  AdapterDate,
  DateAdapter
};

/// Serializable subset of [`DateValue`] used in configuration files.
/// Unquoted TOML dates land in `Toml` and resolve like ISO strings.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(untagged)]
pub enum DateInput {
  EpochMillis(i64),
  Iso(String),
  Toml(toml::value::Datetime)
}

impl DateInput {
  pub fn resolve<A: DateAdapter>(
    &self,
    adapter: &A
  ) -> A::Date {
    match self {
      | Self::Iso(text) => {
        DateValue::<A>::Iso(text.clone())
          .resolve(adapter)
      }
      | Self::EpochMillis(millis) => {
        adapter.from_epoch_millis(*millis)
      }
      | Self::Toml(datetime) => {
        adapter.from_iso(&datetime.to_string())
      }
    }
  }
}

impl From<&str> for DateInput {
  fn from(value: &str) -> Self {
    Self::Iso(value.to_string())
  }
}

impl From<i64> for DateInput {
  fn from(value: i64) -> Self {
    Self::EpochMillis(value)
  }
}

impl fmt::Display for DateInput {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Iso(text) => f.write_str(text),
      | Self::EpochMillis(millis) => {
        write!(f, "{millis}ms")
      }
      | Self::Toml(datetime) => {
        write!(f, "{datetime}")
      }
    }
  }
}

/// Any date-like value the engine accepts at runtime.
#[derive(Debug, Clone)]
pub enum DateValue<A: DateAdapter> {
  Iso(String),
  EpochMillis(i64),
  Native(A::Native),
  Date(A::Date)
}

impl<A: DateAdapter> DateValue<A> {
  pub fn native(value: A::Native) -> Self {
    Self::Native(value)
  }

  pub fn date(value: A::Date) -> Self {
    Self::Date(value)
  }

  pub fn resolve(&self, adapter: &A) -> A::Date {
    match self {
      // Blank strings count as absent.
      | Self::Iso(text)
        if text.trim().is_empty() =>
      {
        adapter.now()
      }
      | Self::Iso(text) => {
        adapter.from_iso(text)
      }
      | Self::EpochMillis(millis) => {
        adapter.from_epoch_millis(*millis)
      }
      | Self::Native(value) => {
        adapter.from_native(value.clone())
      }
      | Self::Date(date) => *date
    }
  }

  /// Short description for diagnostics.
  pub fn describe(&self) -> String {
    match self {
      | Self::Iso(text) => text.clone(),
      | Self::EpochMillis(millis) => {
        format!("{millis}ms")
      }
      | Self::Native(value) => {
        format!("{value:?}")
      }
      | Self::Date(date) => date.to_iso()
    }
  }
}

impl<A: DateAdapter> From<&str> for DateValue<A> {
  fn from(value: &str) -> Self {
    Self::Iso(value.to_string())
  }
}

impl<A: DateAdapter> From<String>
  for DateValue<A>
{
  fn from(value: String) -> Self {
    Self::Iso(value)
  }
}

impl<A: DateAdapter> From<i64> for DateValue<A> {
  fn from(value: i64) -> Self {
    Self::EpochMillis(value)
  }
}

impl<A: DateAdapter> From<DateInput>
  for DateValue<A>
{
  fn from(value: DateInput) -> Self {
    match value {
      | DateInput::Iso(text) => Self::Iso(text),
      | DateInput::EpochMillis(millis) => {
        Self::EpochMillis(millis)
      }
      | DateInput::Toml(datetime) => {
        Self::Iso(datetime.to_string())
      }
    }
  }
}

/// Resolves `value`, falling back to `adapter.now()` when absent.
pub fn coerce<A: DateAdapter>(
  adapter: &A,
  value: Option<&DateValue<A>>
) -> A::Date {
  match value {
    | Some(value) => value.resolve(adapter),
    | None => adapter.now()
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::adapter::ChronoAdapter;

  fn adapter() -> ChronoAdapter {
    let now = NaiveDate::from_ymd_opt(
      2021, 6, 15
    )
    .and_then(|d| d.and_hms_opt(8, 0, 0))
    .expect("valid now");
    ChronoAdapter::new("en")
      .with_zone_name("UTC")
      .with_fixed_now(now)
  }

  #[test]
  fn config_input_is_untagged() {
    let iso: DateInput =
      serde_json::from_str("\"2020-01-05\"")
        .expect("string input");
    assert_eq!(
      iso,
      DateInput::Iso("2020-01-05".to_string())
    );
    let epoch: DateInput =
      serde_json::from_str("1514764800000")
        .expect("integer input");
    assert_eq!(
      epoch,
      DateInput::EpochMillis(1_514_764_800_000)
    );
  }

  #[test]
  fn branches_resolve_in_order() {
    let adapter = adapter();
    let iso: DateValue<ChronoAdapter> =
      "2020-01-05".into();
    assert_eq!(
      iso.resolve(&adapter).format("YYYY-MM-DD"),
      "2020-01-05"
    );

    let epoch: DateValue<ChronoAdapter> =
      1_514_764_800_000_i64.into();
    assert_eq!(
      epoch.resolve(&adapter).format("YYYY-MM-DD"),
      "2018-01-01"
    );

    let native = DateValue::<ChronoAdapter>::native(
      NaiveDate::from_ymd_opt(1999, 12, 31)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid native")
    );
    assert_eq!(
      native.resolve(&adapter).year(),
      1999
    );
  }

  #[test]
  fn absent_and_blank_mean_now() {
    let adapter = adapter();
    assert_eq!(
      coerce(&adapter, None),
      adapter.now()
    );
    let blank: DateValue<ChronoAdapter> =
      "  ".into();
    assert_eq!(
      blank.resolve(&adapter),
      adapter.now()
    );
  }

  #[test]
  fn garbage_is_invalid_not_now() {
    let adapter = adapter();
    let bad: DateValue<ChronoAdapter> =
      "next tuesday".into();
    assert!(!bad.resolve(&adapter).is_valid());
  }
}
