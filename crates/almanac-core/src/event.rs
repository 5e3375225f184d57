use serde::{
  Deserialize,
  Serialize
};
use serde_json::{
  Map,
  Value
};
use tracing::warn;

use crate::adapter::{
  AdapterDate,
  DateAdapter,
  DateUnit
};
use crate::config::CalendarConfig;

// Key toml uses when a native datetime passes through a generic value.
const TOML_DATETIME_KEY: &str =
  "$__toml_private_datetime";

/// A user event record. Field names are free-form so the date keys can
/// be configured.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct CalendarEvent(Map<String, Value>);

impl CalendarEvent {
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with(
    mut self,
    key: &str,
    value: impl Into<Value>
  ) -> Self {
    self.0.insert(key.to_string(), value.into());
    self
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  /// String field, if present and a string.
  pub fn text(&self, key: &str) -> Option<&str> {
    self.0.get(key).and_then(Value::as_str)
  }

  pub fn fields(&self) -> &Map<String, Value> {
    &self.0
  }
}

impl From<Map<String, Value>> for CalendarEvent {
  fn from(map: Map<String, Value>) -> Self {
    Self(map)
  }
}

/// A [`CalendarEvent`] with its resolved span.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEvent<D> {
  event: CalendarEvent,
  start: D,
  end:   D
}

impl<D: AdapterDate> RuntimeEvent<D> {
  pub fn event(&self) -> &CalendarEvent {
    &self.event
  }

  pub fn start(&self) -> &D {
    &self.start
  }

  pub fn end(&self) -> &D {
    &self.end
  }

  /// Whether the event touches any day in `[from, to]`. Events with an
  /// invalid bound touch nothing.
  pub fn overlaps(&self, from: &D, to: &D) -> bool {
    if !self.start.is_valid() || !self.end.is_valid()
    {
      return false;
    }
    let ends_before =
      self.end.is_before(&from.start_of(DateUnit::Day));
    let starts_after =
      self.start.is_after(&to.end_of(DateUnit::Day));
    !(ends_before || starts_after)
  }
}

fn is_blank(value: &Value) -> bool {
  match value {
    | Value::Null => true,
    | Value::String(text) => {
      text.trim().is_empty()
    }
    | _ => false
  }
}

fn lookup<'a>(
  event: &'a CalendarEvent,
  key: &str
) -> Option<&'a Value> {
  event.get(key).filter(|value| !is_blank(value))
}

/// Converts one event field to an adapter date.
pub(crate) fn date_from_json<A: DateAdapter>(
  adapter: &A,
  value: Option<&Value>
) -> A::Date {
  match value {
    | None => {
      warn!("event has no date; using now");
      adapter.now()
    }
    | Some(value) if is_blank(value) => {
      warn!("event has no date; using now");
      adapter.now()
    }
    | Some(Value::String(text)) => {
      adapter.from_iso(text)
    }
    | Some(Value::Number(number)) => {
      match number.as_i64() {
        | Some(millis) => {
          adapter.from_epoch_millis(millis)
        }
        | None => {
          warn!(%number, "non-integer epoch value");
          adapter.invalid()
        }
      }
    }
    | Some(Value::Object(map))
      if map.contains_key(TOML_DATETIME_KEY) =>
    {
      match map.get(TOML_DATETIME_KEY) {
        | Some(Value::String(text)) => {
          adapter.from_iso(text)
        }
        | _ => adapter.invalid()
      }
    }
    | Some(other) => {
      warn!(value = %other, "unsupported event date value");
      adapter.invalid()
    }
  }
}

/// Resolves raw events against the configured field names.
#[tracing::instrument(skip_all, fields(count = events.len()))]
pub(crate) fn resolve_events<A: DateAdapter>(
  adapter: &A,
  config: &CalendarConfig,
  events: Vec<CalendarEvent>
) -> Vec<RuntimeEvent<A::Date>> {
  events
    .into_iter()
    .map(|event| {
      let (start, end) = match &config.multi_day_events {
        | Some(mapping) => {
          let single = mapping
            .single_day
            .as_deref()
            .and_then(|key| lookup(&event, key));
          let start_raw = lookup(&event, &mapping.start_date)
            .or(single);
          let end_raw =
            lookup(&event, &mapping.end_date).or(single);
          (
            date_from_json(adapter, start_raw.or(end_raw)),
            date_from_json(adapter, end_raw.or(start_raw))
          )
        }
        | None => {
          let date = date_from_json(
            adapter,
            event.get(&config.date_parameter)
          );
          (date, date)
        }
      };

      if !start.is_valid() || !end.is_valid() {
        warn!(
          event = ?event.fields(),
          "event date is invalid; it will not appear on any day"
        );
      }

      RuntimeEvent { event, start, end }
    })
    .collect()
}

/// Events touching any day in `[from, to]`.
pub(crate) fn events_in_range<D: AdapterDate>(
  events: &[RuntimeEvent<D>],
  from: &D,
  to: &D
) -> Vec<RuntimeEvent<D>> {
  events
    .iter()
    .filter(|event| event.overlaps(from, to))
    .cloned()
    .collect()
}
