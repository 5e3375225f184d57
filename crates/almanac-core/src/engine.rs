//! The calendar state machine.
//!
//! [`Calendar`] owns one [`CalendarState`] slot, the resolved event
//! list and the constraint bounds. Every navigation operation builds a
//! complete new snapshot, swaps it in and hands back both snapshots as
//! a [`StateChange`]. Constraints are re-evaluated from scratch each
//! time they are consulted; nothing about them is cached.

use std::str::FromStr;

use serde::Serialize;
use tracing::{
  debug,
  warn
};

use crate::adapter::{
  AdapterDate,
  DateAdapter,
  DateUnit,
  DurationLike,
  locale
};
use crate::change::StateChange;
use crate::config::{
  CalendarConfig,
  CalendarOptions,
  ViewMode,
  normalize
};
use crate::error::CalendarWarning;
use crate::event::{
  CalendarEvent,
  RuntimeEvent,
  resolve_events
};
use crate::grid::weekday_index;
use crate::input::{
  DateValue,
  coerce
};
use crate::state::{
  CalendarState,
  init_state,
  span_end
};

/// Which navigation actions are currently permitted.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct ConstraintState {
  pub next:          bool,
  pub previous:      bool,
  pub next_year:     bool,
  pub previous_year: bool,
  pub today:         bool
}

impl ConstraintState {
  pub const fn unrestricted() -> Self {
    Self {
      next:          true,
      previous:      true,
      next_year:     true,
      previous_year: true,
      today:         true
    }
  }
}

impl Default for ConstraintState {
  fn default() -> Self {
    Self::unrestricted()
  }
}

/// Argument to [`Calendar::set_month`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthInput {
  /// Zero-based month index.
  Index(i64),
  /// Long or short month name in the calendar's locale.
  Name(String)
}

impl From<i64> for MonthInput {
  fn from(index: i64) -> Self {
    Self::Index(index)
  }
}

impl From<&str> for MonthInput {
  fn from(name: &str) -> Self {
    Self::Name(name.to_string())
  }
}

impl From<String> for MonthInput {
  fn from(name: String) -> Self {
    Self::Name(name)
  }
}

impl FromStr for MonthInput {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    Ok(match s.parse::<i64>() {
      | Ok(index) => Self::Index(index),
      | Err(_) => Self::Name(s.to_string())
    })
  }
}

pub struct Calendar<A: DateAdapter> {
  adapter:          A,
  options:          CalendarOptions<A>,
  days_of_the_week: Vec<String>,
  state:            CalendarState<A::Date>,
  events:           Vec<RuntimeEvent<A::Date>>,
  constraint_start: Option<A::Date>,
  constraint_end:   Option<A::Date>
}

impl<A: DateAdapter> std::fmt::Debug for Calendar<A> {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("Calendar")
      .field("adapter", &self.adapter)
      .field("mode", &self.mode())
      .field("state", &self.state)
      .field("events", &self.events.len())
      .finish_non_exhaustive()
  }
}

impl<A: DateAdapter> Calendar<A> {
  /// Builds an engine from options. A configured `locale` rebinds the
  /// adapter before anything else is computed.
  #[tracing::instrument(skip_all)]
  pub fn new(
    adapter: A,
    options: impl Into<CalendarOptions<A>>
  ) -> Self {
    let mut options = options.into();
    let adapter = match &options.config.locale {
      | Some(tag) => adapter.with_locale(tag),
      | None => adapter
    };

    let raw_events =
      std::mem::take(&mut options.config.events);
    let normalized = normalize(&adapter, options);
    let options = normalized.options;
    let state = init_state(&adapter, &options.config);

    let constraints = &options.config.constraints;
    let constraint_start =
      constraints.start_date.as_ref().map(|input| {
        input.resolve(&adapter).start_of(DateUnit::Day)
      });
    let constraint_end =
      constraints.end_date.as_ref().map(|input| {
        input.resolve(&adapter).end_of(DateUnit::Day)
      });

    let events = resolve_events(
      &adapter,
      &options.config,
      raw_events
    );

    debug!(
      locale = adapter.locale(),
      mode = ?options.config.mode(),
      events = events.len(),
      "calendar constructed"
    );

    Self {
      adapter,
      options,
      days_of_the_week: normalized.days_of_the_week,
      state,
      events,
      constraint_start,
      constraint_end
    }
  }

  pub fn adapter(&self) -> &A {
    &self.adapter
  }

  pub fn options(&self) -> &CalendarOptions<A> {
    &self.options
  }

  pub fn config(&self) -> &CalendarConfig {
    &self.options.config
  }

  pub fn state(&self) -> &CalendarState<A::Date> {
    &self.state
  }

  pub fn mode(&self) -> ViewMode {
    self.options.config.mode()
  }

  pub fn days_of_the_week(&self) -> &[String] {
    &self.days_of_the_week
  }

  pub fn events(&self) -> &[RuntimeEvent<A::Date>] {
    &self.events
  }

  pub(crate) fn constraint_bounds(
    &self
  ) -> (Option<A::Date>, Option<A::Date>) {
    (self.constraint_start, self.constraint_end)
  }

  fn interval(&self) -> i64 {
    self.options.config.length_of_time.interval
  }

  /// Current navigation permissions, evaluated against `now()`.
  pub fn constraints(&self) -> ConstraintState {
    let mut out = ConstraintState::unrestricted();
    if self.constraint_start.is_none()
      && self.constraint_end.is_none()
    {
      return out;
    }

    let unit = self.mode().constraint_unit();
    let start = &self.state.interval_start;
    let end = &self.state.interval_end;

    if let Some(bound) = &self.constraint_start {
      if bound.is_after(start) || bound.has_same(start, unit) {
        out.previous = false;
      }
      if bound.is_after(&start.minus(DurationLike::years(1)))
      {
        out.previous_year = false;
      }
    }

    if let Some(bound) = &self.constraint_end {
      if bound.is_before(end) || bound.has_same(end, unit) {
        out.next = false;
      }
      if bound.is_before(&end.plus(DurationLike::years(1))) {
        out.next_year = false;
      }
    }

    let now = self.adapter.now().start_of(DateUnit::Month);
    let starts_later = self
      .constraint_start
      .is_some_and(|bound| bound.is_after(&now));
    let ended_earlier = self
      .constraint_end
      .is_some_and(|bound| bound.is_before(&now));
    if starts_later || ended_earlier {
      out.today = false;
    }

    out
  }

  fn replace_state(
    &mut self,
    next: CalendarState<A::Date>
  ) -> StateChange<A::Date> {
    let previous = self.state;
    self.state = next;
    debug!(
      start = %next.interval_start.to_iso(),
      end = %next.interval_end.to_iso(),
      "calendar state replaced"
    );
    StateChange {
      previous,
      current: next
    }
  }

  fn shifted(
    &self,
    prev: &CalendarState<A::Date>,
    step: i64
  ) -> CalendarState<A::Date> {
    let mode = self.mode();
    let start = match mode {
      | ViewMode::Days(_) => prev
        .interval_start
        .plus(DurationLike::days(step))
        .start_of(DateUnit::Day),
      | ViewMode::Months(_) | ViewMode::Month => prev
        .interval_start
        .plus(DurationLike::months(step))
        .start_of(DateUnit::Month)
    };
    CalendarState {
      month: start,
      interval_start: start,
      interval_end: span_end(mode, &start),
      ..*prev
    }
  }

  fn year_shifted(
    &self,
    prev: &CalendarState<A::Date>,
    years: i64
  ) -> CalendarState<A::Date> {
    let mode = self.mode();
    let delta = DurationLike::years(years);
    match mode {
      | ViewMode::Days(_) => {
        let start = prev.interval_start.plus(delta);
        CalendarState {
          month: prev.month.plus(delta),
          interval_start: start,
          interval_end: span_end(mode, &start),
          ..*prev
        }
      }
      | ViewMode::Months(_) | ViewMode::Month => {
        let start = prev
          .interval_start
          .plus(delta)
          .start_of(DateUnit::Month);
        CalendarState {
          month: start,
          interval_start: start,
          interval_end: span_end(mode, &start),
          ..*prev
        }
      }
    }
  }

  fn default_step(&self, step: Option<i64>) -> i64 {
    match (step, self.mode()) {
      | (Some(step), _) => step,
      | (None, ViewMode::Month) => 1,
      | (None, _) => self.interval()
    }
  }

  /// Moves one step later: `step` (or the configured interval) days or
  /// months. `None` when constraints forbid it.
  #[tracing::instrument(skip(self))]
  pub fn forward(
    &mut self,
    step: Option<i64>
  ) -> Option<StateChange<A::Date>> {
    if !self.constraints().next {
      debug!("forward blocked by constraints");
      return None;
    }
    let step = self.default_step(step);
    let next = self.shifted(&self.state, step);
    Some(self.replace_state(next))
  }

  /// Mirror of [`Calendar::forward`].
  #[tracing::instrument(skip(self))]
  pub fn back(
    &mut self,
    step: Option<i64>
  ) -> Option<StateChange<A::Date>> {
    if !self.constraints().previous {
      debug!("back blocked by constraints");
      return None;
    }
    let step = self.default_step(step);
    let next = self
      .shifted(&self.state, step.saturating_neg());
    Some(self.replace_state(next))
  }

  #[tracing::instrument(skip(self))]
  pub fn next_year(
    &mut self
  ) -> Option<StateChange<A::Date>> {
    if !self.constraints().next_year {
      debug!("next_year blocked by constraints");
      return None;
    }
    let next = self.year_shifted(&self.state, 1);
    Some(self.replace_state(next))
  }

  #[tracing::instrument(skip(self))]
  pub fn previous_year(
    &mut self
  ) -> Option<StateChange<A::Date>> {
    if !self.constraints().previous_year {
      debug!("previous_year blocked by constraints");
      return None;
    }
    let next = self.year_shifted(&self.state, -1);
    Some(self.replace_state(next))
  }

  /// Jumps to the interval containing `now()`. Never constraint-gated.
  #[tracing::instrument(skip(self))]
  pub fn today(&mut self) -> StateChange<A::Date> {
    let mode = self.mode();
    let now = self.adapter.now();
    let start = match mode {
      | ViewMode::Days(_) => {
        let index = match &self
          .options
          .config
          .length_of_time
          .start_date
        {
          | Some(input) => i64::from(weekday_index(
            &self.adapter,
            &input.resolve(&self.adapter)
          )),
          | None => self.options.config.week_offset
        };
        self.adapter.set_weekday(
          &now.start_of(DateUnit::Week),
          index
        )
      }
      | ViewMode::Months(_) | ViewMode::Month => {
        now.start_of(DateUnit::Month)
      }
    };
    let next = CalendarState {
      month: start,
      interval_start: start,
      interval_end: span_end(mode, &start),
      ..self.state
    };
    self.replace_state(next)
  }

  fn resolve_month(
    &self,
    input: &MonthInput,
    year: i32
  ) -> Result<A::Date, CalendarWarning> {
    match input {
      | MonthInput::Index(index) => {
        if !(0..=11).contains(index) {
          return Err(CalendarWarning::MonthOutOfRange(
            *index
          ));
        }
        Ok(self.adapter.from_iso(&format!(
          "{year:04}-{:02}-01",
          index + 1
        )))
      }
      | MonthInput::Name(name) => {
        let wanted = name.trim().to_lowercase();
        let data = locale::lookup(self.adapter.locale());
        let matched = (1..=12_u32).find(|month| {
          [
            data.month_name(*month, false),
            data.month_name(*month, true)
          ]
          .iter()
          .any(|label| {
            let label = label.to_lowercase();
            label == wanted
              || label.trim_end_matches('.') == wanted
          })
        });
        if let Some(month) = matched {
          return Ok(self.adapter.from_iso(&format!(
            "{year:04}-{month:02}-01"
          )));
        }

        let text = format!("{} {year}", name.trim());
        ["MMMM YYYY", "MMM YYYY"]
          .iter()
          .map(|pattern| {
            self.adapter.from_format(&text, pattern)
          })
          .find(|date| date.is_valid())
          .ok_or_else(|| {
            CalendarWarning::UnrecognizedMonth(
              name.clone()
            )
          })
      }
    }
  }

  /// Jumps to a month of the anchor's year. Month mode only.
  #[tracing::instrument(skip(self))]
  pub fn set_month(
    &mut self,
    month: impl Into<MonthInput> + std::fmt::Debug
  ) -> Result<StateChange<A::Date>, CalendarWarning> {
    if self.mode() != ViewMode::Month {
      let warning = CalendarWarning::SetMonthUnsupported;
      warn!(%warning);
      return Err(warning);
    }

    let year = self.state.month.year();
    let target = self
      .resolve_month(&month.into(), year)
      .inspect_err(|warning| warn!(%warning))?;
    let start = target.start_of(DateUnit::Month);
    let next = CalendarState {
      month: start,
      interval_start: start,
      interval_end: start.end_of(DateUnit::Month),
      ..self.state
    };
    Ok(self.replace_state(next))
  }

  /// Keeps the anchor's month and moves it to `year`.
  #[tracing::instrument(skip(self))]
  pub fn set_year(
    &mut self,
    year: i32
  ) -> StateChange<A::Date> {
    let delta =
      i64::from(year) - i64::from(self.state.month.year());
    let next = self.year_shifted(&self.state, delta);
    self.replace_state(next)
  }

  /// Restarts the interval at `value`. Only for N-day and N-month
  /// calendars.
  #[tracing::instrument(skip(self, value))]
  pub fn set_interval_start(
    &mut self,
    value: impl Into<DateValue<A>>
  ) -> Result<StateChange<A::Date>, CalendarWarning> {
    let mode = self.mode();
    if mode == ViewMode::Month {
      let warning =
        CalendarWarning::SetIntervalStartUnsupported;
      warn!(%warning);
      return Err(warning);
    }

    let value = value.into();
    let parsed = coerce(&self.adapter, Some(&value));
    if !parsed.is_valid() {
      let warning =
        CalendarWarning::InvalidDate(value.describe());
      warn!(%warning);
      return Err(warning);
    }

    let start = match mode {
      | ViewMode::Days(_) => {
        parsed.start_of(DateUnit::Day)
      }
      | ViewMode::Months(_) | ViewMode::Month => {
        parsed.start_of(DateUnit::Month)
      }
    };
    let next = CalendarState {
      month: start,
      interval_start: start,
      interval_end: span_end(mode, &start),
      ..self.state
    };
    Ok(self.replace_state(next))
  }

  pub fn extras(&self) -> &serde_json::Value {
    &self.options.config.extras
  }

  pub fn set_extras(
    &mut self,
    extras: serde_json::Value
  ) {
    self.options.config.extras = extras;
  }

  /// Replaces the event list.
  pub fn set_events(
    &mut self,
    events: Vec<CalendarEvent>
  ) {
    self.events = resolve_events(
      &self.adapter,
      &self.options.config,
      events
    );
  }

  pub fn add_events(
    &mut self,
    events: Vec<CalendarEvent>
  ) {
    let added = resolve_events(
      &self.adapter,
      &self.options.config,
      events
    );
    self.events.extend(added);
  }

  /// Drops every event `matches` accepts; returns how many went.
  pub fn remove_events(
    &mut self,
    matches: impl Fn(&CalendarEvent) -> bool
  ) -> usize {
    let before = self.events.len();
    self
      .events
      .retain(|event| !matches(event.event()));
    before - self.events.len()
  }

  /// Sets or clears the selected day.
  pub fn set_selected_date(
    &mut self,
    value: Option<DateValue<A>>
  ) {
    let selected_date = value
      .as_ref()
      .map(|value| value.resolve(&self.adapter));
    self.state = CalendarState {
      selected_date,
      ..self.state
    };
  }

  /// Events touching the day containing `date`.
  pub fn events_on(
    &self,
    date: &A::Date
  ) -> Vec<&RuntimeEvent<A::Date>> {
    self
      .events
      .iter()
      .filter(|event| event.overlaps(date, date))
      .collect()
  }

  /// Column of `date` in a week row, counted from the locale's first
  /// day.
  pub fn weekday_index(&self, date: &A::Date) -> u32 {
    weekday_index(&self.adapter, date)
  }

  /// Whether constraint bounds exclude the day containing `date`.
  pub fn is_inactive(&self, date: &A::Date) -> bool {
    self
      .constraint_start
      .is_some_and(|bound| date.is_before(&bound))
      || self
        .constraint_end
        .is_some_and(|bound| date.is_after(&bound))
  }
}
