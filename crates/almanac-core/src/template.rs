//! The data handed to a renderer after every state change.

use crate::adapter::{
  AdapterDate,
  DateAdapter,
  DateUnit,
  DurationLike
};
use crate::config::ViewMode;
use crate::engine::Calendar;
use crate::event::{
  RuntimeEvent,
  events_in_range
};
use crate::grid::{
  CalendarDay,
  GridBuilder,
  WEEK_LENGTH
};

/// One month of an N-month view.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBlock<D> {
  /// First day of the month.
  pub month: D,
  pub days:  Vec<CalendarDay<D>>
}

/// Events of the visible interval, shaped by mode.
#[derive(Debug, Clone, PartialEq)]
pub enum IntervalEvents<D> {
  /// Single-month view; see `events_this_month`.
  None,
  /// N-day view.
  Flat(Vec<RuntimeEvent<D>>),
  /// N-month view, one bucket per [`MonthBlock`].
  PerMonth(Vec<Vec<RuntimeEvent<D>>>)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateData<D> {
  pub days_of_the_week:     Vec<String>,
  pub extras:               serde_json::Value,
  pub days:                 Vec<CalendarDay<D>>,
  /// Localized month name, single-month view only.
  pub month:                Option<String>,
  pub year:                 Option<String>,
  pub events_this_month:    Vec<RuntimeEvent<D>>,
  pub events_last_month:    Vec<RuntimeEvent<D>>,
  pub events_next_month:    Vec<RuntimeEvent<D>>,
  pub months:               Vec<MonthBlock<D>>,
  pub number_of_rows:       usize,
  pub interval_start:       Option<D>,
  pub interval_end:         Option<D>,
  pub events_this_interval: IntervalEvents<D>
}

impl<D> TemplateData<D> {
  fn base(
    days_of_the_week: Vec<String>,
    extras: serde_json::Value
  ) -> Self {
    Self {
      days_of_the_week,
      extras,
      days: Vec::new(),
      month: None,
      year: None,
      events_this_month: Vec::new(),
      events_last_month: Vec::new(),
      events_next_month: Vec::new(),
      months: Vec::new(),
      number_of_rows: 0,
      interval_start: None,
      interval_end: None,
      events_this_interval: IntervalEvents::None
    }
  }
}

/// Anything that can turn template data into output.
pub trait Renderer<D> {
  fn render(&self, data: &TemplateData<D>) -> String;
}

impl<D, F> Renderer<D> for F
where
  F: Fn(&TemplateData<D>) -> String
{
  fn render(&self, data: &TemplateData<D>) -> String {
    self(data)
  }
}

fn rows(cells: usize) -> usize {
  cells.div_ceil(WEEK_LENGTH)
}

impl<A: DateAdapter> Calendar<A> {
  fn grid_builder(&self) -> GridBuilder<'_, A> {
    let (constraint_start, constraint_end) =
      self.constraint_bounds();
    GridBuilder {
      adapter: self.adapter(),
      config: self.config(),
      events: self.events(),
      constraint_start,
      constraint_end,
      selected: self.state().selected_date,
      now: self.adapter().now()
    }
  }

  /// Builds the renderer payload for the current state. Pure; reads the
  /// clock once.
  #[tracing::instrument(skip_all)]
  pub fn template_data(&self) -> TemplateData<A::Date> {
    let builder = self.grid_builder();
    let state = self.state();
    let mut data = TemplateData::base(
      self.days_of_the_week().to_vec(),
      self.extras().clone()
    );

    match self.mode() {
      | ViewMode::Days(_) => {
        let grid = builder
          .build(&state.interval_start, &state.interval_end);
        data.number_of_rows = rows(grid.days.len());
        data.days = grid.days;
        data.interval_start = Some(state.interval_start);
        data.interval_end = Some(state.interval_end);
        data.events_this_interval =
          IntervalEvents::Flat(grid.this_interval);
      }
      | ViewMode::Months(count) => {
        let mut buckets = Vec::new();
        for offset in 0..count {
          let start = state
            .interval_start
            .plus(DurationLike::months(i64::from(offset)))
            .start_of(DateUnit::Month);
          let end = start.end_of(DateUnit::Month);
          let grid = builder.build(&start, &end);
          data.number_of_rows += rows(grid.days.len());
          buckets.push(events_in_range(
            self.events(),
            &start,
            &end
          ));
          data.months.push(MonthBlock {
            month: start,
            days:  grid.days
          });
        }
        data.interval_start = Some(state.interval_start);
        data.interval_end = Some(state.interval_end);
        data.events_this_interval =
          IntervalEvents::PerMonth(buckets);
      }
      | ViewMode::Month => {
        let start = state.month.start_of(DateUnit::Month);
        let grid =
          builder.build(&start, &start.end_of(DateUnit::Month));
        data.number_of_rows = rows(grid.days.len());
        data.days = grid.days;
        data.month = Some(state.month.format("MMMM"));
        data.year = Some(state.month.format("YYYY"));
        data.events_this_month = grid.this_interval;
        data.events_last_month = grid.last_month;
        data.events_next_month = grid.next_month;
      }
    }

    tracing::debug!(
      rows = data.number_of_rows,
      "template data built"
    );
    data
  }

  /// Runs the configured render callback, if any.
  pub fn render(&self) -> Option<String> {
    self
      .options()
      .render
      .as_ref()
      .map(|render| render(&self.template_data()))
  }

  pub fn render_with<R: Renderer<A::Date>>(
    &self,
    renderer: &R
  ) -> String {
    renderer.render(&self.template_data())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::adapter::{
    ChronoAdapter,
    ChronoDate
  };
  use crate::config::{
    CalendarConfig,
    CalendarOptions,
    LengthOfTime
  };
  use crate::event::CalendarEvent;
  use crate::input::DateInput;

  fn adapter() -> ChronoAdapter {
    let now = NaiveDate::from_ymd_opt(
      2018, 1, 17
    )
    .and_then(|d| d.and_hms_opt(8, 30, 0))
    .expect("valid now");
    ChronoAdapter::new("en").with_fixed_now(now)
  }

  fn event(date: &str) -> CalendarEvent {
    CalendarEvent::new().with("date", date)
  }

  #[test]
  fn month_view_payload() {
    let cal = Calendar::new(
      adapter(),
      CalendarConfig {
        events: vec![
          event("2017-12-31"),
          event("2018-01-10"),
          event("2018-02-02"),
          event("2018-03-01"),
        ],
        ..CalendarConfig::default()
      }
    );
    let data = cal.template_data();
    assert_eq!(data.month.as_deref(), Some("January"));
    assert_eq!(data.year.as_deref(), Some("2018"));
    assert_eq!(data.days.len(), 35);
    assert_eq!(data.number_of_rows, 5);
    assert_eq!(data.events_this_month.len(), 1);
    assert_eq!(data.events_last_month.len(), 1);
    assert_eq!(data.events_next_month.len(), 1);
    assert_eq!(data.events_this_interval, IntervalEvents::None);
    assert_eq!(data.days_of_the_week[0], "S");
    assert!(data.days[0].has_class("event"));
  }

  #[test]
  fn days_view_payload() {
    let cal = Calendar::new(
      adapter(),
      CalendarConfig {
        length_of_time: LengthOfTime {
          days: Some(14),
          start_date: Some(DateInput::from("2018-01-14")),
          ..LengthOfTime::default()
        },
        events: vec![event("2018-01-20")],
        ..CalendarConfig::default()
      }
    );
    let data = cal.template_data();
    assert_eq!(data.month, None);
    assert_eq!(data.days.len(), 14);
    assert_eq!(data.number_of_rows, 2);
    assert!(data.interval_start.is_some());
    match data.events_this_interval {
      | IntervalEvents::Flat(events) => {
        assert_eq!(events.len(), 1)
      }
      | other => panic!("unexpected {other:?}")
    }
  }

  #[test]
  fn months_view_payload() {
    let cal = Calendar::new(
      adapter(),
      CalendarConfig {
        length_of_time: LengthOfTime {
          months: Some(2),
          start_date: Some(DateInput::from("2018-01-01")),
          ..LengthOfTime::default()
        },
        events: vec![event("2018-02-14")],
        ..CalendarConfig::default()
      }
    );
    let data = cal.template_data();
    assert!(data.days.is_empty());
    assert_eq!(data.months.len(), 2);
    assert_eq!(data.months[1].month.month(), 2);
    // January 2018 and February 2018 both need five rows.
    assert_eq!(data.number_of_rows, 10);
    match data.events_this_interval {
      | IntervalEvents::PerMonth(buckets) => {
        assert_eq!(buckets[0].len(), 0);
        assert_eq!(buckets[1].len(), 1);
      }
      | other => panic!("unexpected {other:?}")
    }
  }

  #[test]
  fn render_callbacks() {
    let silent = Calendar::new(adapter(), CalendarConfig::default());
    assert_eq!(silent.render(), None);

    let options =
      CalendarOptions::<ChronoAdapter>::new(CalendarConfig::default())
        .with_render(|data| {
          let month = data.month.clone().unwrap_or_default();
          format!("{month} {}", data.days.len())
        });
    let cal = Calendar::new(adapter(), options);
    assert_eq!(cal.render().as_deref(), Some("January 35"));

    let rows = |data: &TemplateData<ChronoDate>| {
      data.number_of_rows.to_string()
    };
    assert_eq!(cal.render_with(&rows), "5");
  }

  #[test]
  fn selected_day_is_marked() {
    let mut cal = Calendar::new(adapter(), CalendarConfig::default());
    cal.set_selected_date(Some("2018-01-09".into()));
    let data = cal.template_data();
    let selected: Vec<_> = data
      .days
      .iter()
      .filter(|day| day.has_class("selected"))
      .map(|day| day.day)
      .collect();
    assert_eq!(selected, vec![9]);
  }
}
