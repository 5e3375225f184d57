//! Day-grid construction and per-day classification.

use serde::Serialize;

use crate::adapter::{
  AdapterDate,
  DateAdapter,
  DateUnit,
  DurationLike
};
use crate::config::{
  CalendarConfig,
  ViewMode
};
use crate::event::{
  RuntimeEvent,
  events_in_range
};

pub const WEEK_LENGTH: usize = 7;
pub const SIX_ROWS: usize = WEEK_LENGTH * 6;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct DayProperties {
  pub is_today:          bool,
  pub is_inactive:       bool,
  pub is_adjacent_month: bool
}

/// One grid cell. Placeholders have no date and no properties.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay<D> {
  pub day:        u32,
  pub date:       Option<D>,
  pub events:     Vec<RuntimeEvent<D>>,
  pub classes:    String,
  pub properties: Option<DayProperties>
}

impl<D> CalendarDay<D> {
  pub fn is_placeholder(&self) -> bool {
    self.date.is_none()
  }

  pub fn has_class(&self, class: &str) -> bool {
    self
      .classes
      .split_whitespace()
      .any(|token| token == class)
  }
}

/// Weekday position relative to the locale's first day, 0..=6.
pub fn weekday_index<A: DateAdapter>(
  adapter: &A,
  date: &A::Date
) -> u32 {
  let sunday_zero = date.weekday() % 7;
  (sunday_zero + 7 - adapter.first_day_of_week() % 7)
    % 7
}

pub(crate) struct Grid<D> {
  pub days:          Vec<CalendarDay<D>>,
  pub this_interval: Vec<RuntimeEvent<D>>,
  pub last_month:    Vec<RuntimeEvent<D>>,
  pub next_month:    Vec<RuntimeEvent<D>>
}

/// Everything a grid pass reads, borrowed from the engine.
pub(crate) struct GridBuilder<'a, A: DateAdapter> {
  pub adapter:          &'a A,
  pub config:           &'a CalendarConfig,
  pub events:           &'a [RuntimeEvent<A::Date>],
  pub constraint_start: Option<A::Date>,
  pub constraint_end:   Option<A::Date>,
  pub selected:         Option<A::Date>,
  pub now:              A::Date
}

impl<A: DateAdapter> GridBuilder<'_, A> {
  fn mode(&self) -> ViewMode {
    self.config.mode()
  }

  /// Builds the cells for `[start, end]`, padded to whole weeks outside
  /// N-day mode.
  pub fn build(
    &self,
    start: &A::Date,
    end: &A::Date
  ) -> Grid<A::Date> {
    let start = start.start_of(DateUnit::Day);
    let end = end.end_of(DateUnit::Day);
    let days_mode = self.mode().is_days();

    let this_interval =
      events_in_range(self.events, &start, &end);
    let (last_month, next_month) = if !days_mode
      && self.config.show_adjacent_months
    {
      let base = start.start_of(DateUnit::Month);
      let last = base.minus(DurationLike::months(1));
      let next = base.plus(DurationLike::months(1));
      (
        events_in_range(
          self.events,
          &last,
          &last.end_of(DateUnit::Month)
        ),
        events_in_range(
          self.events,
          &next,
          &next.end_of(DateUnit::Month)
        )
      )
    } else {
      (Vec::new(), Vec::new())
    };

    let mut grid = Grid {
      days: Vec::new(),
      this_interval,
      last_month,
      next_month
    };

    if !start.is_valid() || !end.is_valid() {
      tracing::warn!(
        "interval bounds are invalid; grid is empty"
      );
      return grid;
    }

    let month_start = start.start_of(DateUnit::Month);
    let month_end = month_start.end_of(DateUnit::Month);
    let cell = |day: A::Date,
                pool: &[RuntimeEvent<A::Date>]| {
      self.day_cell(day, pool, &month_start, &month_end)
    };

    if !days_mode {
      let diff = (i64::from(weekday_index(
        self.adapter,
        &start
      )) - self.config.week_offset)
        .rem_euclid(7);
      for back in (1..=diff).rev() {
        grid.days.push(
          if self.config.show_adjacent_months {
            cell(
              start.minus(DurationLike::days(back)),
              &grid.last_month
            )
          } else {
            self.placeholder(
              &self.config.classes.last_month
            )
          }
        );
      }
    }

    let mut cursor = start;
    while !cursor.is_after(&end) {
      grid
        .days
        .push(cell(cursor, &grid.this_interval));
      cursor = cursor.plus(DurationLike::days(1));
    }

    if !days_mode {
      let target = if self.config.force_six_rows {
        grid
          .days
          .len()
          .next_multiple_of(WEEK_LENGTH)
          .max(SIX_ROWS)
      } else {
        grid.days.len().next_multiple_of(WEEK_LENGTH)
      };
      while grid.days.len() < target {
        grid.days.push(
          if self.config.show_adjacent_months {
            cell(cursor, &grid.next_month)
          } else {
            self.placeholder(
              &self.config.classes.next_month
            )
          }
        );
        cursor = cursor.plus(DurationLike::days(1));
      }
    }

    grid
  }

  fn placeholder(
    &self,
    class: &str
  ) -> CalendarDay<A::Date> {
    CalendarDay {
      day:        0,
      date:       None,
      events:     Vec::new(),
      classes:    format!(
        "{} {}",
        self.config.targets.empty,
        class
      )
      .trim()
      .to_string(),
      properties: None
    }
  }

  fn day_cell(
    &self,
    day: A::Date,
    pool: &[RuntimeEvent<A::Date>],
    month_start: &A::Date,
    month_end: &A::Date
  ) -> CalendarDay<A::Date> {
    let names = &self.config.classes;
    let events: Vec<_> = pool
      .iter()
      .filter(|event| event.overlaps(&day, &day))
      .cloned()
      .collect();

    let mut classes =
      vec![self.config.targets.day.as_str()];
    let mut properties = DayProperties::default();

    if day.has_same(&self.now, DateUnit::Day) {
      classes.push(&names.today);
      properties.is_today = true;
    }

    if day
      .end_of(DateUnit::Day)
      .is_before(&self.now.start_of(DateUnit::Day))
    {
      classes.push(&names.past);
    }

    if !events.is_empty() {
      classes.push(&names.event);
    }

    if !self.mode().is_days() {
      if day.is_before(month_start) {
        classes.push(&names.adjacent_month);
        classes.push(&names.last_month);
        properties.is_adjacent_month = true;
      } else if day.is_after(month_end) {
        classes.push(&names.adjacent_month);
        classes.push(&names.next_month);
        properties.is_adjacent_month = true;
      }
    }

    let before_start = self
      .constraint_start
      .is_some_and(|bound| day.is_before(&bound));
    let after_end = self
      .constraint_end
      .is_some_and(|bound| day.is_after(&bound));
    if before_start || after_end {
      classes.push(&names.inactive);
      properties.is_inactive = true;
    }

    if self
      .selected
      .is_some_and(|selected| {
        day.has_same(&selected, DateUnit::Day)
      })
    {
      classes.push(&names.selected);
    }

    let mut classes = classes.join(" ");
    classes.push_str(&format!(
      " calendar-day-{} calendar-dow-{}",
      day.format("YYYY-MM-DD"),
      weekday_index(self.adapter, &day)
    ));

    CalendarDay {
      day: day.day(),
      date: Some(day),
      events,
      classes: classes.trim().to_string(),
      properties: Some(properties)
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::adapter::ChronoAdapter;
  use crate::config::LengthOfTime;

  fn adapter(locale: &str) -> ChronoAdapter {
    let now = NaiveDate::from_ymd_opt(
      2018, 1, 17
    )
    .and_then(|d| d.and_hms_opt(11, 0, 0))
    .expect("valid now");
    ChronoAdapter::new(locale).with_fixed_now(now)
  }

  fn build(
    adapter: &ChronoAdapter,
    config: &CalendarConfig,
    iso: &str
  ) -> Vec<CalendarDay<<ChronoAdapter as DateAdapter>::Date>>
  {
    let start = adapter
      .from_iso(iso)
      .start_of(DateUnit::Month);
    let builder = GridBuilder {
      adapter,
      config,
      events: &[],
      constraint_start: None,
      constraint_end: None,
      selected: None,
      now: adapter.now()
    };
    builder
      .build(&start, &start.end_of(DateUnit::Month))
      .days
  }

  #[test]
  fn dow_index_is_locale_relative() {
    let en = adapter("en");
    let fr = adapter("fr");
    let sunday = en.from_iso("2018-01-14");
    assert_eq!(weekday_index(&en, &sunday), 0);
    let sunday = fr.from_iso("2018-01-14");
    assert_eq!(weekday_index(&fr, &sunday), 6);
  }

  #[test]
  fn january_2018_pads_to_whole_weeks() {
    let en = adapter("en");
    let days =
      build(&en, &CalendarConfig::default(), "2018-01-01");
    // Mon Jan 1 needs one leading Sunday; Wed Jan 31 needs three
    // trailing days.
    assert_eq!(days.len(), 35);
    assert!(days[0].has_class("last-month"));
    assert!(days[0].has_class("adjacent-month"));
    assert_eq!(days[0].day, 31);
    assert!(
      days[0]
        .has_class("calendar-day-2017-12-31")
    );
    assert!(days[1].has_class("calendar-dow-1"));
    assert!(days[34].has_class("next-month"));
    assert_eq!(days[34].day, 3);
  }

  #[test]
  fn classifies_today_and_past() {
    let en = adapter("en");
    let days =
      build(&en, &CalendarConfig::default(), "2018-01-01");
    let today = days
      .iter()
      .find(|day| day.has_class("today"))
      .expect("today cell");
    assert_eq!(today.day, 17);
    assert!(!today.has_class("past"));
    assert!(
      today.properties.is_some_and(|p| p.is_today)
    );
    assert!(days[16].has_class("past"));
  }

  #[test]
  fn placeholders_without_adjacent_months() {
    let en = adapter("en");
    let config = CalendarConfig {
      show_adjacent_months: false,
      ..CalendarConfig::default()
    };
    let days = build(&en, &config, "2018-01-01");
    assert_eq!(days.len(), 35);
    assert!(days[0].is_placeholder());
    assert_eq!(days[0].classes, "empty last-month");
    assert_eq!(days[0].properties, None);
    assert_eq!(days[34].classes, "empty next-month");
  }

  #[test]
  fn force_six_rows_for_every_month() {
    let en = adapter("en");
    let config = CalendarConfig {
      force_six_rows: true,
      ..CalendarConfig::default()
    };
    for month in 1..=12 {
      let iso = format!("2015-{month:02}-01");
      assert_eq!(
        build(&en, &config, &iso).len(),
        SIX_ROWS,
        "{iso}"
      );
    }
  }

  #[test]
  fn february_grids() {
    let en = adapter("en");
    let config = CalendarConfig::default();
    // Feb 2015 starts on Sunday and fills four rows exactly.
    assert_eq!(build(&en, &config, "2015-02-01").len(), 28);
    // Leap February 2020 starts on Saturday.
    let days = build(&en, &config, "2020-02-01");
    assert_eq!(days.len(), 35);
    assert!(days[0].has_class("calendar-day-2020-01-26"));
    assert!(days[34].has_class("calendar-day-2020-02-29"));
  }

  #[test]
  fn week_offset_moves_leading_padding() {
    let fr = adapter("fr");
    let days = build(&fr, &CalendarConfig::default(), "2018-01-01");
    // Monday-first locale: January 2018 starts on the first cell.
    assert_eq!(days[0].day, 1);
    assert_eq!(days.len(), 35);

    let en = adapter("en");
    let config = CalendarConfig {
      week_offset: 3,
      ..CalendarConfig::default()
    };
    let days = build(&en, &config, "2018-01-01");
    // Weeks start on Wednesday: Dec 27..31 lead.
    assert_eq!(days[0].day, 27);
    assert_eq!(days.len() % WEEK_LENGTH, 0);
  }

  #[test]
  fn days_mode_has_no_padding() {
    let en = adapter("en");
    let config = CalendarConfig {
      length_of_time: LengthOfTime {
        days: Some(10),
        ..LengthOfTime::default()
      },
      force_six_rows: true,
      ..CalendarConfig::default()
    };
    let start = en.from_iso("2018-01-03");
    let builder = GridBuilder {
      adapter: &en,
      config: &config,
      events: &[],
      constraint_start: None,
      constraint_end: None,
      selected: None,
      now: en.now()
    };
    let days = builder
      .build(&start, &en.from_iso("2018-01-12"))
      .days;
    assert_eq!(days.len(), 10);
    assert!(
      days
        .iter()
        .all(|day| !day.has_class("adjacent-month"))
    );
  }
}
