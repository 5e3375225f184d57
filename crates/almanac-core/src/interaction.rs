//! What happens when a host reports a click on a day cell.

use tracing::debug;

use crate::adapter::{
  AdapterDate,
  DateAdapter,
  DateUnit
};
use crate::change::StateChange;
use crate::engine::Calendar;
use crate::event::RuntimeEvent;
use crate::grid::CalendarDay;
use crate::input::{
  DateValue,
  coerce
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome<D> {
  /// An adjacent-month day moved the view. `None` when constraints
  /// refused the move.
  Navigated(Option<StateChange<D>>),
  /// The day became the selected date.
  Selected,
  Unchanged
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayClick<D> {
  pub date:    D,
  pub outcome: ClickOutcome<D>,
  /// Events touching the clicked day.
  pub events:  Vec<RuntimeEvent<D>>
}

/// Which side of the view an adjacent-month day sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adjacent {
  Before,
  After
}

impl<A: DateAdapter> Calendar<A> {
  /// Applies `adjacent_days_change_month` and `track_selected_date` to a
  /// clicked day. Without a grid cell, a day is adjacent when it lies
  /// outside `[interval_start, interval_end]`.
  #[tracing::instrument(skip_all)]
  pub fn click_day(
    &mut self,
    value: impl Into<DateValue<A>>
  ) -> DayClick<A::Date> {
    let value = value.into();
    let date = coerce(self.adapter(), Some(&value))
      .start_of(DateUnit::Day);
    if !date.is_valid() {
      debug!(input = %value.describe(), "click on invalid date");
      return DayClick {
        date,
        outcome: ClickOutcome::Unchanged,
        events: Vec::new()
      };
    }

    let state = *self.state();
    let adjacent = if self.mode().is_days() {
      None
    } else if date.is_before(&state.interval_start) {
      Some(Adjacent::Before)
    } else if date.is_after(&state.interval_end) {
      Some(Adjacent::After)
    } else {
      None
    };
    self.apply_click(date, adjacent)
  }

  /// Like [`Calendar::click_day`], but classifies the day by the cell's
  /// `last_month` / `next_month` classes. In N-month views this catches
  /// padding days that fall inside the interval. Placeholders yield
  /// `None`.
  #[tracing::instrument(skip_all)]
  pub fn click_cell(
    &mut self,
    cell: &CalendarDay<A::Date>
  ) -> Option<DayClick<A::Date>> {
    let date = cell.date?.start_of(DateUnit::Day);
    if !date.is_valid() {
      return None;
    }
    let classes = &self.config().classes;
    let adjacent = if cell.has_class(&classes.last_month) {
      Some(Adjacent::Before)
    } else if cell.has_class(&classes.next_month) {
      Some(Adjacent::After)
    } else {
      None
    };
    Some(self.apply_click(date, adjacent))
  }

  fn apply_click(
    &mut self,
    date: A::Date,
    adjacent: Option<Adjacent>
  ) -> DayClick<A::Date> {
    let events: Vec<_> = self
      .events_on(&date)
      .into_iter()
      .cloned()
      .collect();

    if self.config().adjacent_days_change_month
      && let Some(side) = adjacent
    {
      let change = match side {
        | Adjacent::Before => self.back(None),
        | Adjacent::After => self.forward(None)
      };
      return DayClick {
        date,
        outcome: ClickOutcome::Navigated(change),
        events
      };
    }

    let config = self.config();
    let skip_inactive = config.ignore_inactive_days_in_selection
      && self.is_inactive(&date);
    let outcome = if config.track_selected_date && !skip_inactive {
      self.set_selected_date(Some(DateValue::date(date)));
      ClickOutcome::Selected
    } else {
      ClickOutcome::Unchanged
    };

    DayClick {
      date,
      outcome,
      events
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::adapter::ChronoAdapter;
  use crate::config::{
    CalendarConfig,
    Constraints,
    LengthOfTime
  };
  use crate::event::CalendarEvent;
  use crate::input::DateInput;

  fn calendar(config: CalendarConfig) -> Calendar<ChronoAdapter> {
    let now = NaiveDate::from_ymd_opt(2018, 1, 17)
      .and_then(|d| d.and_hms_opt(12, 0, 0))
      .expect("valid now");
    Calendar::new(ChronoAdapter::new("en").with_fixed_now(now), config)
  }

  #[test]
  fn adjacent_day_navigates() {
    let mut cal = calendar(CalendarConfig {
      adjacent_days_change_month: true,
      track_selected_date: true,
      ..CalendarConfig::default()
    });
    let click = cal.click_day("2017-12-31");
    assert!(matches!(click.outcome, ClickOutcome::Navigated(Some(_))));
    assert_eq!(cal.state().month.month(), 12);
    assert_eq!(cal.state().selected_date, None);

    let click = cal.click_day("2018-01-02");
    assert!(matches!(click.outcome, ClickOutcome::Navigated(Some(_))));
    assert_eq!(cal.state().month.month(), 1);
  }

  #[test]
  fn padding_cells_navigate_in_multi_month_views() {
    let mut cal = calendar(CalendarConfig {
      adjacent_days_change_month: true,
      track_selected_date: true,
      length_of_time: LengthOfTime {
        months: Some(2),
        ..LengthOfTime::default()
      },
      ..CalendarConfig::default()
    });
    let data = cal.template_data();
    let january = &data.months[0].days;
    let padding = january
      .iter()
      .find(|day| day.has_class("next-month"))
      .cloned()
      .expect("february padding in january block");
    assert_eq!(padding.date.map(|d| d.month()), Some(2));

    // Inside the interval, so a bare date just selects it.
    let february = padding.date.expect("dated cell");
    let mut by_date = calendar(CalendarConfig {
      adjacent_days_change_month: true,
      track_selected_date: true,
      length_of_time: LengthOfTime {
        months: Some(2),
        ..LengthOfTime::default()
      },
      ..CalendarConfig::default()
    });
    assert_eq!(
      by_date.click_day(DateValue::<ChronoAdapter>::date(february)).outcome,
      ClickOutcome::Selected
    );

    let click = cal.click_cell(&padding).expect("dated cell");
    assert!(matches!(click.outcome, ClickOutcome::Navigated(Some(_))));
    assert_eq!(cal.state().interval_start.month(), 2);
    assert_eq!(cal.state().selected_date, None);

    let in_month = cal.template_data().months[0]
      .days
      .iter()
      .find(|day| day.has_class("calendar-day-2018-02-14"))
      .cloned()
      .expect("mid-february cell");
    let click = cal.click_cell(&in_month).expect("dated cell");
    assert_eq!(click.outcome, ClickOutcome::Selected);
    assert_eq!(cal.state().interval_start.month(), 2);
  }

  #[test]
  fn placeholder_cells_are_ignored() {
    let mut cal = calendar(CalendarConfig {
      adjacent_days_change_month: true,
      show_adjacent_months: false,
      ..CalendarConfig::default()
    });
    let placeholder = cal
      .template_data()
      .days
      .into_iter()
      .find(|day| day.is_placeholder())
      .expect("leading placeholder");
    let before = *cal.state();
    assert!(cal.click_cell(&placeholder).is_none());
    assert_eq!(*cal.state(), before);
  }

  #[test]
  fn selection_tracks_clicks() {
    let mut cal = calendar(CalendarConfig {
      track_selected_date: true,
      events: vec![CalendarEvent::new().with("date", "2018-01-09")],
      ..CalendarConfig::default()
    });
    let click = cal.click_day("2018-01-09");
    assert_eq!(click.outcome, ClickOutcome::Selected);
    assert_eq!(click.events.len(), 1);
    assert_eq!(
      cal.state().selected_date.map(|d| d.day()),
      Some(9)
    );
  }

  #[test]
  fn inactive_days_can_be_ignored() {
    let mut cal = calendar(CalendarConfig {
      track_selected_date: true,
      ignore_inactive_days_in_selection: true,
      constraints: Constraints {
        start_date: Some(DateInput::from("2018-01-10")),
        end_date: None
      },
      ..CalendarConfig::default()
    });
    let click = cal.click_day("2018-01-05");
    assert_eq!(click.outcome, ClickOutcome::Unchanged);
    assert_eq!(cal.state().selected_date, None);

    assert_eq!(cal.click_day("2018-01-12").outcome, ClickOutcome::Selected);
  }

  #[test]
  fn clicks_without_tracking_change_nothing() {
    let mut cal = calendar(CalendarConfig::default());
    let before = *cal.state();
    let click = cal.click_day("2017-12-31");
    assert_eq!(click.outcome, ClickOutcome::Unchanged);
    assert_eq!(*cal.state(), before);
    assert_eq!(
      cal.click_day("not a date").outcome,
      ClickOutcome::Unchanged
    );
  }
}
