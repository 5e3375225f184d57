use serde::Serialize;

use crate::adapter::{
  AdapterDate,
  DateUnit
};
use crate::config::ViewMode;
use crate::state::CalendarState;

/// Result of an accepted navigation: the snapshot before and after.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateChange<D> {
  pub previous: CalendarState<D>,
  pub current:  CalendarState<D>
}

/// Host callbacks a change calls for. The engine only classifies; the
/// host decides what to fire.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
  NextInterval,
  PreviousInterval,
  IntervalChange,
  NextMonth,
  PreviousMonth,
  MonthChange,
  NextYear,
  PreviousYear,
  YearChange
}

impl<D: AdapterDate> StateChange<D> {
  pub fn is_noop(&self) -> bool {
    self.previous == self.current
  }

  /// Notifications implied by this change, in firing order.
  pub fn notifications(
    &self,
    mode: ViewMode
  ) -> Vec<Notification> {
    let old = &self.previous.interval_start;
    let new = &self.current.interval_start;
    let forward = new.is_after(old);
    let backward = new.is_before(old);

    let mut out = Vec::new();

    if !matches!(mode, ViewMode::Month) {
      if forward {
        out.push(Notification::NextInterval);
      }
      if backward {
        out.push(Notification::PreviousInterval);
      }
      if forward || backward {
        out.push(Notification::IntervalChange);
      }
      return out;
    }

    if !new.has_same(old, DateUnit::Month) {
      if forward {
        out.push(Notification::NextMonth);
      }
      if backward {
        out.push(Notification::PreviousMonth);
      }
      out.push(Notification::MonthChange);
    }

    if !new.has_same(old, DateUnit::Year) {
      if forward {
        out.push(Notification::NextYear);
      }
      if backward {
        out.push(Notification::PreviousYear);
      }
      out.push(Notification::YearChange);
    }

    out
  }
}
