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

/// Immutable snapshot of the visible range.
///
/// `interval_start` and `interval_end` are inclusive, with the end
/// normalized to the last millisecond of its day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarState<D> {
  /// Anchor the view is built around.
  pub month:          D,
  pub interval_start: D,
  pub interval_end:   D,
  pub selected_date:  Option<D>
}

/// End of an N-day window starting at `start`.
pub(crate) fn day_span_end<D: AdapterDate>(
  start: &D,
  days: u32
) -> D {
  start
    .plus(DurationLike::days(
      i64::from(days.max(1)) - 1
    ))
    .end_of(DateUnit::Day)
}

/// End of an N-month block starting at `start`.
pub(crate) fn month_span_end<D: AdapterDate>(
  start: &D,
  months: u32
) -> D {
  start
    .plus(DurationLike::months(i64::from(
      months.max(1)
    )))
    .minus(DurationLike::days(1))
    .end_of(DateUnit::Day)
}

/// Interval ending for `start` under `mode`.
pub(crate) fn span_end<D: AdapterDate>(
  mode: ViewMode,
  start: &D
) -> D {
  match mode {
    | ViewMode::Days(days) => {
      day_span_end(start, days)
    }
    | ViewMode::Months(months) => {
      month_span_end(start, months)
    }
    | ViewMode::Month => {
      start.end_of(DateUnit::Month)
    }
  }
}

/// Computes the initial state from configuration and `adapter.now()`.
#[tracing::instrument(skip_all)]
pub fn init_state<A: DateAdapter>(
  adapter: &A,
  config: &CalendarConfig
) -> CalendarState<A::Date> {
  let resolve = |input: Option<&crate::input::DateInput>| {
    input
      .map(|value| value.resolve(adapter))
      .unwrap_or_else(|| adapter.now())
  };
  let lot = &config.length_of_time;
  let mode = config.mode();

  let (mut month, mut interval_start, mut interval_end) =
    match mode {
      | ViewMode::Months(_) => {
        let start = resolve(
          lot
            .start_date
            .as_ref()
            .or(config.start_with_month.as_ref())
        )
        .start_of(DateUnit::Month);
        (start, start, span_end(mode, &start))
      }
      | ViewMode::Days(_) => {
        let anchor = resolve(lot.start_date.as_ref())
          .start_of(DateUnit::Day);
        let start = adapter.set_weekday(
          &anchor.start_of(DateUnit::Week),
          config.week_offset
        );
        (start, start, span_end(mode, &start))
      }
      | ViewMode::Month => {
        let start =
          adapter.now().start_of(DateUnit::Month);
        (start, start, span_end(mode, &start))
      }
    };

  if let Some(input) = &config.start_with_month {
    month = input
      .resolve(adapter)
      .start_of(DateUnit::Month);
    interval_start = month;
    interval_end = span_end(mode, &month);
  }

  let selected_date = config
    .selected_date
    .as_ref()
    .map(|input| input.resolve(adapter));

  tracing::debug!(
    ?mode,
    start = %interval_start.to_iso(),
    end = %interval_end.to_iso(),
    "initialized calendar state"
  );

  CalendarState {
    month,
    interval_start,
    interval_end,
    selected_date
  }
}
