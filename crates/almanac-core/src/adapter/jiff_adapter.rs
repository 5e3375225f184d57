use jiff::civil::{
  Date,
  DateTime,
  Time
};
use jiff::tz::TimeZone;
use jiff::{
  Span,
  Timestamp
};

use super::locale::{
  self,
  LocaleData
};
use super::tokens::{
  self,
  CivilFields
};
use super::{
  AdapterDate,
  DateAdapter,
  DateUnit,
  DurationLike,
  WeekdayLabelStyle,
  days_back_to_week_start
};

const INVALID_MARKER: &str = "Invalid DateTime";

/// [`AdapterDate`] backed by a zone-local `jiff::civil::DateTime`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JiffDate {
  inner:  Option<DateTime>,
  locale: &'static LocaleData
}

fn small(value: i8) -> u32 {
  u32::from(value.unsigned_abs())
}

fn midnight(date: Date) -> DateTime {
  date.to_datetime(Time::midnight())
}

fn at(
  dt: DateTime,
  minute: i8,
  second: i8,
  subsec: i32
) -> Option<DateTime> {
  let time =
    Time::new(dt.hour(), minute, second, subsec)
      .ok()?;
  Some(DateTime::from_parts(dt.date(), time))
}

fn shift(
  dt: DateTime,
  delta: &DurationLike
) -> Option<DateTime> {
  let months = Span::new()
    .try_months(delta.total_months()?)
    .ok()?;
  let days = Span::new()
    .try_days(delta.total_days()?)
    .ok()?;
  let clock = Span::new()
    .try_hours(delta.hours)
    .and_then(|span| {
      span.try_minutes(delta.minutes)
    })
    .and_then(|span| {
      span.try_seconds(delta.seconds)
    })
    .and_then(|span| {
      span.try_milliseconds(delta.milliseconds)
    })
    .ok()?;

  dt.checked_add(months)
    .and_then(|dt| dt.checked_add(days))
    .and_then(|dt| dt.checked_add(clock))
    .ok()
}

impl JiffDate {
  fn map(
    self,
    f: impl FnOnce(DateTime) -> Option<DateTime>
  ) -> Self {
    Self {
      inner:  self.inner.and_then(f),
      locale: self.locale
    }
  }
}

impl AdapterDate for JiffDate {
  type Native = DateTime;

  fn value(&self) -> Option<DateTime> {
    self.inner
  }

  fn is_valid(&self) -> bool {
    self.inner.is_some()
  }

  fn to_iso(&self) -> String {
    match self.inner {
      | Some(dt) => format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.subsec_nanosecond() / 1_000_000
      ),
      | None => INVALID_MARKER.to_string()
    }
  }

  fn format(&self, pattern: &str) -> String {
    let Some(dt) = self.inner else {
      return INVALID_MARKER.to_string();
    };
    let fields = CivilFields {
      month:   small(dt.month()),
      day:     small(dt.day()),
      weekday: small(
        dt.weekday().to_sunday_zero_offset()
      ),
      hour:    small(dt.hour())
    };
    let strftime = tokens::localize(
      pattern,
      &fields,
      self.locale
    );

    match jiff::fmt::strtime::format(
      strftime.as_str(),
      dt
    ) {
      | Ok(text) => text,
      | Err(err) => {
        tracing::warn!(
          pattern,
          error = %err,
          "jiff rejected format pattern"
        );
        INVALID_MARKER.to_string()
      }
    }
  }

  fn start_of(&self, unit: DateUnit) -> Self {
    let first_day_of_week =
      self.locale.first_day_of_week;
    self.map(|dt| match unit {
      | DateUnit::Millisecond => at(
        dt,
        dt.minute(),
        dt.second(),
        dt.subsec_nanosecond() / 1_000_000
          * 1_000_000
      ),
      | DateUnit::Second => {
        at(dt, dt.minute(), dt.second(), 0)
      }
      | DateUnit::Minute => {
        at(dt, dt.minute(), 0, 0)
      }
      | DateUnit::Hour => at(dt, 0, 0, 0),
      | DateUnit::Day => {
        Some(midnight(dt.date()))
      }
      | DateUnit::Week => {
        let back = days_back_to_week_start(
          small(
            dt.weekday().to_monday_one_offset()
          ),
          first_day_of_week
        );
        let span =
          Span::new().try_days(back).ok()?;
        dt.date()
          .checked_sub(span)
          .ok()
          .map(midnight)
      }
      | DateUnit::Month => Some(midnight(
        dt.date().first_of_month()
      )),
      | DateUnit::Year => {
        Some(midnight(dt.date().first_of_year()))
      }
    })
  }

  fn plus(
    &self,
    delta: DurationLike
  ) -> Self {
    self.map(|dt| shift(dt, &delta))
  }

  fn year(&self) -> i32 {
    self
      .inner
      .map_or(0, |dt| i32::from(dt.year()))
  }

  fn month(&self) -> u32 {
    self
      .inner
      .map_or(0, |dt| small(dt.month()))
  }

  fn weekday(&self) -> u32 {
    self.inner.map_or(0, |dt| {
      small(dt.weekday().to_monday_one_offset())
    })
  }

  fn day(&self) -> u32 {
    self.inner.map_or(0, |dt| small(dt.day()))
  }

  fn days_in_month(&self) -> u32 {
    self.inner.map_or(0, |dt| {
      small(dt.date().days_in_month())
    })
  }

  fn is_before(&self, other: &Self) -> bool {
    matches!(
      (self.inner, other.inner),
      (Some(a), Some(b)) if a < b
    )
  }

  fn is_after(&self, other: &Self) -> bool {
    matches!(
      (self.inner, other.inner),
      (Some(a), Some(b)) if a > b
    )
  }
}

/// [`DateAdapter`] over `jiff`.
///
/// The zone defaults to the system time zone and is only consulted when
/// converting instants (`now()`, epoch millis, offset-bearing ISO
/// strings) into civil time.
#[derive(Debug, Clone)]
pub struct JiffAdapter {
  locale:    String,
  data:      &'static LocaleData,
  zone:      TimeZone,
  fixed_now: Option<DateTime>
}

impl Default for JiffAdapter {
  fn default() -> Self {
    Self::new("en")
  }
}

impl JiffAdapter {
  pub fn new(locale: &str) -> Self {
    Self {
      locale:    locale.to_string(),
      data:      locale::lookup(locale),
      zone:      TimeZone::system(),
      fixed_now: None
    }
  }

  #[must_use]
  pub fn with_zone(
    mut self,
    zone: TimeZone
  ) -> Self {
    self.zone = zone;
    self
  }

  /// Binds an IANA zone by name; unknown names keep the current zone.
  #[must_use]
  pub fn with_zone_name(
    self,
    name: &str
  ) -> Self {
    match TimeZone::get(name.trim()) {
      | Ok(tz) => {
        tracing::debug!(
          timezone = %name,
          "jiff adapter zone configured"
        );
        self.with_zone(tz)
      }
      | Err(err) => {
        tracing::error!(
          timezone = %name,
          error = %err,
          "failed to resolve timezone id"
        );
        self
      }
    }
  }

  #[must_use]
  pub fn with_fixed_now(
    mut self,
    now: DateTime
  ) -> Self {
    self.fixed_now = Some(now);
    self
  }

  fn wrap(
    &self,
    dt: Option<DateTime>
  ) -> JiffDate {
    JiffDate {
      inner:  dt,
      locale: self.data
    }
  }

  fn civil(&self, ts: Timestamp) -> DateTime {
    ts.to_zoned(self.zone.clone()).datetime()
  }

  fn parse_with(
    text: &str,
    format: &str
  ) -> Option<DateTime> {
    if let Ok(dt) =
      DateTime::strptime(format, text)
    {
      return Some(dt);
    }
    Date::strptime(format, text)
      .ok()
      .map(midnight)
  }
}

impl DateAdapter for JiffAdapter {
  type Date = JiffDate;
  type Native = DateTime;

  fn now(&self) -> JiffDate {
    let now = self.fixed_now.unwrap_or_else(
      || self.civil(Timestamp::now())
    );
    self.wrap(Some(now))
  }

  fn from_iso(&self, iso: &str) -> JiffDate {
    let text = iso.trim();

    if let Ok(ts) = text.parse::<Timestamp>() {
      return self.wrap(Some(self.civil(ts)));
    }
    if let Ok(dt) = text.parse::<DateTime>() {
      return self.wrap(Some(dt));
    }
    if let Ok(date) = text.parse::<Date>() {
      return self.wrap(Some(midnight(date)));
    }
    // Year-month strings resolve to the first of the month.
    if let Ok(date) =
      format!("{text}-01").parse::<Date>()
    {
      return self.wrap(Some(midnight(date)));
    }

    tracing::debug!(
      input = %text,
      "unparseable ISO date"
    );
    self.invalid()
  }

  fn from_format(
    &self,
    text: &str,
    pattern: &str
  ) -> JiffDate {
    let format = self.normalize_tokens(pattern);
    let text = text.trim();

    if let Some(dt) =
      Self::parse_with(text, &format)
    {
      return self.wrap(Some(dt));
    }

    if !format.contains("%d")
      && let Some(dt) = Self::parse_with(
        &format!("{text} 01"),
        &format!("{format} %d")
      )
    {
      return self.wrap(Some(dt));
    }

    tracing::debug!(
      input = %text,
      pattern,
      "text did not match pattern"
    );
    self.invalid()
  }

  fn from_native(
    &self,
    value: DateTime
  ) -> JiffDate {
    self.wrap(Some(value))
  }

  fn from_epoch_millis(
    &self,
    millis: i64
  ) -> JiffDate {
    self.wrap(
      Timestamp::from_millisecond(millis)
        .ok()
        .map(|ts| self.civil(ts))
    )
  }

  fn invalid(&self) -> JiffDate {
    self.wrap(None)
  }

  fn with_locale(&self, locale: &str) -> Self {
    Self {
      locale: locale.to_string(),
      data: locale::lookup(locale),
      ..self.clone()
    }
  }

  fn locale(&self) -> &str {
    &self.locale
  }

  fn first_day_of_week(&self) -> u32 {
    self.data.first_day_of_week
  }

  fn set_weekday(
    &self,
    date: &JiffDate,
    index: i64
  ) -> JiffDate {
    self
      .wrap(date.inner)
      .start_of(DateUnit::Week)
      .plus(DurationLike::days(
        index.rem_euclid(7)
      ))
  }

  fn weekday_labels(
    &self,
    style: WeekdayLabelStyle
  ) -> Vec<String> {
    self.data.weekday_labels(style)
  }

  fn normalize_tokens(
    &self,
    pattern: &str
  ) -> String {
    tokens::to_strftime(pattern)
  }
}
