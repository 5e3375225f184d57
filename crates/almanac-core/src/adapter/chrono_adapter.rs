use std::fmt::Write as _;

use chrono::{
  DateTime,
  Datelike,
  Duration,
  Local,
  Months,
  NaiveDate,
  NaiveDateTime,
  Timelike,
  Utc
};
use chrono_tz::Tz;

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

const INVALID_MARKER: &str = "Invalid date";

/// [`AdapterDate`] backed by a zone-local `chrono::NaiveDateTime`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChronoDate {
  inner:  Option<NaiveDateTime>,
  locale: &'static LocaleData
}

impl ChronoDate {
  fn map(
    self,
    f: impl FnOnce(
      NaiveDateTime
    ) -> Option<NaiveDateTime>
  ) -> Self {
    Self {
      inner:  self.inner.and_then(f),
      locale: self.locale
    }
  }
}

fn midnight(
  date: NaiveDate
) -> Option<NaiveDateTime> {
  date.and_hms_opt(0, 0, 0)
}

fn shift_months(
  dt: NaiveDateTime,
  months: i64
) -> Option<NaiveDateTime> {
  let magnitude =
    u32::try_from(months.unsigned_abs())
      .ok()?;
  if months >= 0 {
    dt.checked_add_months(Months::new(
      magnitude
    ))
  } else {
    dt.checked_sub_months(Months::new(
      magnitude
    ))
  }
}

fn shift(
  dt: NaiveDateTime,
  delta: &DurationLike
) -> Option<NaiveDateTime> {
  let dt =
    shift_months(dt, delta.total_months()?)?;
  let dt = dt.checked_add_signed(
    Duration::try_days(delta.total_days()?)?
  )?;
  let dt = dt.checked_add_signed(
    Duration::try_hours(delta.hours)?
  )?;
  let dt = dt.checked_add_signed(
    Duration::try_minutes(delta.minutes)?
  )?;
  let dt = dt.checked_add_signed(
    Duration::try_seconds(delta.seconds)?
  )?;
  dt.checked_add_signed(
    Duration::try_milliseconds(
      delta.milliseconds
    )?
  )
}

impl AdapterDate for ChronoDate {
  type Native = NaiveDateTime;

  fn value(&self) -> Option<NaiveDateTime> {
    self.inner
  }

  fn is_valid(&self) -> bool {
    self.inner.is_some()
  }

  fn to_iso(&self) -> String {
    match self.inner {
      | Some(dt) => dt
        .format("%Y-%m-%dT%H:%M:%S%.3f")
        .to_string(),
      | None => INVALID_MARKER.to_string()
    }
  }

  fn format(&self, pattern: &str) -> String {
    let Some(dt) = self.inner else {
      return INVALID_MARKER.to_string();
    };
    let fields = CivilFields {
      month:   dt.month(),
      day:     dt.day(),
      weekday: dt
        .weekday()
        .num_days_from_sunday(),
      hour:    dt.hour()
    };
    let strftime = tokens::localize(
      pattern,
      &fields,
      self.locale
    );

    let mut out = String::new();
    if write!(out, "{}", dt.format(&strftime))
      .is_err()
    {
      tracing::warn!(
        pattern,
        "chrono rejected format pattern"
      );
      return INVALID_MARKER.to_string();
    }
    out
  }

  fn start_of(&self, unit: DateUnit) -> Self {
    let first_day_of_week =
      self.locale.first_day_of_week;
    self.map(|dt| match unit {
      | DateUnit::Millisecond => dt
        .with_nanosecond(
          dt.nanosecond() / 1_000_000
            * 1_000_000
        ),
      | DateUnit::Second => {
        dt.with_nanosecond(0)
      }
      | DateUnit::Minute => dt
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0)),
      | DateUnit::Hour => dt
        .date()
        .and_hms_opt(dt.hour(), 0, 0),
      | DateUnit::Day => midnight(dt.date()),
      | DateUnit::Week => {
        let back = days_back_to_week_start(
          dt.weekday().number_from_monday(),
          first_day_of_week
        );
        dt.date()
          .checked_sub_signed(
            Duration::try_days(back)?
          )
          .and_then(midnight)
      }
      | DateUnit::Month => dt
        .date()
        .with_day(1)
        .and_then(midnight),
      | DateUnit::Year => {
        NaiveDate::from_ymd_opt(
          dt.year(),
          1,
          1
        )
        .and_then(midnight)
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
    self.inner.map_or(0, |dt| dt.year())
  }

  fn month(&self) -> u32 {
    self.inner.map_or(0, |dt| dt.month())
  }

  fn weekday(&self) -> u32 {
    self.inner.map_or(0, |dt| {
      dt.weekday().number_from_monday()
    })
  }

  fn day(&self) -> u32 {
    self.inner.map_or(0, |dt| dt.day())
  }

  fn days_in_month(&self) -> u32 {
    self
      .inner
      .and_then(|dt| {
        let first = dt.date().with_day(1)?;
        let next = first
          .checked_add_months(Months::new(1))?;
        u32::try_from(
          next
            .signed_duration_since(first)
            .num_days()
        )
        .ok()
      })
      .unwrap_or(0)
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

/// [`DateAdapter`] over `chrono`, with zones from `chrono-tz`.
///
/// Without a zone, `now()` and epoch conversion use the system's local
/// time zone.
#[derive(Debug, Clone)]
pub struct ChronoAdapter {
  locale:    String,
  data:      &'static LocaleData,
  zone:      Option<Tz>,
  fixed_now: Option<NaiveDateTime>
}

impl Default for ChronoAdapter {
  fn default() -> Self {
    Self::new("en")
  }
}

impl ChronoAdapter {
  pub fn new(locale: &str) -> Self {
    Self {
      locale:    locale.to_string(),
      data:      locale::lookup(locale),
      zone:      None,
      fixed_now: None
    }
  }

  #[must_use]
  pub fn with_zone(mut self, zone: Tz) -> Self {
    self.zone = Some(zone);
    self
  }

  /// Binds an IANA zone by name; unknown names keep the current zone.
  #[must_use]
  pub fn with_zone_name(
    self,
    name: &str
  ) -> Self {
    match name.trim().parse::<Tz>() {
      | Ok(tz) => {
        tracing::debug!(
          timezone = %tz,
          "chrono adapter zone configured"
        );
        self.with_zone(tz)
      }
      | Err(err) => {
        tracing::error!(
          timezone = %name,
          error = %err,
          "failed to parse timezone id"
        );
        self
      }
    }
  }

  /// Pins `now()` to a fixed value.
  #[must_use]
  pub fn with_fixed_now(
    mut self,
    now: NaiveDateTime
  ) -> Self {
    self.fixed_now = Some(now);
    self
  }

  pub fn zone(&self) -> Option<Tz> {
    self.zone
  }

  fn wrap(
    &self,
    dt: Option<NaiveDateTime>
  ) -> ChronoDate {
    ChronoDate {
      inner:  dt,
      locale: self.data
    }
  }

  fn localize_utc(
    &self,
    dt: DateTime<Utc>
  ) -> NaiveDateTime {
    match self.zone {
      | Some(tz) => {
        dt.with_timezone(&tz).naive_local()
      }
      | None => {
        dt.with_timezone(&Local).naive_local()
      }
    }
  }

  fn parse_naive(
    text: &str,
    format: &str
  ) -> Option<NaiveDateTime> {
    if let Ok(dt) =
      NaiveDateTime::parse_from_str(
        text, format
      )
    {
      return Some(dt);
    }
    NaiveDate::parse_from_str(text, format)
      .ok()
      .and_then(midnight)
  }
}

impl DateAdapter for ChronoAdapter {
  type Date = ChronoDate;
  type Native = NaiveDateTime;

  fn now(&self) -> ChronoDate {
    let now = self.fixed_now.unwrap_or_else(
      || self.localize_utc(Utc::now())
    );
    self.wrap(Some(now))
  }

  fn from_iso(&self, iso: &str) -> ChronoDate {
    let text = iso.trim();

    if let Ok(dt) =
      DateTime::parse_from_rfc3339(text)
    {
      return self.wrap(Some(
        self.localize_utc(
          dt.with_timezone(&Utc)
        )
      ));
    }

    for format in [
      "%Y-%m-%dT%H:%M:%S%.f",
      "%Y-%m-%dT%H:%M:%S",
      "%Y-%m-%dT%H:%M",
      "%Y-%m-%d %H:%M:%S",
      "%Y-%m-%d %H:%M",
      "%Y-%m-%d"
    ] {
      if let Some(dt) =
        Self::parse_naive(text, format)
      {
        return self.wrap(Some(dt));
      }
    }

    // Year-month strings resolve to the first of the month.
    if let Some(dt) = Self::parse_naive(
      &format!("{text}-01"),
      "%Y-%m-%d"
    ) {
      return self.wrap(Some(dt));
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
  ) -> ChronoDate {
    let format = self.normalize_tokens(pattern);
    let text = text.trim();

    if let Some(dt) =
      Self::parse_naive(text, &format)
    {
      return self.wrap(Some(dt));
    }

    // Patterns without a day-of-month land on the first.
    if !format.contains("%d")
      && let Some(dt) = Self::parse_naive(
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
    value: NaiveDateTime
  ) -> ChronoDate {
    self.wrap(Some(value))
  }

  fn from_epoch_millis(
    &self,
    millis: i64
  ) -> ChronoDate {
    self.wrap(
      DateTime::from_timestamp_millis(millis)
        .map(|dt| self.localize_utc(dt))
    )
  }

  fn invalid(&self) -> ChronoDate {
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
    date: &ChronoDate,
    index: i64
  ) -> ChronoDate {
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
