use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::adapter::{
  AdapterDate,
  DateAdapter,
  DateUnit,
  rotate
};
use crate::event::CalendarEvent;
use crate::input::DateInput;
use crate::template::TemplateData;

pub const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";

fn config_true() -> bool {
  true
}

fn config_default_interval() -> i64 {
  1
}

fn config_default_date_parameter() -> String
{
  "date".to_string()
}

fn config_default_start_field() -> String {
  "startDate".to_string()
}

fn config_default_end_field() -> String {
  "endDate".to_string()
}

/// Which of the three view shapes a configuration selects.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ViewMode {
  /// A single calendar month.
  Month,
  /// A rolling window of N days.
  Days(u32),
  /// A block of N consecutive months.
  Months(u32)
}

impl ViewMode {
  pub fn is_days(self) -> bool {
    matches!(self, Self::Days(_))
  }

  /// Granularity used when comparing constraint bounds to the interval.
  pub(crate) fn constraint_unit(
    self
  ) -> DateUnit {
    match self {
      | Self::Days(_) => DateUnit::Day,
      | Self::Month | Self::Months(_) => {
        DateUnit::Month
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct LengthOfTime {
  #[serde(default)]
  pub days:       Option<u32>,
  #[serde(default)]
  pub months:     Option<u32>,
  /// Default navigation step, in days or months.
  #[serde(
    default = "config_default_interval"
  )]
  pub interval:   i64,
  #[serde(default)]
  pub start_date: Option<DateInput>
}

impl Default for LengthOfTime {
  fn default() -> Self {
    Self {
      days:       None,
      months:     None,
      interval:   config_default_interval(),
      start_date: None
    }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct Constraints {
  pub start_date: Option<DateInput>,
  pub end_date:   Option<DateInput>
}

impl Constraints {
  pub fn is_empty(&self) -> bool {
    self.start_date.is_none()
      && self.end_date.is_none()
  }
}

/// Field names read from multi-day event records.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct MultiDayMapping {
  #[serde(
    default = "config_default_start_field"
  )]
  pub start_date: String,
  #[serde(
    default = "config_default_end_field"
  )]
  pub end_date:   String,
  #[serde(default)]
  pub single_day: Option<String>
}

impl Default for MultiDayMapping {
  fn default() -> Self {
    Self {
      start_date: config_default_start_field(),
      end_date:   config_default_end_field(),
      single_day: None
    }
  }
}

/// Class names identifying interactive cells and buttons.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct Targets {
  pub day:                  String,
  pub empty:                String,
  pub next_button:          String,
  pub today_button:         String,
  pub previous_button:      String,
  pub next_year_button:     String,
  pub previous_year_button: String
}

impl Default for Targets {
  fn default() -> Self {
    Self {
      day:                  "day".to_string(),
      empty:                "empty".to_string(),
      next_button:          "almanac-next-button"
        .to_string(),
      today_button:         "almanac-today-button"
        .to_string(),
      previous_button:
        "almanac-previous-button".to_string(),
      next_year_button:
        "almanac-next-year-button".to_string(),
      previous_year_button:
        "almanac-previous-year-button"
          .to_string()
    }
  }
}

/// Class names applied to day cells by classification.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct Classes {
  pub past:           String,
  pub today:          String,
  pub event:          String,
  pub inactive:       String,
  pub selected:       String,
  pub last_month:     String,
  pub next_month:     String,
  pub adjacent_month: String
}

impl Default for Classes {
  fn default() -> Self {
    Self {
      past:           "past".to_string(),
      today:          "today".to_string(),
      event:          "event".to_string(),
      inactive:       "inactive".to_string(),
      selected:       "selected".to_string(),
      last_month:     "last-month".to_string(),
      next_month:     "next-month".to_string(),
      adjacent_month: "adjacent-month"
        .to_string()
    }
  }
}

/// User configuration, as read from `almanac.toml`.
#[derive(
  Debug, Clone, PartialEq, Serialize, Deserialize,
)]
pub struct CalendarConfig {
  /// Rotation applied to the locale's week start, 0..=6.
  #[serde(default)]
  pub week_offset: i64,
  #[serde(default)]
  pub length_of_time: LengthOfTime,
  #[serde(default = "config_true")]
  pub show_adjacent_months: bool,
  #[serde(default)]
  pub adjacent_days_change_month: bool,
  #[serde(default)]
  pub force_six_rows: bool,
  #[serde(default)]
  pub constraints: Constraints,
  #[serde(default)]
  pub multi_day_events: Option<MultiDayMapping>,
  #[serde(
    default = "config_default_date_parameter"
  )]
  pub date_parameter: String,
  #[serde(default)]
  pub selected_date: Option<DateInput>,
  #[serde(default)]
  pub track_selected_date: bool,
  #[serde(default)]
  pub ignore_inactive_days_in_selection: bool,
  #[serde(default)]
  pub start_with_month: Option<DateInput>,
  #[serde(default)]
  pub days_of_the_week: Option<Vec<String>>,
  #[serde(default)]
  pub targets: Targets,
  #[serde(default)]
  pub classes: Classes,
  #[serde(default)]
  pub events: Vec<CalendarEvent>,
  #[serde(default)]
  pub extras: serde_json::Value,
  #[serde(default)]
  pub locale: Option<String>,
  /// IANA zone name used by the date adapter.
  #[serde(default)]
  pub zone: Option<String>
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      week_offset: 0,
      length_of_time: LengthOfTime::default(),
      show_adjacent_months: config_true(),
      adjacent_days_change_month: false,
      force_six_rows: false,
      constraints: Constraints::default(),
      multi_day_events: None,
      date_parameter:
        config_default_date_parameter(),
      selected_date: None,
      track_selected_date: false,
      ignore_inactive_days_in_selection: false,
      start_with_month: None,
      days_of_the_week: None,
      targets: Targets::default(),
      classes: Classes::default(),
      events: Vec::new(),
      extras: serde_json::Value::Null,
      locale: None,
      zone: None
    }
  }
}

impl CalendarConfig {
  /// Days take precedence over months when both are set.
  pub fn mode(&self) -> ViewMode {
    match (
      self.length_of_time.days,
      self.length_of_time.months
    ) {
      | (Some(days), _) if days > 0 => {
        ViewMode::Days(days)
      }
      | (_, Some(months)) if months > 0 => {
        ViewMode::Months(months)
      }
      | _ => ViewMode::Month
    }
  }
}

pub type WeekdayHeaderFn<N> =
  Box<dyn Fn(&N) -> String + Send + Sync>;

pub type RenderFn<D> = Box<
  dyn Fn(&TemplateData<D>) -> String
    + Send
    + Sync
>;

/// [`CalendarConfig`] plus the host callbacks that cannot be
/// deserialized.
pub struct CalendarOptions<A: DateAdapter> {
  pub config: CalendarConfig,
  /// Called with the native value of each header weekday.
  pub format_weekday_header:
    Option<WeekdayHeaderFn<A::Native>>,
  pub render: Option<RenderFn<A::Date>>
}

impl<A: DateAdapter> CalendarOptions<A> {
  pub fn new(config: CalendarConfig) -> Self {
    Self {
      config,
      format_weekday_header: None,
      render: None
    }
  }

  #[must_use]
  pub fn with_weekday_header(
    mut self,
    header: impl Fn(&A::Native) -> String
    + Send
    + Sync
    + 'static
  ) -> Self {
    self.format_weekday_header =
      Some(Box::new(header));
    self
  }

  #[must_use]
  pub fn with_render(
    mut self,
    render: impl Fn(&TemplateData<A::Date>) -> String
    + Send
    + Sync
    + 'static
  ) -> Self {
    self.render = Some(Box::new(render));
    self
  }
}

impl<A: DateAdapter> Default
  for CalendarOptions<A>
{
  fn default() -> Self {
    Self::new(CalendarConfig::default())
  }
}

impl<A: DateAdapter> From<CalendarConfig>
  for CalendarOptions<A>
{
  fn from(config: CalendarConfig) -> Self {
    Self::new(config)
  }
}

impl<A: DateAdapter> fmt::Debug
  for CalendarOptions<A>
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("CalendarOptions")
      .field("config", &self.config)
      .field(
        "format_weekday_header",
        &self.format_weekday_header.is_some()
      )
      .field("render", &self.render.is_some())
      .finish()
  }
}

#[derive(Debug)]
pub struct NormalizedConfig<A: DateAdapter> {
  pub options:          CalendarOptions<A>,
  pub days_of_the_week: Vec<String>
}

/// Sanitizes `options.config` and derives the weekday header labels.
#[tracing::instrument(skip_all)]
pub fn normalize<A: DateAdapter>(
  adapter: &A,
  mut options: CalendarOptions<A>
) -> NormalizedConfig<A> {
  sanitize_config(&mut options.config);
  let days_of_the_week =
    compute_weekday_labels(adapter, &options);
  debug!(
    labels = ?days_of_the_week,
    mode = ?options.config.mode(),
    "normalized calendar options"
  );
  NormalizedConfig {
    options,
    days_of_the_week
  }
}

/// Header labels in display order.
///
/// Seven user-supplied labels are rotated by `week_offset`. Otherwise
/// the `format_weekday_header` callback, when present, is called for
/// each column; the fallback is the first character of each
/// two-letter weekday label.
pub fn compute_weekday_labels<A: DateAdapter>(
  adapter: &A,
  options: &CalendarOptions<A>
) -> Vec<String> {
  let config = &options.config;
  let offset = config.week_offset;

  if let Some(labels) = &config.days_of_the_week
    && labels.len() == 7
  {
    return rotate(labels, offset);
  }

  let start = adapter.now().start_of(DateUnit::Week);

  if let Some(header) =
    &options.format_weekday_header
  {
    return (0..7_i64)
      .map(|idx| {
        let day = adapter.set_weekday(
          &start,
          (idx + offset).rem_euclid(7)
        );
        day
          .value()
          .map(|native| header(&native))
          .unwrap_or_default()
      })
      .collect();
  }

  let labels: Vec<String> = (0..7_i64)
    .map(|idx| {
      adapter
        .set_weekday(&start, idx)
        .format("dd")
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default()
    })
    .collect();
  rotate(&labels, offset)
}

fn restore_blank(
  value: &mut String,
  default: String,
  field: &'static str
) {
  if value.trim().is_empty() {
    warn!(
      field,
      default = %default,
      "blank name; restoring default"
    );
    *value = default;
  }
}

fn sanitize_config(config: &mut CalendarConfig) {
  if !(0..7).contains(&config.week_offset) {
    let reduced = config.week_offset.rem_euclid(7);
    warn!(
      week_offset = config.week_offset,
      reduced,
      "week_offset outside 0..=6; reducing"
    );
    config.week_offset = reduced;
  }

  let lot = &mut config.length_of_time;
  if lot.days == Some(0) {
    warn!("length_of_time.days = 0; ignoring");
    lot.days = None;
  }
  if lot.months == Some(0) {
    warn!(
      "length_of_time.months = 0; ignoring"
    );
    lot.months = None;
  }
  if lot.days.is_some() && lot.months.is_some()
  {
    warn!(
      days = ?lot.days,
      months = ?lot.months,
      "both days and months set; using days"
    );
    lot.months = None;
  }
  if lot.interval <= 0 {
    warn!(
      interval = lot.interval,
      "length_of_time.interval must be \
       positive; using 1"
    );
    lot.interval = config_default_interval();
  }

  if let Some(labels) = &config.days_of_the_week
    && labels.len() != 7
  {
    warn!(
      count = labels.len(),
      "days_of_the_week needs 7 labels; \
       ignoring"
    );
    config.days_of_the_week = None;
  }

  restore_blank(
    &mut config.date_parameter,
    config_default_date_parameter(),
    "date_parameter"
  );

  let targets = Targets::default();
  let t = &mut config.targets;
  restore_blank(&mut t.day, targets.day, "targets.day");
  restore_blank(
    &mut t.empty,
    targets.empty,
    "targets.empty"
  );
  restore_blank(
    &mut t.next_button,
    targets.next_button,
    "targets.next_button"
  );
  restore_blank(
    &mut t.today_button,
    targets.today_button,
    "targets.today_button"
  );
  restore_blank(
    &mut t.previous_button,
    targets.previous_button,
    "targets.previous_button"
  );
  restore_blank(
    &mut t.next_year_button,
    targets.next_year_button,
    "targets.next_year_button"
  );
  restore_blank(
    &mut t.previous_year_button,
    targets.previous_year_button,
    "targets.previous_year_button"
  );

  let classes = Classes::default();
  let c = &mut config.classes;
  restore_blank(&mut c.past, classes.past, "classes.past");
  restore_blank(
    &mut c.today,
    classes.today,
    "classes.today"
  );
  restore_blank(
    &mut c.event,
    classes.event,
    "classes.event"
  );
  restore_blank(
    &mut c.inactive,
    classes.inactive,
    "classes.inactive"
  );
  restore_blank(
    &mut c.selected,
    classes.selected,
    "classes.selected"
  );
  restore_blank(
    &mut c.last_month,
    classes.last_month,
    "classes.last_month"
  );
  restore_blank(
    &mut c.next_month,
    classes.next_month,
    "classes.next_month"
  );
  restore_blank(
    &mut c.adjacent_month,
    classes.adjacent_month,
    "classes.adjacent_month"
  );
}

/// Parses TOML configuration text.
pub fn parse_config(
  text: &str
) -> anyhow::Result<CalendarConfig> {
  toml::from_str::<CalendarConfig>(text)
    .context("failed to parse calendar config")
}

/// Loads configuration from the first location that applies: the
/// explicit override, `$ALMANAC_CONFIG`, then
/// `<config dir>/almanac/almanac.toml`. Defaults are used when none
/// exists.
#[tracing::instrument(skip(path_override))]
pub fn load_config(
  path_override: Option<&Path>
) -> anyhow::Result<CalendarConfig> {
  let path = resolve_config_path(
    path_override,
    std::env::var_os(CONFIG_ENV_VAR),
    dirs::config_dir()
  );

  let Some(path) = path else {
    debug!(
      "no almanac config found; using \
       defaults"
    );
    return Ok(CalendarConfig::default());
  };

  load_config_file(&path)
}

pub fn load_config_file(
  path: &Path
) -> anyhow::Result<CalendarConfig> {
  info!(config = %path.display(), "loading calendar config");
  let text = fs::read_to_string(path)
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;
  parse_config(&text).with_context(|| {
    format!("in {}", path.display())
  })
}

fn resolve_config_path(
  path_override: Option<&Path>,
  env_value: Option<OsString>,
  config_dir: Option<PathBuf>
) -> Option<PathBuf> {
  if let Some(path) = path_override {
    return Some(path.to_path_buf());
  }

  if let Some(value) = env_value
    && !value.is_empty()
  {
    return Some(PathBuf::from(value));
  }

  let candidate = config_dir?
    .join("almanac")
    .join("almanac.toml");
  if candidate.exists() {
    Some(candidate)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use chrono::NaiveDate;
  use tempfile::{
    NamedTempFile,
    tempdir
  };

  use super::*;
  use crate::adapter::ChronoAdapter;

  fn adapter(locale: &str) -> ChronoAdapter {
    let now = NaiveDate::from_ymd_opt(
      2018, 1, 17
    )
    .and_then(|d| d.and_hms_opt(12, 0, 0))
    .expect("valid now");
    ChronoAdapter::new(locale).with_fixed_now(now)
  }

  #[test]
  fn defaults_from_empty_toml() {
    let config =
      parse_config("").expect("empty config");
    assert_eq!(config, CalendarConfig::default());
    assert!(config.show_adjacent_months);
    assert_eq!(config.date_parameter, "date");
    assert_eq!(config.length_of_time.interval, 1);
    assert_eq!(config.mode(), ViewMode::Month);
  }

  #[test]
  fn accepts_unquoted_toml_dates() {
    let config = parse_config(
      r#"
selected_date = 2018-01-17
start_with_month = 2018-03-01T09:30:00

[length_of_time]
start_date = "2018-02-04"

[constraints]
start_date = 2018-01-01
end_date = 2018-12-31
"#
    )
    .expect("native dates");

    let en = adapter("en");
    let resolve = |input: &Option<DateInput>| {
      input
        .as_ref()
        .map(|input| input.resolve(&en).format("YYYY-MM-DD"))
    };
    assert!(matches!(
      config.selected_date,
      Some(DateInput::Toml(_))
    ));
    assert_eq!(
      resolve(&config.selected_date).as_deref(),
      Some("2018-01-17")
    );
    assert_eq!(
      resolve(&config.start_with_month).as_deref(),
      Some("2018-03-01")
    );
    assert_eq!(
      resolve(&config.length_of_time.start_date).as_deref(),
      Some("2018-02-04")
    );
    assert_eq!(
      resolve(&config.constraints.start_date).as_deref(),
      Some("2018-01-01")
    );
    assert_eq!(
      resolve(&config.constraints.end_date).as_deref(),
      Some("2018-12-31")
    );
  }

  #[test]
  fn parses_nested_sections() {
    let config = parse_config(
      r#"
week_offset = 1
force_six_rows = true

[length_of_time]
days = 14
interval = 7
start_date = "2025-11-02"

[constraints]
start_date = "2018-01-01"

[multi_day_events]
start_date = "from"
end_date = "to"

[classes]
today = "is-today"

[[events]]
from = "2020-01-05"
to = "2020-01-07"
title = "Trip"
"#
    )
    .expect("valid config");

    assert_eq!(config.mode(), ViewMode::Days(14));
    assert_eq!(config.length_of_time.interval, 7);
    assert_eq!(config.classes.today, "is-today");
    assert_eq!(config.classes.past, "past");
    assert_eq!(
      config
        .multi_day_events
        .as_ref()
        .map(|m| m.start_date.as_str()),
      Some("from")
    );
    assert_eq!(config.events.len(), 1);
  }

  #[test]
  fn sanitize_resolves_conflicts() {
    let mut config = CalendarConfig {
      week_offset: 9,
      length_of_time: LengthOfTime {
        days: Some(7),
        months: Some(2),
        interval: 0,
        start_date: None
      },
      days_of_the_week: Some(vec![
        "a".to_string(),
        "b".to_string(),
      ]),
      ..CalendarConfig::default()
    };
    config.classes.today = "  ".to_string();

    sanitize_config(&mut config);

    assert_eq!(config.week_offset, 2);
    assert_eq!(config.mode(), ViewMode::Days(7));
    assert_eq!(config.length_of_time.months, None);
    assert_eq!(config.length_of_time.interval, 1);
    assert_eq!(config.days_of_the_week, None);
    assert_eq!(config.classes.today, "today");
  }

  #[test]
  fn narrow_labels_follow_locale() {
    let en = adapter("en");
    let labels = compute_weekday_labels(
      &en,
      &CalendarOptions::default()
    );
    assert_eq!(
      labels,
      vec!["S", "M", "T", "W", "T", "F", "S"]
    );

    let fr = adapter("fr");
    let labels = compute_weekday_labels(
      &fr,
      &CalendarOptions::default()
    );
    assert_eq!(
      labels,
      vec!["l", "m", "m", "j", "v", "s", "d"]
    );
  }

  #[test]
  fn rotation_law_holds_for_every_offset() {
    let en = adapter("en");
    let base = compute_weekday_labels(
      &en,
      &CalendarOptions::default()
    );
    for k in 0..7 {
      let options =
        CalendarOptions::<ChronoAdapter>::new(
          CalendarConfig {
            week_offset: k,
            ..CalendarConfig::default()
          }
        );
      assert_eq!(
        compute_weekday_labels(&en, &options),
        rotate(&base, k)
      );
    }
  }

  #[test]
  fn supplied_labels_are_rotated() {
    let labels: Vec<String> =
      ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
        .into_iter()
        .map(String::from)
        .collect();
    let options =
      CalendarOptions::<ChronoAdapter>::new(
        CalendarConfig {
          week_offset: 1,
          days_of_the_week: Some(labels),
          ..CalendarConfig::default()
        }
      );
    let out =
      compute_weekday_labels(&adapter("en"), &options);
    assert_eq!(out[0], "Mo");
    assert_eq!(out[6], "Su");
  }

  #[test]
  fn header_callback_gets_native_weekdays() {
    let options =
      CalendarOptions::<ChronoAdapter>::new(
        CalendarConfig {
          week_offset: 1,
          ..CalendarConfig::default()
        }
      )
      .with_weekday_header(|native| {
        native.format("%a").to_string()
      });
    let out =
      compute_weekday_labels(&adapter("en"), &options);
    assert_eq!(
      out,
      vec![
        "Mon", "Tue", "Wed", "Thu", "Fri", "Sat",
        "Sun"
      ]
    );
  }

  #[test]
  fn config_path_resolution_order() {
    let dir = tempdir().expect("tempdir");
    let explicit = dir.path().join("explicit.toml");

    assert_eq!(
      resolve_config_path(
        Some(&explicit),
        Some(OsString::from("/env.toml")),
        Some(dir.path().to_path_buf())
      ),
      Some(explicit.clone())
    );
    assert_eq!(
      resolve_config_path(
        None,
        Some(OsString::from("/env.toml")),
        Some(dir.path().to_path_buf())
      ),
      Some(PathBuf::from("/env.toml"))
    );
    assert_eq!(
      resolve_config_path(
        None,
        None,
        Some(dir.path().to_path_buf())
      ),
      None
    );

    let nested = dir.path().join("almanac");
    fs::create_dir_all(&nested).expect("mkdir");
    fs::write(nested.join("almanac.toml"), "")
      .expect("write config");
    assert_eq!(
      resolve_config_path(
        None,
        Some(OsString::new()),
        Some(dir.path().to_path_buf())
      ),
      Some(nested.join("almanac.toml"))
    );
  }

  #[test]
  fn load_file_reports_path_on_error() {
    let mut file =
      NamedTempFile::new().expect("temp file");
    writeln!(file, "week_offset = \"monday\"")
      .expect("write");
    let err = load_config_file(file.path())
      .expect_err("type mismatch");
    let rendered = format!("{err:#}");
    assert!(rendered.contains(
      &file.path().display().to_string()
    ));
  }
}
