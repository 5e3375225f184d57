pub mod adapter;
pub mod change;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod input;
pub mod interaction;
pub mod render;
pub mod state;
pub mod template;

use std::ffi::OsString;
use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::adapter::{
  ChronoAdapter,
  DateAdapter,
  JiffAdapter
};
use crate::cli::{
  Action,
  AdapterKind
};
use crate::config::CalendarConfig;
use crate::engine::Calendar;
use crate::input::DateValue;
use crate::interaction::ClickOutcome;

/// How the driver prints the final view.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
  pub json:  bool,
  pub color: bool
}

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    adapter = ?cli.adapter,
    "starting almanac"
  );

  let mut config = config::load_config(
    cli.config.as_deref()
  )?;
  if let Some(locale) = &cli.locale {
    config.locale = Some(locale.clone());
  }
  if let Some(zone) = &cli.zone {
    config.zone = Some(zone.clone());
  }

  let actions =
    cli::parse_actions(&cli.rest)?;
  debug!(?actions, "parsed actions");

  let locale = config
    .locale
    .clone()
    .unwrap_or_else(|| "en".to_string());
  let output = OutputOptions {
    json:  cli.json,
    color: !cli.no_color
  };
  let mut out = std::io::stdout().lock();

  match cli.adapter {
    | AdapterKind::Chrono => {
      let mut adapter =
        ChronoAdapter::new(&locale);
      if let Some(zone) = &config.zone {
        adapter = adapter.with_zone_name(zone);
      }
      if let Some(day) = cli.today {
        adapter = adapter
          .with_fixed_now(day.and_time(chrono::NaiveTime::MIN));
      }
      drive(adapter, config, &actions, output, &mut out)?;
    }
    | AdapterKind::Jiff => {
      let mut adapter =
        JiffAdapter::new(&locale);
      if let Some(zone) = &config.zone {
        adapter = adapter.with_zone_name(zone);
      }
      if let Some(day) = cli.today {
        let now = jiff::civil::DateTime::new(
          i16::try_from(chrono::Datelike::year(&day))
            .context("--today year out of range")?,
          i8::try_from(chrono::Datelike::month(&day))
            .context("--today month out of range")?,
          i8::try_from(chrono::Datelike::day(&day))
            .context("--today day out of range")?,
          0,
          0,
          0,
          0
        )
        .context("invalid --today date")?;
        adapter = adapter.with_fixed_now(now);
      }
      drive(adapter, config, &actions, output, &mut out)?;
    }
  }

  info!("done");
  Ok(())
}

/// Builds a calendar, applies `actions` in order and prints the
/// resulting view.
#[tracing::instrument(skip_all, fields(actions = actions.len()))]
pub fn drive<A: DateAdapter, W: Write>(
  adapter: A,
  config: CalendarConfig,
  actions: &[Action],
  output: OutputOptions,
  writer: &mut W
) -> anyhow::Result<()> {
  let mut calendar = Calendar::new(adapter, config);

  for action in actions {
    apply(&mut calendar, action);
  }

  let data = calendar.template_data();
  if output.json {
    let value = render::template_json(
      &data,
      &calendar.constraints()
    );
    serde_json::to_writer_pretty(&mut *writer, &value)
      .context("failed to write calendar json")?;
    writeln!(writer)?;
  } else {
    render::TextRenderer::new(output.color)
      .with_classes(&calendar.config().classes)
      .write_calendar(writer, &data)?;
    render::write_constraints(
      writer,
      &calendar.constraints()
    )?;
  }
  writer.flush()?;
  Ok(())
}

fn apply<A: DateAdapter>(
  calendar: &mut Calendar<A>,
  action: &Action
) {
  let mode = calendar.mode();
  let change = match action {
    | Action::Next(step) => calendar.forward(*step),
    | Action::Prev(step) => calendar.back(*step),
    | Action::NextYear => calendar.next_year(),
    | Action::PrevYear => {
      calendar.previous_year()
    }
    | Action::Today => Some(calendar.today()),
    | Action::Month(month) => {
      calendar.set_month(month.clone()).ok()
    }
    | Action::Year(year) => {
      Some(calendar.set_year(*year))
    }
    | Action::Start(date) => calendar
      .set_interval_start(date.as_str())
      .ok(),
    | Action::Select(date) => {
      calendar.set_selected_date(
        date.as_deref().map(DateValue::from)
      );
      return;
    }
    | Action::Click(date) => {
      let click = calendar.click_day(date.as_str());
      info!(
        events = click.events.len(),
        outcome = ?click.outcome,
        "day clicked"
      );
      match click.outcome {
        | ClickOutcome::Navigated(change) => change,
        | ClickOutcome::Selected
        | ClickOutcome::Unchanged => return
      }
    }
  };

  match change {
    | Some(change) => {
      let notifications =
        change.notifications(mode);
      info!(
        ?action,
        ?notifications,
        "navigation applied"
      );
    }
    | None => {
      warn!(?action, "navigation refused");
    }
  }
}
