use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::engine::MonthInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdapterKind {
    Chrono,
    Jiff,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: calendar grids and navigation in the terminal",
    disable_help_subcommand = true,
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// TOML calendar configuration.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "adapter", value_enum, default_value_t = AdapterKind::Chrono)]
    pub adapter: AdapterKind,

    #[arg(long = "locale")]
    pub locale: Option<String>,

    /// IANA time zone, e.g. Europe/Paris.
    #[arg(long = "zone")]
    pub zone: Option<String>,

    /// Pins the clock to midnight of YYYY-MM-DD.
    #[arg(
        long = "today",
        value_parser = clap::builder::ValueParser::new(parse_day)
    )]
    pub today: Option<NaiveDate>,

    #[arg(long = "json")]
    pub json: bool,

    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Navigation actions applied in order, e.g. `next:2 month:may select:2024-05-09`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

fn parse_day(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got: {s}"))
}

/// Env var checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "ALMANAC_LOG";

/// Level for engine spans given `-v`/`-q` counts. Quiet wins.
pub fn log_level(verbose: u8, quiet: u8) -> LevelFilter {
    match (quiet, verbose) {
        (2.., _) => LevelFilter::ERROR,
        (1, _) | (0, 0) => LevelFilter::WARN,
        (0, 1) => LevelFilter::INFO,
        (0, 2) => LevelFilter::DEBUG,
        (0, _) => LevelFilter::TRACE,
    }
}

fn default_filter(level: LevelFilter) -> String {
    // Dependencies stay at warn unless a filter env var says otherwise.
    let level = level.to_string().to_ascii_lowercase();
    format!("warn,almanac_core={level}")
}

/// Installs a stderr subscriber. Stdout is reserved for the calendar.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let level = log_level(verbose, quiet);
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_filter(level)))
        .map_err(|e| anyhow!("invalid {LOG_ENV_VAR} / RUST_LOG filter: {e}"))?;

    let stderr_tty = std::io::stderr().is_terminal();
    let init_result = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(level >= LevelFilter::DEBUG)
        .with_ansi(stderr_tty)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// One navigation step requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Next(Option<i64>),
    Prev(Option<i64>),
    NextYear,
    PrevYear,
    Today,
    Month(MonthInput),
    Year(i32),
    Start(String),
    /// `None` clears the selection.
    Select(Option<String>),
    Click(String),
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (s, None),
        };

        let required = |what: &str| {
            arg.filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("action '{name}' needs {what}, e.g. {name}:{what}"))
        };
        let step = || -> anyhow::Result<Option<i64>> {
            arg.filter(|value| !value.is_empty())
                .map(|value| {
                    value
                        .parse::<i64>()
                        .with_context(|| format!("invalid step for '{name}': {value}"))
                })
                .transpose()
        };

        let action = match name.to_ascii_lowercase().as_str() {
            "next" | "forward" => Self::Next(step()?),
            "prev" | "back" | "previous" => Self::Prev(step()?),
            "next-year" => Self::NextYear,
            "prev-year" | "previous-year" => Self::PrevYear,
            "today" => Self::Today,
            "month" => Self::Month(required("month")?.parse()?),
            "year" => {
                let raw = required("year")?;
                Self::Year(
                    raw.parse()
                        .with_context(|| format!("invalid year: {raw}"))?,
                )
            }
            "start" => Self::Start(required("date")?),
            "select" => match arg {
                Some(value) if !value.is_empty() && value != "none" => {
                    Self::Select(Some(value.to_string()))
                }
                _ => Self::Select(None),
            },
            "click" => Self::Click(required("date")?),
            other => return Err(anyhow!("unknown action: {other}")),
        };
        Ok(action)
    }
}

#[tracing::instrument(skip_all)]
pub fn parse_actions(rest: &[OsString]) -> anyhow::Result<Vec<Action>> {
    rest.iter()
        .map(|arg| {
            let token = arg.to_string_lossy();
            token
                .parse::<Action>()
                .with_context(|| format!("failed to parse action '{token}'"))
        })
        .collect()
}
