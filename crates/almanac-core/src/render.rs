use std::io::{self, IsTerminal, Write};

use serde_json::{Value, json};
use unicode_width::UnicodeWidthStr;

use crate::adapter::AdapterDate;
use crate::config::Classes;
use crate::engine::ConstraintState;
use crate::event::RuntimeEvent;
use crate::grid::{CalendarDay, WEEK_LENGTH};
use crate::template::{IntervalEvents, Renderer, TemplateData};

/// Plain-text grid renderer for terminals.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    color: bool,
    selected_class: String,
}

impl TextRenderer {
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
            selected_class: Classes::default().selected,
        }
    }

    /// Uses the configured class to spot the selected day.
    pub fn with_classes(mut self, classes: &Classes) -> Self {
        self.selected_class = classes.selected.clone();
        self
    }

    #[tracing::instrument(skip_all)]
    pub fn write_calendar<W: Write, D: AdapterDate>(
        &self,
        writer: &mut W,
        data: &TemplateData<D>,
    ) -> anyhow::Result<()> {
        if !data.months.is_empty() {
            for (idx, block) in data.months.iter().enumerate() {
                if idx > 0 {
                    writeln!(writer)?;
                }
                writeln!(writer, "{}", block.month.format("MMMM YYYY"))?;
                self.write_grid(writer, &data.days_of_the_week, &block.days)?;
            }
        } else {
            let title = match (&data.month, &data.year, &data.interval_start, &data.interval_end) {
                (Some(month), Some(year), _, _) => format!("{month} {year}"),
                (_, _, Some(start), Some(end)) => format!(
                    "{} to {}",
                    start.format("YYYY-MM-DD"),
                    end.format("YYYY-MM-DD")
                ),
                _ => String::new(),
            };
            writeln!(writer, "{title}")?;
            self.write_grid(writer, &data.days_of_the_week, &data.days)?;
        }

        let events = interval_events(data);
        if !events.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Events:")?;
            for event in events {
                writeln!(writer, "  {}", describe_event(event))?;
            }
        }

        Ok(())
    }

    fn write_grid<W: Write, D: AdapterDate>(
        &self,
        writer: &mut W,
        labels: &[String],
        days: &[CalendarDay<D>],
    ) -> anyhow::Result<()> {
        let rows = days
            .chunks(WEEK_LENGTH)
            .map(|week| week.iter().map(|day| self.cell(day)).collect())
            .collect();
        write_table(writer, labels.to_vec(), rows)
    }

    fn cell<D>(&self, day: &CalendarDay<D>) -> String {
        if day.is_placeholder() {
            return String::new();
        }

        let props = day.properties.unwrap_or_default();
        let mut text = day.day.to_string();
        if !day.events.is_empty() {
            text.push('*');
        }
        if day.has_class(&self.selected_class) {
            text = format!("<{text}>");
        }
        if props.is_today {
            text = format!("[{text}]");
        }

        if props.is_today {
            self.paint(&text, "1;7")
        } else if props.is_inactive || props.is_adjacent_month {
            self.paint(&text, "2")
        } else if !day.events.is_empty() {
            self.paint(&text, "33")
        } else {
            text
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl<D: AdapterDate> Renderer<D> for TextRenderer {
    fn render(&self, data: &TemplateData<D>) -> String {
        let mut buf = Vec::new();
        if let Err(err) = self.write_calendar(&mut buf, data) {
            tracing::error!(error = %err, "failed to render calendar text");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Which navigation buttons a host would disable.
pub fn write_constraints<W: Write>(
    writer: &mut W,
    constraints: &ConstraintState,
) -> anyhow::Result<()> {
    let blocked: Vec<&str> = [
        ("previous", constraints.previous),
        ("next", constraints.next),
        ("previous-year", constraints.previous_year),
        ("next-year", constraints.next_year),
        ("today", constraints.today),
    ]
    .into_iter()
    .filter(|(_, allowed)| !allowed)
    .map(|(name, _)| name)
    .collect();

    if !blocked.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Blocked: {}", blocked.join(", "))?;
    }
    Ok(())
}

fn interval_events<D>(data: &TemplateData<D>) -> Vec<&RuntimeEvent<D>> {
    match &data.events_this_interval {
        IntervalEvents::None => data.events_this_month.iter().collect(),
        IntervalEvents::Flat(events) => events.iter().collect(),
        IntervalEvents::PerMonth(buckets) => buckets.iter().flatten().collect(),
    }
}

fn describe_event<D: AdapterDate>(event: &RuntimeEvent<D>) -> String {
    let start = event.start().format("YYYY-MM-DD");
    let end = event.end().format("YYYY-MM-DD");
    let span = if start == end {
        start
    } else {
        format!("{start}..{end}")
    };
    let record = event.event();
    let label = record
        .text("title")
        .or_else(|| record.text("name"))
        .map(str::to_string)
        .unwrap_or_else(|| Value::Object(record.fields().clone()).to_string());
    format!("{span} {label}")
}

fn day_json<D: AdapterDate>(day: &CalendarDay<D>) -> Value {
    json!({
        "day": day.day,
        "date": day.date.map(|date| date.format("YYYY-MM-DD")),
        "classes": day.classes,
        "properties": day.properties,
        "events": day.events.iter().map(|event| event.event()).collect::<Vec<_>>(),
    })
}

fn events_json<D: AdapterDate>(events: &[RuntimeEvent<D>]) -> Value {
    json!(events.iter().map(RuntimeEvent::event).collect::<Vec<_>>())
}

/// The template data as JSON, for hosts that render elsewhere.
pub fn template_json<D: AdapterDate>(
    data: &TemplateData<D>,
    constraints: &ConstraintState,
) -> Value {
    let iso = |date: &Option<D>| date.map(|date| date.to_iso());
    let interval = match &data.events_this_interval {
        IntervalEvents::None => Value::Null,
        IntervalEvents::Flat(events) => events_json(events),
        IntervalEvents::PerMonth(buckets) => {
            Value::Array(buckets.iter().map(|bucket| events_json(bucket)).collect())
        }
    };

    json!({
        "days_of_the_week": data.days_of_the_week,
        "extras": data.extras,
        "month": data.month,
        "year": data.year,
        "days": data.days.iter().map(day_json).collect::<Vec<_>>(),
        "months": data
            .months
            .iter()
            .map(|block| json!({
                "month": block.month.format("YYYY-MM"),
                "days": block.days.iter().map(day_json).collect::<Vec<_>>(),
            }))
            .collect::<Vec<_>>(),
        "number_of_rows": data.number_of_rows,
        "interval_start": iso(&data.interval_start),
        "interval_end": iso(&data.interval_end),
        "events_this_month": events_json(&data.events_this_month),
        "events_last_month": events_json(&data.events_last_month),
        "events_next_month": events_json(&data.events_next_month),
        "events_this_interval": interval,
        "constraints": constraints,
    })
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:>width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:->width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = row.get(idx).map(String::as_str).unwrap_or_default();
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", " ".repeat(padding), cell)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::adapter::ChronoAdapter;
    use crate::config::CalendarConfig;
    use crate::engine::Calendar;
    use crate::event::CalendarEvent;
    use crate::input::DateInput;

    fn calendar() -> Calendar<ChronoAdapter> {
        let now = NaiveDate::from_ymd_opt(2018, 1, 17)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid now");
        Calendar::new(
            ChronoAdapter::new("en").with_fixed_now(now),
            CalendarConfig {
                events: vec![
                    CalendarEvent::new()
                        .with("date", "2018-01-09")
                        .with("title", "Standup"),
                ],
                ..CalendarConfig::default()
            },
        )
    }

    #[test]
    fn text_grid_marks_days() {
        let cal = calendar();
        let text = cal.render_with(&TextRenderer::new(false));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "January 2018");
        // Title, header, separator and five week rows.
        assert!(lines.len() >= 8);
        assert!(text.contains("[17]"));
        assert!(text.contains("9*"));
        assert!(text.contains("2018-01-09 Standup"));
    }

    #[test]
    fn selected_marker_follows_configured_class() {
        let now = NaiveDate::from_ymd_opt(2018, 1, 17)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid now");
        let config = CalendarConfig {
            track_selected_date: true,
            selected_date: Some(DateInput::from("2018-01-20")),
            classes: Classes {
                selected: "picked".to_string(),
                ..Classes::default()
            },
            ..CalendarConfig::default()
        };
        let cal = Calendar::new(ChronoAdapter::new("en").with_fixed_now(now), config);

        let default_text = cal.render_with(&TextRenderer::new(false));
        assert!(!default_text.contains("<20>"));

        let renderer = TextRenderer::new(false).with_classes(&cal.config().classes);
        assert!(cal.render_with(&renderer).contains("<20>"));
    }

    #[test]
    fn table_aligns_wide_cells() {
        let mut out = Vec::new();
        write_table(
            &mut out,
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["[17]".to_string(), "é".to_string()]],
        )
        .expect("write table");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "   a b ");
        assert_eq!(lines[1], "---- - ");
        assert_eq!(lines[2], "[17] é ");
    }

    #[test]
    fn strips_ansi_sequences() {
        assert_eq!(strip_ansi("\x1b[1;7m[17]\x1b[0m"), "[17]");
    }

    #[test]
    fn json_payload() {
        let cal = calendar();
        let value = template_json(&cal.template_data(), &cal.constraints());
        assert_eq!(value["month"], "January");
        assert_eq!(value["number_of_rows"], 5);
        assert_eq!(value["days"].as_array().map(Vec::len), Some(35));
        assert_eq!(value["days"][0]["date"], "2017-12-31");
        assert_eq!(value["events_this_month"][0]["title"], "Standup");
        assert_eq!(value["constraints"]["next"], true);
        assert_eq!(value["events_this_interval"], Value::Null);
    }

    #[test]
    fn blocked_buttons_listed() {
        let mut out = Vec::new();
        let constraints = ConstraintState {
            next: false,
            ..ConstraintState::unrestricted()
        };
        write_constraints(&mut out, &constraints).expect("write");
        assert_eq!(String::from_utf8(out).expect("utf8"), "\nBlocked: next\n");
    }
}
