//! Canonical format tokens and their strftime translation.
//!
//! Patterns use moment-style tokens. Text inside `[...]` is literal and
//! any character that does not start a token passes through unchanged.

use super::WeekdayLabelStyle;
use super::locale::LocaleData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
  Year4,
  Year2,
  MonthLong,
  MonthShort,
  Month2,
  Month1,
  WeekdayLong,
  WeekdayShort,
  WeekdayMin,
  Day2,
  Day1,
  Hour2,
  Hour1,
  Minute2,
  Second2
}

// Longest tokens first so `MMMM` never reads as `MM` + `MM`.
const FIELDS: [(&str, Field); 15] = [
  ("YYYY", Field::Year4),
  ("MMMM", Field::MonthLong),
  ("dddd", Field::WeekdayLong),
  ("MMM", Field::MonthShort),
  ("ddd", Field::WeekdayShort),
  ("YY", Field::Year2),
  ("MM", Field::Month2),
  ("DD", Field::Day2),
  ("dd", Field::WeekdayMin),
  ("HH", Field::Hour2),
  ("mm", Field::Minute2),
  ("ss", Field::Second2),
  ("M", Field::Month1),
  ("D", Field::Day1),
  ("H", Field::Hour1)
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
  Literal(String),
  Field(Field)
}

/// Calendar fields a localized rendering needs besides the library's
/// own numeric formatting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CivilFields {
  /// 1..=12
  pub month:   u32,
  pub day:     u32,
  /// Sunday = 0
  pub weekday: u32,
  pub hour:    u32
}

pub(crate) fn tokenize(
  pattern: &str
) -> Vec<Piece> {
  let mut pieces = Vec::new();
  let mut literal = String::new();
  let mut rest = pattern;

  while let Some(ch) = rest.chars().next() {
    if ch == '['
      && let Some(close) = rest.find(']')
    {
      literal.push_str(&rest[1..close]);
      rest = &rest[close + 1..];
      continue;
    }

    if let Some((token, field)) = FIELDS
      .iter()
      .find(|(token, _)| {
        rest.starts_with(token)
      })
    {
      if !literal.is_empty() {
        pieces.push(Piece::Literal(
          std::mem::take(&mut literal)
        ));
      }
      pieces.push(Piece::Field(*field));
      rest = &rest[token.len()..];
      continue;
    }

    literal.push(ch);
    rest = &rest[ch.len_utf8()..];
  }

  if !literal.is_empty() {
    pieces.push(Piece::Literal(literal));
  }
  pieces
}

fn strftime_code(
  field: Field
) -> &'static str {
  match field {
    | Field::Year4 => "%Y",
    | Field::Year2 => "%y",
    | Field::MonthLong => "%B",
    | Field::MonthShort => "%b",
    | Field::Month2 | Field::Month1 => "%m",
    | Field::WeekdayLong => "%A",
    | Field::WeekdayShort
    | Field::WeekdayMin => "%a",
    | Field::Day2 | Field::Day1 => "%d",
    | Field::Hour2 | Field::Hour1 => "%H",
    | Field::Minute2 => "%M",
    | Field::Second2 => "%S"
  }
}

fn push_escaped(
  out: &mut String,
  text: &str
) {
  for ch in text.chars() {
    if ch == '%' {
      out.push_str("%%");
    } else {
      out.push(ch);
    }
  }
}

/// Translates a canonical pattern to strftime syntax, used for parsing.
pub(crate) fn to_strftime(
  pattern: &str
) -> String {
  let mut out = String::new();
  for piece in tokenize(pattern) {
    match piece {
      | Piece::Literal(text) => {
        push_escaped(&mut out, &text)
      }
      | Piece::Field(field) => {
        out.push_str(strftime_code(field))
      }
    }
  }
  out
}

/// Translates a canonical pattern to strftime syntax for one concrete
/// value: names come from `locale` and unpadded numbers are inlined as
/// literals, leaving only padded numeric codes for the library.
pub(crate) fn localize(
  pattern: &str,
  fields: &CivilFields,
  locale: &LocaleData
) -> String {
  let mut out = String::new();
  for piece in tokenize(pattern) {
    let field = match piece {
      | Piece::Literal(text) => {
        push_escaped(&mut out, &text);
        continue;
      }
      | Piece::Field(field) => field
    };

    match field {
      | Field::MonthLong => push_escaped(
        &mut out,
        locale.month_name(fields.month, false)
      ),
      | Field::MonthShort => push_escaped(
        &mut out,
        locale.month_name(fields.month, true)
      ),
      | Field::WeekdayLong => push_escaped(
        &mut out,
        &locale.weekday_name(
          fields.weekday,
          WeekdayLabelStyle::Long
        )
      ),
      | Field::WeekdayShort => push_escaped(
        &mut out,
        &locale.weekday_name(
          fields.weekday,
          WeekdayLabelStyle::Short
        )
      ),
      | Field::WeekdayMin => push_escaped(
        &mut out,
        locale.weekdays_min
          [(fields.weekday % 7) as usize]
      ),
      | Field::Month1 => out.push_str(
        &fields.month.to_string()
      ),
      | Field::Day1 => {
        out.push_str(&fields.day.to_string())
      }
      | Field::Hour1 => out.push_str(
        &fields.hour.to_string()
      ),
      | other => {
        out.push_str(strftime_code(other))
      }
    }
  }
  out
}
