//! Built-in locale table: week starts and month/weekday names.
//!
//! Weekday arrays are Sunday-first, matching the 0 = Sunday convention of
//! [`DateAdapter::first_day_of_week`](super::DateAdapter::first_day_of_week).

use super::{
  WeekdayLabelStyle,
  rotate
};

#[derive(Debug, PartialEq, Eq)]
pub struct LocaleData {
  pub code:              &'static str,
  /// 0..=6, 0 = Sunday.
  pub first_day_of_week: u32,
  pub months_long:       [&'static str; 12],
  pub months_short:      [&'static str; 12],
  pub weekdays_long:     [&'static str; 7],
  pub weekdays_short:    [&'static str; 7],
  /// Two-letter labels.
  pub weekdays_min:      [&'static str; 7]
}

const EN_MONTHS: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];
const EN_MONTHS_SHORT: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May", "Jun",
  "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"
];
const EN_WEEKDAYS: [&str; 7] = [
  "Sunday",
  "Monday",
  "Tuesday",
  "Wednesday",
  "Thursday",
  "Friday",
  "Saturday"
];
const EN_WEEKDAYS_SHORT: [&str; 7] =
  ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const EN_WEEKDAYS_MIN: [&str; 7] =
  ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

pub static EN: LocaleData = LocaleData {
  code:              "en",
  first_day_of_week: 0,
  months_long:       EN_MONTHS,
  months_short:      EN_MONTHS_SHORT,
  weekdays_long:     EN_WEEKDAYS,
  weekdays_short:    EN_WEEKDAYS_SHORT,
  weekdays_min:      EN_WEEKDAYS_MIN
};

pub static EN_GB: LocaleData = LocaleData {
  code:              "en-gb",
  first_day_of_week: 1,
  months_long:       EN_MONTHS,
  months_short:      EN_MONTHS_SHORT,
  weekdays_long:     EN_WEEKDAYS,
  weekdays_short:    EN_WEEKDAYS_SHORT,
  weekdays_min:      EN_WEEKDAYS_MIN
};

pub static FR: LocaleData = LocaleData {
  code:              "fr",
  first_day_of_week: 1,
  months_long:       [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre"
  ],
  months_short:      [
    "janv.", "févr.", "mars", "avr.", "mai",
    "juin", "juil.", "août", "sept.", "oct.",
    "nov.", "déc."
  ],
  weekdays_long:     [
    "dimanche", "lundi", "mardi", "mercredi",
    "jeudi", "vendredi", "samedi"
  ],
  weekdays_short:    [
    "dim.", "lun.", "mar.", "mer.", "jeu.",
    "ven.", "sam."
  ],
  weekdays_min:      [
    "di", "lu", "ma", "me", "je", "ve", "sa"
  ]
};

pub static DE: LocaleData = LocaleData {
  code:              "de",
  first_day_of_week: 1,
  months_long:       [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember"
  ],
  months_short:      [
    "Jan.", "Feb.", "März", "Apr.", "Mai",
    "Juni", "Juli", "Aug.", "Sep.", "Okt.",
    "Nov.", "Dez."
  ],
  weekdays_long:     [
    "Sonntag",
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag"
  ],
  weekdays_short:    [
    "So.", "Mo.", "Di.", "Mi.", "Do.", "Fr.",
    "Sa."
  ],
  weekdays_min:      [
    "So", "Mo", "Di", "Mi", "Do", "Fr", "Sa"
  ]
};

pub static ES: LocaleData = LocaleData {
  code:              "es",
  first_day_of_week: 1,
  months_long:       [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre"
  ],
  months_short:      [
    "ene.", "feb.", "mar.", "abr.", "may.",
    "jun.", "jul.", "ago.", "sep.", "oct.",
    "nov.", "dic."
  ],
  weekdays_long:     [
    "domingo",
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado"
  ],
  weekdays_short:    [
    "dom.", "lun.", "mar.", "mié.", "jue.",
    "vie.", "sáb."
  ],
  weekdays_min:      [
    "do", "lu", "ma", "mi", "ju", "vi", "sá"
  ]
};

pub static IT: LocaleData = LocaleData {
  code:              "it",
  first_day_of_week: 1,
  months_long:       [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre"
  ],
  months_short:      [
    "gen", "feb", "mar", "apr", "mag", "giu",
    "lug", "ago", "set", "ott", "nov", "dic"
  ],
  weekdays_long:     [
    "domenica",
    "lunedì",
    "martedì",
    "mercoledì",
    "giovedì",
    "venerdì",
    "sabato"
  ],
  weekdays_short:    [
    "dom", "lun", "mar", "mer", "gio", "ven",
    "sab"
  ],
  weekdays_min:      [
    "do", "lu", "ma", "me", "gi", "ve", "sa"
  ]
};

pub static NL: LocaleData = LocaleData {
  code:              "nl",
  first_day_of_week: 1,
  months_long:       [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december"
  ],
  months_short:      [
    "jan.", "feb.", "mrt.", "apr.", "mei",
    "jun.", "jul.", "aug.", "sep.", "okt.",
    "nov.", "dec."
  ],
  weekdays_long:     [
    "zondag",
    "maandag",
    "dinsdag",
    "woensdag",
    "donderdag",
    "vrijdag",
    "zaterdag"
  ],
  weekdays_short:    [
    "zo.", "ma.", "di.", "wo.", "do.", "vr.",
    "za."
  ],
  weekdays_min:      [
    "zo", "ma", "di", "wo", "do", "vr", "za"
  ]
};

const PT_MONTHS: [&str; 12] = [
  "janeiro",
  "fevereiro",
  "março",
  "abril",
  "maio",
  "junho",
  "julho",
  "agosto",
  "setembro",
  "outubro",
  "novembro",
  "dezembro"
];
const PT_MONTHS_SHORT: [&str; 12] = [
  "jan", "fev", "mar", "abr", "mai", "jun",
  "jul", "ago", "set", "out", "nov", "dez"
];
const PT_WEEKDAYS: [&str; 7] = [
  "domingo",
  "segunda-feira",
  "terça-feira",
  "quarta-feira",
  "quinta-feira",
  "sexta-feira",
  "sábado"
];
const PT_WEEKDAYS_SHORT: [&str; 7] =
  ["dom", "seg", "ter", "qua", "qui", "sex", "sáb"];
const PT_WEEKDAYS_MIN: [&str; 7] =
  ["do", "2ª", "3ª", "4ª", "5ª", "6ª", "sá"];

pub static PT: LocaleData = LocaleData {
  code:              "pt",
  first_day_of_week: 1,
  months_long:       PT_MONTHS,
  months_short:      PT_MONTHS_SHORT,
  weekdays_long:     PT_WEEKDAYS,
  weekdays_short:    PT_WEEKDAYS_SHORT,
  weekdays_min:      PT_WEEKDAYS_MIN
};

pub static PT_BR: LocaleData = LocaleData {
  code:              "pt-br",
  first_day_of_week: 0,
  months_long:       PT_MONTHS,
  months_short:      PT_MONTHS_SHORT,
  weekdays_long:     PT_WEEKDAYS,
  weekdays_short:    PT_WEEKDAYS_SHORT,
  weekdays_min:      PT_WEEKDAYS_MIN
};

static TABLE: [&LocaleData; 9] = [
  &EN, &EN_GB, &FR, &DE, &ES, &IT, &NL, &PT,
  &PT_BR
];

/// Resolves a locale tag (`fr`, `en_GB`, `de-AT`, ...) to its data.
///
/// Exact tags win, then the bare language; anything else falls back to
/// English.
pub fn lookup(
  tag: &str
) -> &'static LocaleData {
  let normalized = tag
    .trim()
    .replace('_', "-")
    .to_ascii_lowercase();

  if let Some(found) = TABLE
    .iter()
    .copied()
    .find(|data| data.code == normalized)
  {
    return found;
  }

  let language = normalized
    .split('-')
    .next()
    .unwrap_or_default();
  if let Some(found) = TABLE
    .iter()
    .copied()
    .find(|data| data.code == language)
  {
    return found;
  }

  tracing::debug!(
    locale = %tag,
    "unknown locale; falling back to en"
  );
  &EN
}

impl LocaleData {
  /// `month` is 1-based.
  pub fn month_name(
    &self,
    month: u32,
    short: bool
  ) -> &'static str {
    let names = if short {
      &self.months_short
    } else {
      &self.months_long
    };
    month
      .checked_sub(1)
      .and_then(|idx| names.get(idx as usize))
      .copied()
      .unwrap_or_default()
  }

  /// `weekday` counts from Sunday = 0.
  pub fn weekday_name(
    &self,
    weekday: u32,
    style: WeekdayLabelStyle
  ) -> String {
    let idx = (weekday % 7) as usize;
    match style {
      | WeekdayLabelStyle::Long => {
        self.weekdays_long[idx].to_string()
      }
      | WeekdayLabelStyle::Short => {
        self.weekdays_short[idx].to_string()
      }
      | WeekdayLabelStyle::Narrow => self
        .weekdays_min[idx]
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default()
    }
  }

  /// Labels ordered from this locale's first day of week.
  pub fn weekday_labels(
    &self,
    style: WeekdayLabelStyle
  ) -> Vec<String> {
    let sunday_first: Vec<String> = (0..7)
      .map(|idx| {
        self.weekday_name(idx, style)
      })
      .collect();
    rotate(
      &sunday_first,
      i64::from(self.first_day_of_week)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_prefers_exact_tag() {
    assert_eq!(lookup("en-GB").code, "en-gb");
    assert_eq!(lookup("en_GB").code, "en-gb");
    assert_eq!(lookup("pt-BR").code, "pt-br");
  }

  #[test]
  fn lookup_falls_back_to_language() {
    assert_eq!(lookup("de-AT").code, "de");
    assert_eq!(lookup("fr-CA").code, "fr");
  }

  #[test]
  fn lookup_unknown_is_english() {
    assert_eq!(lookup("xx").code, "en");
    assert_eq!(lookup("").code, "en");
  }

  #[test]
  fn labels_start_at_first_day_of_week() {
    assert_eq!(
      EN.weekday_labels(
        WeekdayLabelStyle::Short
      )[0],
      "Sun"
    );
    assert_eq!(
      FR.weekday_labels(
        WeekdayLabelStyle::Long
      )[0],
      "lundi"
    );
    assert_eq!(
      FR.weekday_labels(
        WeekdayLabelStyle::Narrow
      ),
      vec!["l", "m", "m", "j", "v", "s", "d"]
    );
  }

  #[test]
  fn month_name_bounds() {
    assert_eq!(EN.month_name(1, false), "January");
    assert_eq!(DE.month_name(3, true), "März");
    assert_eq!(EN.month_name(0, false), "");
    assert_eq!(EN.month_name(13, false), "");
  }
}
