//! Display formatting
//!
//! Every value that reaches the presentation layer is formatted here, so the
//! rounding and locale decisions are made once, at construction time.

use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};

use crate::models::Timestamp;

/// Number and currency conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "pt-BR")]
    PtBr,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::PtBr => "pt-BR",
        }
    }

    fn currency_prefix(&self) -> &'static str {
        match self {
            Self::EnUs => "$",
            Self::PtBr => "R$ ",
        }
    }

    fn separators(&self) -> (char, char) {
        // (thousands, decimal)
        match self {
            Self::EnUs => (',', '.'),
            Self::PtBr => ('.', ','),
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Self::EnUs),
            "pt-br" | "pt" => Ok(Self::PtBr),
            _ => Err(format!("Unknown locale: {} (valid: en-US, pt-BR)", s)),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::EnUs
    }
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A rounded distance in time
#[derive(Debug, Clone, Copy)]
enum Span {
    Now,
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Weeks(i64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formatter {
    locale: Locale,
}

impl Formatter {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// `-$1,234.56` / `-R$ 1.234,56`
    pub fn currency(&self, amount: f64) -> String {
        let amount = if amount.is_finite() { amount } else { 0.0 };
        let cents = (amount.abs() * 100.0).round() as u64;
        let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
        let (thousands, decimal) = self.locale.separators();
        format!(
            "{}{}{}{}{:02}",
            sign,
            self.locale.currency_prefix(),
            group_digits(cents / 100, thousands),
            decimal,
            cents % 100
        )
    }

    /// Integer count with thousands grouping
    pub fn count(&self, n: usize) -> String {
        group_digits(n as u64, self.locale.separators().0)
    }

    /// Whole-number percentage
    pub fn percent(&self, value: f64) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        format!("{:.0}%", value)
    }

    /// Relative time of `at` as seen from `now`, in the formatter's locale
    pub fn relative_time(&self, at: Option<Timestamp>, now: Timestamp) -> String {
        let Some(at) = at else {
            return match self.locale {
                Locale::EnUs => "never",
                Locale::PtBr => "nunca",
            }
            .to_string();
        };

        let delta = now - at;
        let future = delta < Duration::zero();
        let delta = if future { -delta } else { delta };

        let minutes = delta.num_minutes();
        let hours = delta.num_hours();
        let days = delta.num_days();

        let span = if minutes < 1 {
            Span::Now
        } else if minutes < 60 {
            Span::Minutes(minutes)
        } else if hours < 24 {
            Span::Hours(hours)
        } else if days < 14 {
            Span::Days(days)
        } else if days < 60 && !future {
            Span::Weeks(days / 7)
        } else {
            return self.date(at);
        };
        self.phrase(span, future)
    }

    fn phrase(&self, span: Span, future: bool) -> String {
        let amount = match (self.locale, span) {
            (Locale::EnUs, Span::Now) => return "just now".to_string(),
            (Locale::PtBr, Span::Now) => return "agora mesmo".to_string(),
            (Locale::EnUs, Span::Days(1)) => {
                return if future { "tomorrow" } else { "yesterday" }.to_string()
            }
            (Locale::PtBr, Span::Days(1)) => {
                return if future { "amanhã" } else { "ontem" }.to_string()
            }
            (_, Span::Minutes(n)) => format!("{} min", n),
            (_, Span::Hours(n)) => format!("{} h", n),
            (Locale::EnUs, Span::Days(n)) => format!("{} days", n),
            (Locale::PtBr, Span::Days(n)) => format!("{} dias", n),
            (Locale::EnUs, Span::Weeks(n)) => format!("{} weeks", n),
            (Locale::PtBr, Span::Weeks(n)) => format!("{} semanas", n),
        };
        match (self.locale, future) {
            (Locale::EnUs, false) => format!("{} ago", amount),
            (Locale::EnUs, true) => format!("in {}", amount),
            (Locale::PtBr, false) => format!("há {}", amount),
            (Locale::PtBr, true) => format!("em {}", amount),
        }
    }

    /// `Oct 16, 2026` / `16/10/2026`
    pub fn date(&self, at: Timestamp) -> String {
        match self.locale {
            Locale::EnUs => format!(
                "{} {}, {}",
                MONTHS[at.month0() as usize],
                at.day(),
                at.year()
            ),
            Locale::PtBr => at.format("%d/%m/%Y").to_string(),
        }
    }

    /// Label for a day bucket
    pub fn day_label(&self, at: Timestamp) -> String {
        match self.locale {
            Locale::EnUs => format!("{} {}", MONTHS[at.month0() as usize], at.day()),
            Locale::PtBr => at.format("%d/%m").to_string(),
        }
    }

    /// Label for a week bucket
    pub fn week_label(&self, start: Timestamp) -> String {
        match self.locale {
            Locale::EnUs => format!("Week of {}", self.day_label(start)),
            Locale::PtBr => format!("Semana de {}", self.day_label(start)),
        }
    }
}

fn group_digits(mut n: u64, separator: char) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while n > 0 {
        groups.push(n % 1000);
        n /= 1000;
    }
    let mut out = groups.pop().map(|g| g.to_string()).unwrap_or_default();
    while let Some(group) = groups.pop() {
        out.push(separator);
        out.push_str(&format!("{:03}", group));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_currency_en_us() {
        let fmt = Formatter::new(Locale::EnUs);
        assert_eq!(fmt.currency(1234.5), "$1,234.50");
        assert_eq!(fmt.currency(-20.0), "-$20.00");
        assert_eq!(fmt.currency(0.0), "$0.00");
        assert_eq!(fmt.currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(fmt.currency(f64::NAN), "$0.00");
    }

    #[test]
    fn test_currency_pt_br() {
        let fmt = Formatter::new(Locale::PtBr);
        assert_eq!(fmt.currency(1234.56), "R$ 1.234,56");
        assert_eq!(fmt.currency(-0.004), "R$ 0,00");
    }

    #[test]
    fn test_relative_time() {
        let fmt = Formatter::default();
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

        assert_eq!(fmt.relative_time(Some(now), now), "just now");
        assert_eq!(
            fmt.relative_time(Some(now - Duration::minutes(5)), now),
            "5 min ago"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::hours(3)), now),
            "3 h ago"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::days(1)), now),
            "yesterday"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::days(21)), now),
            "3 weeks ago"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::days(90)), now),
            "Jul 18, 2026"
        );
        assert_eq!(
            fmt.relative_time(Some(now + Duration::hours(2)), now),
            "in 2 h"
        );
        assert_eq!(
            fmt.relative_time(Some(now + Duration::hours(30)), now),
            "tomorrow"
        );
        assert_eq!(fmt.relative_time(None, now), "never");
    }

    #[test]
    fn test_relative_time_pt_br() {
        let fmt = Formatter::new(Locale::PtBr);
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

        assert_eq!(fmt.relative_time(Some(now), now), "agora mesmo");
        assert_eq!(
            fmt.relative_time(Some(now - Duration::minutes(5)), now),
            "há 5 min"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::days(1)), now),
            "ontem"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::days(3)), now),
            "há 3 dias"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::days(21)), now),
            "há 3 semanas"
        );
        assert_eq!(
            fmt.relative_time(Some(now + Duration::days(4)), now),
            "em 4 dias"
        );
        assert_eq!(
            fmt.relative_time(Some(now - Duration::days(90)), now),
            "18/07/2026"
        );
        assert_eq!(fmt.relative_time(None, now), "nunca");
    }

    #[test]
    fn test_bucket_labels() {
        let at = Utc.with_ymd_and_hms(2026, 10, 12, 0, 0, 0).unwrap();
        assert_eq!(Formatter::new(Locale::EnUs).week_label(at), "Week of Oct 12");
        assert_eq!(Formatter::new(Locale::PtBr).day_label(at), "12/10");
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("pt_BR".parse::<Locale>().unwrap(), Locale::PtBr);
        assert!("fr-FR".parse::<Locale>().is_err());
    }
}
