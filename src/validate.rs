use std::{collections::HashMap, fmt, num::IntErrorKind};

use jiff::civil::Date;
use url::{Host, Url};

use crate::models::NewMovie;

const MAX_POSITIVE_INT: i64 = 2_147_483_647;

pub const RELEASE_DATE_ERROR: &str = "Invalid or missing release date.";

const REQUIRED: &str = "This field is required.";
const NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";
const INVALID_NUMBER: &str = "A valid number is required.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const INVALID_URL: &str = "Enter a valid URL.";

/// One untyped CSV row keyed by header. A `None` cell is one the record was too short to
/// carry; a column missing from the header is absent from the map altogether.
pub type Row<'a> = HashMap<&'a str, Option<&'a str>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field problem found in one row, in schema order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

/// Validates one untyped CSV row. Never fails fast: all field errors are collected.
pub fn validate_row(row: &Row<'_>) -> Result<NewMovie, FieldErrors> {
    let mut v = RowValidator { row, errors: Vec::new() };

    let movie = NewMovie {
        title: v.required_text("title", 200),
        original_title: v.optional_text("original_title", Some(200)),
        overview: v.optional_text("overview", None),
        release_date: v.release_date(),
        revenue: v.float("revenue"),
        budget: v.float("budget"),
        runtime: v.positive_int("runtime", false),
        status: v.required_text("status", 50),
        vote_average: v.float("vote_average"),
        vote_count: v.positive_int("vote_count", false),
        original_language: v.required_text("original_language", 50),
        production_company_id: v.positive_int("production_company_id", true),
        genre_id: v.positive_int("genre_id", true),
        languages: v.optional_text("languages", None),
        homepage: v.url("homepage", 200),
    };

    if v.errors.is_empty() { Ok(movie) } else { Err(FieldErrors(v.errors)) }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Cell<'a> {
    Absent,
    Null,
    /// Trimmed, possibly empty.
    Value(&'a str),
}

struct RowValidator<'r, 'a> {
    row: &'r Row<'a>,
    errors: Vec<FieldError>,
}

impl<'a> RowValidator<'_, 'a> {
    fn cell(&self, field: &str) -> Cell<'a> {
        match self.row.get(field).copied() {
            None => Cell::Absent,
            Some(None) => Cell::Null,
            Some(Some(s)) => Cell::Value(s.trim()),
        }
    }

    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    fn required_text(&mut self, field: &'static str, max_len: usize) -> String {
        match self.cell(field) {
            Cell::Absent => self.fail(field, REQUIRED),
            Cell::Null => self.fail(field, NULL),
            Cell::Value("") => self.fail(field, BLANK),
            Cell::Value(s) => return self.check_len(field, s, max_len),
        }
        String::new()
    }

    fn optional_text(&mut self, field: &'static str, max_len: Option<usize>) -> String {
        match (self.cell(field), max_len) {
            (Cell::Absent, _) => String::new(),
            (Cell::Null, _) => {
                self.fail(field, NULL);
                String::new()
            },
            (Cell::Value(s), Some(max)) => self.check_len(field, s, max),
            (Cell::Value(s), None) => s.to_string(),
        }
    }

    fn check_len(&mut self, field: &'static str, s: &str, max_len: usize) -> String {
        if s.chars().count() > max_len {
            self.fail(field, format!("Ensure this field has no more than {max_len} characters."));
        }
        s.to_string()
    }

    fn release_date(&mut self) -> Date {
        let parsed = match self.cell("release_date") {
            Cell::Value(s) => parse_date(s),
            Cell::Absent | Cell::Null => None,
        };
        parsed.unwrap_or_else(|| {
            self.fail("release_date", RELEASE_DATE_ERROR);
            Date::MIN
        })
    }

    fn float(&mut self, field: &'static str) -> f64 {
        match self.cell(field) {
            Cell::Absent => return 0.0,
            Cell::Null => self.fail(field, NULL),
            Cell::Value(raw) => match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => return n,
                _ => self.fail(field, INVALID_NUMBER),
            },
        }
        0.0
    }

    fn positive_int(&mut self, field: &'static str, required: bool) -> i32 {
        let raw = match self.cell(field) {
            Cell::Absent => {
                if required {
                    self.fail(field, REQUIRED);
                }
                return 0;
            },
            Cell::Null => {
                self.fail(field, NULL);
                return 0;
            },
            Cell::Value(raw) => raw,
        };

        match parse_integer(raw) {
            Ok(n) if n < 0 => self.fail(field, "Ensure this value is greater than or equal to 0."),
            Ok(n) if n > MAX_POSITIVE_INT => self.fail(
                field,
                format!("Ensure this value is less than or equal to {MAX_POSITIVE_INT}."),
            ),
            Ok(n) => return n as i32,
            Err(IntErrorKind::PosOverflow) => self.fail(
                field,
                format!("Ensure this value is less than or equal to {MAX_POSITIVE_INT}."),
            ),
            Err(IntErrorKind::NegOverflow) => {
                self.fail(field, "Ensure this value is greater than or equal to 0.")
            },
            Err(_) => self.fail(field, INVALID_INTEGER),
        }
        0
    }

    fn url(&mut self, field: &'static str, max_len: usize) -> String {
        let raw = match self.cell(field) {
            Cell::Absent | Cell::Value("") => return String::new(),
            Cell::Null => {
                self.fail(field, NULL);
                return String::new();
            },
            Cell::Value(raw) => raw,
        };
        let s = self.check_len(field, raw, max_len);
        if !is_valid_url(&s) {
            self.fail(field, INVALID_URL);
        }
        s
    }
}

/// Parses an ISO calendar date with a four-digit year; month and day may be one or two digits.
pub fn parse_date(s: &str) -> Option<Date> {
    let four_digit_year =
        s.split_once('-').is_some_and(|(y, _)| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()));
    if !four_digit_year {
        return None;
    }
    Date::strptime("%Y-%m-%d", s).ok().filter(|d| d.year() >= 1)
}

/// Integer parse that tolerates a trailing `.0…`, so `"120.0"` is `120`.
fn parse_integer(s: &str) -> Result<i64, IntErrorKind> {
    let s = match s.split_once('.') {
        Some((int, frac)) if frac.bytes().all(|b| b == b'0') => int,
        _ => s,
    };
    s.parse::<i64>().map_err(|e| e.kind().clone())
}

fn is_valid_url(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(url) = Url::parse(s) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https" | "ftp" | "ftps") {
        return false;
    }

    match url.host() {
        Some(Host::Domain(domain)) => {
            domain == "localhost"
                || (domain.contains('.')
                    && domain.split('.').all(|label| {
                        !label.is_empty() && !label.starts_with('-') && !label.ends_with('-')
                    }))
        },
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => true,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of<'a>(pairs: &[(&'a str, &'a str)]) -> Row<'a> {
        pairs.iter().map(|&(k, v)| (k, Some(v))).collect()
    }

    fn full_row<'a>() -> Row<'a> {
        row_of(&[
            ("title", "Heat"),
            ("original_title", "Heat"),
            ("overview", "A group of professional bank robbers..."),
            ("release_date", "1995-12-15"),
            ("revenue", "187436818"),
            ("budget", "60000000.0"),
            ("runtime", "170"),
            ("status", "Released"),
            ("vote_average", "7.7"),
            ("vote_count", "1886"),
            ("original_language", "en"),
            ("production_company_id", "508"),
            ("genre_id", "28"),
            ("languages", "['en', 'es']"),
            ("homepage", "https://example.com/heat"),
        ])
    }

    #[test]
    fn accepts_complete_row() {
        let movie = validate_row(&full_row()).unwrap();
        assert_eq!(movie.title, "Heat");
        assert_eq!(movie.release_date, jiff::civil::date(1995, 12, 15));
        assert_eq!(movie.budget, 60_000_000.0);
        assert_eq!(movie.runtime, 170);
        assert_eq!(movie.production_company_id, 508);
    }

    #[test]
    fn absent_optional_columns_take_defaults() {
        let row = row_of(&[
            ("title", "Heat"),
            ("release_date", "1995-12-15"),
            ("status", "Released"),
            ("original_language", "en"),
            ("production_company_id", "1"),
            ("genre_id", "2"),
            ("overview", ""),
            ("homepage", "  "),
        ]);
        let movie = validate_row(&row).unwrap();
        assert_eq!(movie.revenue, 0.0);
        assert_eq!(movie.budget, 0.0);
        assert_eq!(movie.runtime, 0);
        assert_eq!(movie.vote_count, 0);
        assert_eq!(movie.overview, "");
        assert_eq!(movie.homepage, "");
    }

    #[test]
    fn empty_numeric_cells_are_rejected() {
        let mut row = full_row();
        row.insert("runtime", Some(""));
        row.insert("revenue", Some(" "));

        let errors = validate_row(&row).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "revenue: A valid number is required.; runtime: A valid integer is required."
        );
    }

    #[test]
    fn null_cells_are_rejected_even_when_optional() {
        let mut row = full_row();
        row.insert("vote_count", None);
        row.insert("languages", None);
        row.insert("homepage", None);

        let errors = validate_row(&row).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "vote_count: This field may not be null.; \
             languages: This field may not be null.; \
             homepage: This field may not be null."
        );
    }

    #[test]
    fn rejects_missing_or_bad_release_date() {
        for value in ["", "   ", "not-a-date", "1995-02-30", "95-12-15", "0000-01-01"] {
            let mut row = full_row();
            row.insert("release_date", Some(value));
            let errors = validate_row(&row).unwrap_err();
            assert_eq!(errors.get("release_date"), Some(RELEASE_DATE_ERROR), "{value:?}");
        }

        let mut row = full_row();
        row.insert("release_date", None);
        assert_eq!(validate_row(&row).unwrap_err().get("release_date"), Some(RELEASE_DATE_ERROR));

        row.remove("release_date");
        assert_eq!(validate_row(&row).unwrap_err().get("release_date"), Some(RELEASE_DATE_ERROR));
    }

    #[test]
    fn collects_every_error_in_schema_order() {
        let mut row = full_row();
        row.insert("title", Some(""));
        row.insert("runtime", Some("-5"));
        row.insert("vote_average", Some("high"));
        row.remove("genre_id");

        let errors = validate_row(&row).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "title: This field may not be blank.; \
             runtime: Ensure this value is greater than or equal to 0.; \
             vote_average: A valid number is required.; \
             genre_id: This field is required."
        );
    }

    #[test]
    fn integer_parsing_matches_form_semantics() {
        assert_eq!(parse_integer("120.0"), Ok(120));
        assert_eq!(parse_integer("7"), Ok(7));
        assert!(parse_integer("7.5").is_err());
        assert!(parse_integer("seven").is_err());

        let mut row = full_row();
        row.insert("vote_count", Some("99999999999"));
        let errors = validate_row(&row).unwrap_err();
        assert_eq!(
            errors.get("vote_count"),
            Some("Ensure this value is less than or equal to 2147483647.")
        );
    }

    #[test]
    fn text_length_limits() {
        let long = "x".repeat(51);
        let mut row = full_row();
        row.insert("status", Some(long.as_str()));
        let errors = validate_row(&row).unwrap_err();
        assert_eq!(errors.get("status"), Some("Ensure this field has no more than 50 characters."));
    }

    #[test]
    fn parses_short_month_and_day() {
        assert_eq!(parse_date("2001-3-9"), Some(jiff::civil::date(2001, 3, 9)));
        assert_eq!(parse_date("2001-03-09"), Some(jiff::civil::date(2001, 3, 9)));
        assert_eq!(parse_date("2001-03-09-01"), None);
        assert_eq!(parse_date("2001/03/09"), None);
        assert_eq!(parse_date("12001-03-09"), None);
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_url("http://www.example.com/path?q=1"));
        assert!(is_valid_url("https://localhost:8000"));
        assert!(is_valid_url("http://127.0.0.1/"));
        assert!(is_valid_url("http://[::1]:8080/"));
        assert!(!is_valid_url("www.example.com"));
        assert!(!is_valid_url("mailto://someone"));
        assert!(!is_valid_url("http://exa mple.com"));
        assert!(!is_valid_url("http://example.com:abc"));
        assert!(!is_valid_url("http://-bad-.com"));
        assert!(!is_valid_url("http://[zz]"));

        let mut row = full_row();
        row.insert("homepage", Some("not a url"));
        assert_eq!(validate_row(&row).unwrap_err().get("homepage"), Some(INVALID_URL));
    }
}
