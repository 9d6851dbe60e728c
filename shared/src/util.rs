//! Small helpers shared by the web application and its tests

use chrono::NaiveDate;

/// Date layout used by every form field and URL parameter (`YYYY-MM-DD`)
pub const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Parse a calendar date in [`DATE_LAYOUT`]
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_LAYOUT)
}

/// Format a calendar date in [`DATE_LAYOUT`]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_LAYOUT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2020-01-02").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(parse_date(" 2020-01-02 ").unwrap(), date);
    }

    #[test]
    fn test_parse_date_rejects_other_layouts() {
        assert!(parse_date("invalid").is_err());
        assert!(parse_date("01/02/2020").is_err());
        assert!(parse_date("2020-02-30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date(date), "2026-03-07");
    }
}
