use crate::types::errors::DateError;
use chrono::{Days, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an ISO date or one of the shorthands `.` (today), `.y` (yesterday)
/// and `.t` (tomorrow), relative to `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let input = input.trim();

    let date = match input {
        "." => Some(today),
        ".y" => today.checked_sub_days(Days::new(1)),
        ".t" => today.checked_add_days(Days::new(1)),
        _ => {
            return NaiveDate::parse_from_str(input, DATE_FORMAT)
                .map_err(|_| DateError::InvalidFormat { input: input.to_string() });
        }
    };

    date.ok_or_else(|| DateError::OutOfRange { input: input.to_string() })
}
