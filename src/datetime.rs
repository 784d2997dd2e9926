use jiff::{Zoned, civil, tz::TimeZone};

use crate::error::ParseError;

/// Resolves the year-less dates of a programme page ("Mit 24.12. 20:15").
///
/// The sites print no year, so a wrap from December back to January within
/// one pass is taken as a year boundary crossing. Entries must be visited in
/// non-decreasing chronological order; out-of-order input mis-assigns years
/// without any error.
#[derive(Debug)]
pub struct DateSequence {
    tz: TimeZone,
    last_month: i8,
    year_offset: i16,
}

impl DateSequence {
    pub fn new(tz: TimeZone) -> Self {
        Self { tz, last_month: 0, year_offset: 0 }
    }

    /// Parses `<day abbr> <day>.<month>. <hour>:<minute>` into a zoned
    /// timestamp in the pass's time zone.
    pub fn parse(&mut self, input: &str) -> Result<Zoned, ParseError> {
        let (day, month, hour, minute) =
            split_tokens(input).ok_or_else(|| ParseError::date(input))?;

        if self.last_month > month {
            self.year_offset += 1;
        }
        self.last_month = month;

        let year = Zoned::now().with_time_zone(self.tz.clone()).year() + self.year_offset;
        civil::DateTime::new(year, month, day, hour, minute, 0, 0)
            .and_then(|dt| dt.to_zoned(self.tz.clone()))
            .map_err(|_| ParseError::date(input))
    }
}

fn split_tokens(input: &str) -> Option<(i8, i8, i8, i8)> {
    let mut parts = input.split_whitespace();
    let weekday = parts.next()?;
    let date_part = parts.next()?;
    let time_part = parts.next()?;
    if parts.next().is_some() || weekday.chars().count() > 3 {
        return None;
    }

    let (day, month) = date_part.strip_suffix('.')?.split_once('.')?;
    let (hour, minute) = time_part.split_once(':')?;

    Some((day.parse().ok()?, month.parse().ok()?, hour.parse().ok()?, minute.parse().ok()?))
}

/// Extracts the minute count from a runtime string such as "123 min.".
pub fn parse_duration(input: &str) -> Result<i32, ParseError> {
    let (minutes, unit) = input
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| ParseError::duration(input))?;
    if unit.trim() != "min." {
        return Err(ParseError::duration(input));
    }
    let minutes: i32 = minutes.parse().map_err(|_| ParseError::duration(input))?;
    if minutes < 0 {
        return Err(ParseError::duration(input));
    }
    Ok(minutes)
}
