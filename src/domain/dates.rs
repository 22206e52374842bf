// Calendar bucketing helpers. Tasks are matched to chart days and calendar
// cells through the `YYYY-MM-DD` key, so every date goes through here.

use time::macros::format_description;
use time::{Date, Duration, Month, Weekday};

pub const WINDOW_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayLabel {
    pub date: Date,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    /// Blank cells before the 1st in a Sunday-first week.
    pub leading_blanks: u8,
    pub days_in_month: u8,
}

pub fn date_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn parse_date_key(raw: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    if raw.len() != 10 {
        return None;
    }
    Date::parse(raw, &format).ok()
}

/// The seven days ending at `reference`, oldest first.
pub fn last_7_days(reference: Date) -> [DayLabel; WINDOW_DAYS] {
    std::array::from_fn(|idx| {
        let back = (WINDOW_DAYS - 1 - idx) as i64;
        let date = reference
            .checked_sub(Duration::days(back))
            .unwrap_or(Date::MIN);
        DayLabel {
            date,
            label: weekday_short(date.weekday()),
        }
    })
}

pub fn month_grid(year: i32, month: Month) -> Option<MonthGrid> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    Some(MonthGrid {
        leading_blanks: first.weekday().number_days_from_sunday(),
        days_in_month: days_in_month(year, month),
    })
}

pub fn days_in_month(year: i32, month: Month) -> u8 {
    match month {
        Month::February if time::util::is_leap_year(year) => 29,
        Month::February => 28,
        Month::April | Month::June | Month::September | Month::November => 30,
        _ => 31,
    }
}

/// Moves `delta` months away from `(year, month)`, rolling the year over.
/// Returns `None` outside the supported year range.
pub fn shift_month(year: i32, month: Month, delta: i32) -> Option<(i32, Month)> {
    let index = i64::from(year) * 12 + i64::from(u8::from(month)) - 1 + i64::from(delta);
    let new_year = i32::try_from(index.div_euclid(12)).ok()?;
    let new_month = Month::try_from(index.rem_euclid(12) as u8 + 1).ok()?;
    Date::from_calendar_date(new_year, new_month, 1).ok()?;
    Some((new_year, new_month))
}

pub fn weekday_short(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

pub fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}
