use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

/// Calendar dates travel as `YYYY-MM-DD` text (birth dates and event dates).
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid calendar date {input:?}, expected YYYY-MM-DD")]
pub struct DateError {
    pub input: String,
}

pub fn parse_date(input: &str) -> Result<Date, DateError> {
    Date::parse(input.trim(), ISO_DATE).map_err(|_| DateError {
        input: input.to_string(),
    })
}

pub fn format_date(date: Date) -> String {
    // The ISO format only fails for years outside 0..=9999, which parse_date never yields.
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}

/// Whole years between `birth` and `today`; the current year only counts
/// once the birthday has been reached.
pub fn age_on(birth: Date, today: Date) -> i32 {
    let mut years = today.year() - birth.year();
    let birthday_pending =
        (u8::from(today.month()), today.day()) < (u8::from(birth.month()), birth.day());
    if birthday_pending {
        years -= 1;
    }
    years
}

/// Age for a stored birth date, `None` when the stored text is not a date.
pub fn age_from_text(birth: &str, today: Date) -> Option<i32> {
    parse_date(birth).ok().map(|b| age_on(b, today))
}

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(UtcOffset::UTC)
}

pub fn today_utc() -> Date {
    now_utc().date()
}

/// Pickup state of an attendance row. Rows may move back and forth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Pending,
    CheckedOut,
}

impl From<bool> for CheckoutState {
    fn from(checked_out: bool) -> Self {
        if checked_out {
            CheckoutState::CheckedOut
        } else {
            CheckoutState::Pending
        }
    }
}
