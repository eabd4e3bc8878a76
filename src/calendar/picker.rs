//! Month grid rendering and button payload interpretation.

use chrono::{Datelike, NaiveDate};

use super::grid::{GridButton, InlineGrid};

/// Prefix shared by every calendar button payload.
const PAYLOAD_PREFIX: &str = "cal";

/// Label used for cells that do not map to a day.
const EMPTY_LABEL: &str = " ";

const MONTH_NAMES: [&str; 12] = [
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
    "December",
];

const WEEKDAY_LABELS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// The (year, month) a calendar grid is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    year: i32,
    month: u32,
}

impl CalendarCursor {
    /// Creates a cursor. Out-of-range months are clamped to 1..=12.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
        }
    }

    /// Cursor for the month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Year displayed by this cursor.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month displayed by this cursor (1..=12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Moves to the following month, rolling the year over after December.
    #[must_use]
    pub fn next_month(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Moves to the preceding month, rolling the year back before January.
    #[must_use]
    pub fn prev_month(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Number of days in the displayed month (handles leap February).
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        let next = self.next_month();
        let next_first =
            NaiveDate::from_ymd_opt(next.year, next.month, 1).unwrap_or(first);
        u32::try_from(next_first.signed_duration_since(first).num_days()).unwrap_or(31)
    }

    /// Resolves a day number into a date within the displayed month.
    #[must_use]
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

/// What a calendar button press means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Redraw the grid for a different month.
    Navigate(CalendarCursor),

    /// A concrete day was chosen.
    Day(NaiveDate),

    /// The press carries no meaning (header, weekday label, padding cell).
    Ignore,
}

/// Renders the month grid for `cursor`.
///
/// Layout: a header button with the month and year, a weekday row, one
/// row per week with blank cells padding the month boundaries, and a
/// navigation row. The same cursor always produces an identical grid.
#[must_use]
pub fn render(cursor: CalendarCursor) -> InlineGrid {
    let mut grid: InlineGrid = Vec::with_capacity(8);

    grid.push(vec![GridButton::new(
        format!("{} {}", month_name(cursor.month()), cursor.year()),
        ignore_payload(),
    )]);

    grid.push(
        WEEKDAY_LABELS
            .iter()
            .map(|label| GridButton::new(*label, ignore_payload()))
            .collect(),
    );

    let leading_blanks = cursor.first_day().weekday().num_days_from_monday();
    let mut row: Vec<GridButton> = Vec::with_capacity(7);
    for _ in 0..leading_blanks {
        row.push(empty_cell());
    }

    for day in 1..=cursor.days_in_month() {
        row.push(GridButton::new(day.to_string(), day_payload(cursor, day)));
        if row.len() == 7 {
            grid.push(std::mem::take(&mut row));
        }
    }

    if !row.is_empty() {
        while row.len() < 7 {
            row.push(empty_cell());
        }
        grid.push(row);
    }

    grid.push(vec![
        GridButton::new("<", nav_payload("prev", cursor)),
        GridButton::new(EMPTY_LABEL, ignore_payload()),
        GridButton::new(">", nav_payload("next", cursor)),
    ]);

    grid
}

/// Decides what a button payload means.
///
/// Payloads carry the cursor they were rendered for, so a press on a
/// superseded grid still resolves against the month it displayed.
#[must_use]
pub fn interpret(payload: &str) -> Selection {
    let mut parts = payload.split(':');
    if parts.next() != Some(PAYLOAD_PREFIX) {
        return Selection::Ignore;
    }

    match parts.next() {
        Some("day") => {
            let Some(cursor) = parse_cursor(&mut parts) else {
                return Selection::Ignore;
            };
            parts
                .next()
                .and_then(|raw| raw.parse().ok())
                .and_then(|day| cursor.day(day))
                .map_or(Selection::Ignore, Selection::Day)
        }
        Some("prev") => parse_cursor(&mut parts)
            .map_or(Selection::Ignore, |cursor| {
                Selection::Navigate(cursor.prev_month())
            }),
        Some("next") => parse_cursor(&mut parts)
            .map_or(Selection::Ignore, |cursor| {
                Selection::Navigate(cursor.next_month())
            }),
        _ => Selection::Ignore,
    }
}

fn parse_cursor<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<CalendarCursor> {
    let year = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(CalendarCursor::new(year, month))
}

fn day_payload(cursor: CalendarCursor, day: u32) -> String {
    format!(
        "{PAYLOAD_PREFIX}:day:{}:{}:{}",
        cursor.year(),
        cursor.month(),
        day
    )
}

fn nav_payload(direction: &str, cursor: CalendarCursor) -> String {
    format!(
        "{PAYLOAD_PREFIX}:{direction}:{}:{}",
        cursor.year(),
        cursor.month()
    )
}

fn ignore_payload() -> String {
    format!("{PAYLOAD_PREFIX}:ignore")
}

fn empty_cell() -> GridButton {
    GridButton::new(EMPTY_LABEL, ignore_payload())
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}
