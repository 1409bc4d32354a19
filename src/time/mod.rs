//! Time-of-day windows and the overlap predicate.
//!
//! Route operating windows are expressed in minutes since midnight.
//! A window whose end precedes its start wraps past midnight into the
//! next day; the overlap test here is wrap-aware, which a plain
//! `max(start) < min(end)` comparison is not.

/// Minutes in one day. Valid times of day are in `[0, MINUTES_PER_DAY)`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Parses a 24-hour `HH:MM` string into minutes since midnight.
///
/// Returns `None` for anything that is not a well-formed time of day
/// (missing colon, non-numeric fields, hours ≥ 24, minutes ≥ 60).
///
/// # Examples
///
/// ```
/// use u_rostering::time::parse_time_of_day;
///
/// assert_eq!(parse_time_of_day("05:00"), Some(300));
/// assert_eq!(parse_time_of_day("23:59"), Some(1439));
/// assert_eq!(parse_time_of_day("24:00"), None);
/// assert_eq!(parse_time_of_day("noonish"), None);
/// ```
pub fn parse_time_of_day(s: &str) -> Option<u16> {
    let (hours, minutes) = s.split_once(':')?;
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// An operating window within one day, in minutes since midnight.
///
/// `end < start` means the window wraps past midnight (e.g. a route
/// departing at 23:00 and arriving at 00:30 the next day).
///
/// # Examples
///
/// ```
/// use u_rostering::time::TimeWindow;
///
/// let overnight = TimeWindow::parse("23:00", "00:30").unwrap();
/// assert!(overnight.wraps());
///
/// let morning = TimeWindow::parse("05:00", "09:15").unwrap();
/// assert!(!morning.wraps());
/// assert!(!overnight.overlaps(&morning));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    /// Start of the window, minutes since midnight.
    pub start: u16,
    /// End of the window, minutes since midnight.
    pub end: u16,
}

impl TimeWindow {
    /// Creates a window from start/end minutes.
    ///
    /// Both values must be in `[0, MINUTES_PER_DAY)`.
    pub fn new(start: u16, end: u16) -> Self {
        debug_assert!(start < MINUTES_PER_DAY && end < MINUTES_PER_DAY);
        Self { start, end }
    }

    /// Parses a window from `HH:MM` start/end strings.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        })
    }

    /// Whether this window crosses midnight.
    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    /// Whether this window shares any instant with `other`.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }
}

/// Tests whether two time-of-day intervals share any instant.
///
/// Intervals are half-open: touching endpoints (`end1 == start2`) do
/// not overlap. An interval with `end < start` wraps past midnight.
/// The rules, in order:
///
/// 1. Both wrap — they necessarily meet at the midnight boundary.
/// 2. Exactly one wraps — the non-wrapping interval must start before
///    the wrapping one ends, or the wrapping one must start before the
///    non-wrapping one ends.
/// 3. Neither wraps — disjoint iff one starts at or after the other ends.
///
/// The predicate is symmetric in its two intervals.
pub fn overlaps(start1: u16, end1: u16, start2: u16, end2: u16) -> bool {
    let wraps1 = end1 < start1;
    let wraps2 = end2 < start2;

    if wraps1 && wraps2 {
        return true;
    }
    if wraps1 {
        return start1 < end2 || start2 < end1;
    }
    if wraps2 {
        return start2 < end1 || start1 < end2;
    }
    start1 < end2 && start2 < end1
}
