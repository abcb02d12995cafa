//! Service-time evaluation.
//!
//! Decides whether a segment or route description is operating at a given
//! wall-clock instant, from its published first/last bus times.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::domain::{DayWindow, RouteDescription, Segment, TimeWindow};

/// Anything carrying a published operating window.
pub trait Timetabled {
    fn window(&self) -> &TimeWindow;
}

impl<T: Timetabled> Timetabled for &T {
    fn window(&self) -> &TimeWindow {
        (**self).window()
    }
}

impl Timetabled for Segment {
    fn window(&self) -> &TimeWindow {
        &self.window
    }
}

impl Timetabled for RouteDescription {
    fn window(&self) -> &TimeWindow {
        &self.window
    }
}

/// The day-type window that applies on `date`.
pub fn day_window(window: &TimeWindow, date: NaiveDate) -> &DayWindow {
    match date.weekday() {
        Weekday::Sun => &window.sunday,
        Weekday::Sat => &window.saturday,
        _ => &window.weekday,
    }
}

/// Returns true if a service with this window is operating at `at`.
///
/// The window for `at`'s day type is anchored on `at`'s date: it opens at
/// the first bus minute and closes at the end of the last bus minute, rolled
/// to the next day if the last bus is earlier than the first. Both ends are
/// exclusive. The previous day's window is also consulted when it runs past
/// midnight, so that the early-morning tail of an overnight service counts.
/// Missing or malformed times mean not operating.
pub fn is_in_service(window: &TimeWindow, at: NaiveDateTime) -> bool {
    let today = at.date();
    if active_from(day_window(window, today), today, at) {
        return true;
    }

    let Some(yesterday) = today.pred_opt() else {
        return false;
    };
    let previous = day_window(window, yesterday);
    previous.crosses_midnight() && active_from(previous, yesterday, at)
}

/// Keep only the items operating at `at`, preserving order.
pub fn in_service<T: Timetabled>(items: impl IntoIterator<Item = T>, at: NaiveDateTime) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| is_in_service(item.window(), at))
        .collect()
}

/// Whether `at` falls strictly inside `day` anchored on `anchor`.
fn active_from(day: &DayWindow, anchor: NaiveDate, at: NaiveDateTime) -> bool {
    let Some((first, last)) = day.bounds() else {
        return false;
    };

    let start = anchor.and_time(first.time());
    let Some(mut end) = anchor.and_hms_milli_opt(last.hour(), last.minute(), 59, 999) else {
        return false;
    };
    if end < start {
        end += Duration::days(1);
    }

    start < at && at < end
}
