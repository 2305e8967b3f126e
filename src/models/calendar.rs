//! Date arithmetic behind the calendar views: which activities are
//! happening now, which fall on a day or in a month, and the multi-day
//! range picked when scheduling a new activity.
//!
//! Calendar days are measured in a fixed UTC offset (see
//! [`Config::calendar_offset`](crate::config::Config)); intervals are closed,
//! so an activity ending exactly at midnight still counts for the day that
//! midnight starts.

use async_graphql::{Enum, SimpleObject};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{AgendaError, AgendaResult};
use crate::models::activity::Activity;
use crate::models::{DateScalar, DateTime, TimeScalar};

/// Anything that occupies a closed interval of time.
pub trait Scheduled {
    fn start(&self) -> OffsetDateTime;
    fn end(&self) -> OffsetDateTime;

    fn status_at(&self, now: OffsetDateTime) -> ActivityStatus {
        if self.start() <= now && now <= self.end() {
            ActivityStatus::Current
        } else if self.start() > now {
            ActivityStatus::Upcoming
        } else {
            ActivityStatus::Past
        }
    }

    /// Whether the interval touches `[window_start, window_end)`; a window
    /// without an end runs to the last representable instant.
    fn overlaps(&self, window_start: OffsetDateTime, window_end: Option<OffsetDateTime>) -> bool {
        window_end.map_or(true, |end| self.start() < end) && self.end() >= window_start
    }
}

/// Where an activity sits relative to the present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum ActivityStatus {
    /// Started and not yet over
    Current,
    /// Starts in the future
    Upcoming,
    /// Already over
    Past,
}

#[derive(Clone, Debug, Default, PartialEq, SimpleObject)]
pub struct CategorizedActivities {
    /// Happening right now, earliest start first
    pub current: Vec<Activity>,
    /// Not started yet, earliest start first
    pub upcoming: Vec<Activity>,
    /// Already over, latest start first
    pub past: Vec<Activity>,
}

pub fn categorize_activities(
    activities: Vec<Activity>,
    now: OffsetDateTime,
) -> CategorizedActivities {
    let mut categorized = CategorizedActivities::default();

    for activity in activities {
        match activity.status_at(now) {
            ActivityStatus::Current => categorized.current.push(activity),
            ActivityStatus::Upcoming => categorized.upcoming.push(activity),
            ActivityStatus::Past => categorized.past.push(activity),
        }
    }

    categorized.current.sort_by_key(|activity| activity.start());
    categorized.upcoming.sort_by_key(|activity| activity.start());
    categorized
        .past
        .sort_by(|a, b| b.start().cmp(&a.start()));

    categorized
}

/// The half-open interval covering `date` in the given offset. The last
/// representable day has no end.
pub fn day_bounds(date: Date, offset: UtcOffset) -> (OffsetDateTime, Option<OffsetDateTime>) {
    let start = date.midnight().assume_offset(offset);
    let end = date
        .next_day()
        .map(|next| next.midnight().assume_offset(offset));

    (start, end)
}

/// The half-open interval covering a whole month in the given offset. The
/// last representable month has no end.
pub fn month_bounds(
    year: i32,
    month: Month,
    offset: UtcOffset,
) -> AgendaResult<(OffsetDateTime, Option<OffsetDateTime>)> {
    let first_day = first_of_month(year, month)?;
    let first_of_next = if month == Month::December {
        first_of_month(year + 1, Month::January).ok()
    } else {
        Some(first_of_month(year, month.next())?)
    };

    Ok((
        first_day.midnight().assume_offset(offset),
        first_of_next.map(|first| first.midnight().assume_offset(offset)),
    ))
}

fn first_of_month(year: i32, month: Month) -> AgendaResult<Date> {
    Date::from_calendar_date(year, month, 1)
        .map_err(|err| AgendaError::bad_request(format!("Invalid month {} {}: {}", month, year, err)))
}

pub fn activities_on_date<T: Scheduled + Clone>(
    activities: &[T],
    date: Date,
    offset: UtcOffset,
) -> Vec<T> {
    let (day_start, day_end) = day_bounds(date, offset);

    activities
        .iter()
        .filter(|activity| activity.overlaps(day_start, day_end))
        .cloned()
        .collect()
}

pub fn activities_in_month<T: Scheduled + Clone>(
    activities: &[T],
    year: i32,
    month: Month,
    offset: UtcOffset,
) -> AgendaResult<Vec<T>> {
    let (month_start, month_end) = month_bounds(year, month, offset)?;
    // An activity ending exactly at the month's first midnight still counts,
    // matching `activities_on_date` so the grid and the day view agree.

    Ok(activities
        .iter()
        .filter(|activity| activity.overlaps(month_start, month_end))
        .cloned()
        .collect())
}

#[derive(Clone, Debug, PartialEq, SimpleObject)]
pub struct CalendarDay {
    pub date: DateScalar,
    pub activities: Vec<Activity>,
}

/// A month laid out as a calendar grid.
#[derive(Clone, Debug, PartialEq, SimpleObject)]
pub struct MonthCalendar {
    pub year: i32,
    /// 1 for January through 12 for December
    pub month: u8,
    /// Empty cells before the first day, for weeks starting on Sunday
    pub leading_blank_days: u8,
    pub days: Vec<CalendarDay>,
}

pub fn month_calendar(
    activities: &[Activity],
    year: i32,
    month: Month,
    offset: UtcOffset,
) -> AgendaResult<MonthCalendar> {
    let first_day = first_of_month(year, month)?;
    let in_month = activities_in_month(activities, year, month, offset)?;

    let days = (1..=time::util::days_in_year_month(year, month))
        .map(|day| {
            let date = Date::from_calendar_date(year, month, day).map_err(|err| {
                AgendaError::bad_request(format!("Invalid day {} of {} {}: {}", day, month, year, err))
            })?;

            Ok(CalendarDay {
                date: DateScalar(date),
                activities: activities_on_date(&in_month, date, offset),
            })
        })
        .collect::<AgendaResult<Vec<_>>>()?;

    Ok(MonthCalendar {
        year,
        month: month.into(),
        leading_blank_days: first_day.weekday().number_days_from_sunday(),
        days,
    })
}

#[derive(Clone, Debug, PartialEq, SimpleObject)]
pub struct MonthSummary {
    /// 1 for January through 12 for December
    pub month: u8,
    pub name: String,
    pub activity_count: usize,
    pub activities: Vec<Activity>,
}

/// Every month of a year with the activities overlapping it.
pub fn year_overview(
    activities: &[Activity],
    year: i32,
    offset: UtcOffset,
) -> AgendaResult<Vec<MonthSummary>> {
    (1..=12u8)
        .map(|number| {
            let month = Month::try_from(number)
                .map_err(|err| AgendaError::bad_request(format!("Invalid month: {}", err)))?;
            let month_activities = activities_in_month(activities, year, month, offset)?;

            Ok(MonthSummary {
                month: number,
                name: month.to_string(),
                activity_count: month_activities.len(),
                activities: month_activities,
            })
        })
        .collect()
}

/// The state of a date picker selecting a run of consecutive days.
///
/// The first pick starts a selection; the second completes it (the two
/// picks are swapped if the second comes first); the next pick starts over.
/// There is no cap on the range length: a selection may span any number of
/// days, not only the three a day-by-day form offers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRangeSelection {
    start: Option<Date>,
    end: Option<Date>,
}

impl DateRangeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, date: Date) {
        match (self.start, self.end) {
            (Some(start), None) if date < start => {
                self.start = Some(date);
                self.end = Some(start);
            }
            (Some(_), None) => self.end = Some(date),
            _ => {
                self.start = Some(date);
                self.end = None;
            }
        }
    }

    pub fn first_day(&self) -> Option<Date> {
        self.start
    }

    pub fn last_day(&self) -> Option<Date> {
        self.end.or(self.start)
    }

    pub fn is_complete(&self) -> bool {
        self.end.is_some()
    }

    pub fn day_count(&self) -> usize {
        match (self.first_day(), self.last_day()) {
            (Some(first), Some(last)) => (last - first).whole_days() as usize + 1,
            _ => 0,
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        match (self.first_day(), self.last_day()) {
            (Some(first), Some(last)) => first <= date && date <= last,
            _ => false,
        }
    }

    pub fn dates(&self) -> Vec<Date> {
        let last = match self.last_day() {
            Some(last) => last,
            None => return vec![],
        };

        std::iter::successors(self.first_day(), |date| date.next_day())
            .take_while(|date| *date <= last)
            .collect()
    }

    /// The interval an activity over this selection occupies: from
    /// `start_time` on the first day until `end_time` on the last.
    pub fn span(
        &self,
        start_time: Time,
        end_time: Time,
        offset: UtcOffset,
    ) -> AgendaResult<(OffsetDateTime, OffsetDateTime)> {
        let (first, last) = self
            .first_day()
            .zip(self.last_day())
            .ok_or_else(|| AgendaError::bad_request("No dates have been selected"))?;

        let start = PrimitiveDateTime::new(first, start_time).assume_offset(offset);
        let end = PrimitiveDateTime::new(last, end_time).assume_offset(offset);
        if end < start {
            return Err(AgendaError::bad_request(
                "The end time must not be before the start time",
            ));
        }

        Ok((start, end))
    }
}

/// The interval and days covered by a date selection and a pair of times.
#[derive(Clone, Debug, PartialEq, SimpleObject)]
pub struct ScheduleSpan {
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub days: Vec<DateScalar>,
    pub day_count: usize,
}

/// Replays the date picks in order and spans the resulting selection.
pub fn schedule_span(
    picks: &[Date],
    start_time: Time,
    end_time: Time,
    offset: UtcOffset,
) -> AgendaResult<ScheduleSpan> {
    let mut selection = DateRangeSelection::new();
    for pick in picks {
        selection.select(*pick);
    }
    let (start, end) = selection.span(start_time, end_time, offset)?;

    Ok(ScheduleSpan {
        start_date: DateTime(start),
        end_date: DateTime(end),
        days: selection.dates().into_iter().map(DateScalar).collect(),
        day_count: selection.day_count(),
    })
}

/// A choice offered for start and end times.
#[derive(Clone, Debug, PartialEq, SimpleObject)]
pub struct TimeSlot {
    pub value: TimeScalar,
    /// 12-hour display, e.g. "9:30 AM"
    pub label: String,
}

pub const FIRST_SLOT_HOUR: u8 = 6;
pub const LAST_SLOT_HOUR: u8 = 22;

/// Every half hour from 06:00 through 22:30.
pub fn time_slots() -> Vec<TimeSlot> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .flat_map(|hour| [0u8, 30].map(|minute| (hour, minute)))
        .filter_map(|(hour, minute)| Time::from_hms(hour, minute, 0).ok())
        .map(|time| {
            let display_hour = match time.hour() % 12 {
                0 => 12,
                hour => hour,
            };
            let meridiem = if time.hour() < 12 { "AM" } else { "PM" };

            TimeSlot {
                value: TimeScalar(time),
                label: format!("{}:{:02} {}", display_hour, time.minute(), meridiem),
            }
        })
        .collect()
}
