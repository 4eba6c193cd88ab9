//! Calendar domain logic.
//!
//! Projects activities and holidays onto a fixed 42-cell month grid and keeps
//! the month the calendar view is focused on. Rendering is left to the
//! caller; this module only decides which activities land on which day.

use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use shared::{CalendarFocusDate, CurrentDateResponse, MonthlyQuote};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::civil_time;
use super::error::{ScheduleError, ScheduleResult};
use super::models::activity::Activity;
use super::models::holiday::Holiday;

/// Six weeks, Sunday first
pub const GRID_CELLS: usize = 42;

const VISIBLE_ACTIVITIES: usize = 3;
const VISIBLE_ACTIVITIES_ON_HOLIDAY: usize = 2;

const QUOTES: [(&str, &str); 12] = [
    ("New year, new beginnings. Every day is a chance to start fresh and pursue your dreams.", "Unknown"),
    ("The best time to plant a tree was 20 years ago. The second best time is now.", "Chinese Proverb"),
    ("In every walk with nature, one receives far more than they seek.", "John Muir"),
    ("April showers bring May flowers. Every challenge brings growth and new opportunities.", "Traditional Saying"),
    ("Success is not final, failure is not fatal: it is the courage to continue that counts.", "Winston Churchill"),
    ("The future belongs to those who believe in the beauty of their dreams.", "Eleanor Roosevelt"),
    ("Summer afternoon\u{2014}summer afternoon; to me those have always been the two most beautiful words.", "Henry James"),
    ("What lies behind us and what lies before us are tiny matters compared to what lies within us.", "Ralph Waldo Emerson"),
    ("Education is the most powerful weapon which you can use to change the world.", "Nelson Mandela"),
    ("Life starts all over again when it gets crisp in the fall.", "F. Scott Fitzgerald"),
    ("Gratitude turns what we have into enough, and more. It turns denial into acceptance.", "Melody Beattie"),
    ("The best way to make your dreams come true is to wake up and take action.", "Paul Val\u{e9}ry"),
];

/// One day slot of a projected month
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub is_other_month: bool,
    pub is_today: bool,
    pub holiday: Option<Holiday>,
    /// Every activity touching this date, earliest start first
    pub activities: Vec<Activity>,
}

impl CalendarCell {
    /// How many activities a cell shows before collapsing the rest into "+N"
    pub fn visible_limit(&self) -> usize {
        if self.holiday.is_some() {
            VISIBLE_ACTIVITIES_ON_HOLIDAY
        } else {
            VISIBLE_ACTIVITIES
        }
    }

    /// Activities to render and the size of the overflow badge
    pub fn visible_activities(&self) -> (&[Activity], usize) {
        let shown = self.activities.len().min(self.visible_limit());
        (&self.activities[..shown], self.activities.len() - shown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedMonth {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<CalendarCell>,
}

fn first_of_month(year: i32, month: u32) -> ScheduleResult<NaiveDate> {
    if !(1..=12).contains(&month) {
        return Err(ScheduleError::validation(format!(
            "Invalid month: {month}. Must be between 1 and 12"
        )));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ScheduleError::validation(format!("Invalid year: {year}")))
}

/// Sunday on or before the 1st of the month
pub fn grid_start(year: i32, month: u32) -> ScheduleResult<NaiveDate> {
    let first = first_of_month(year, month)?;
    let offset = i64::from(first.weekday().num_days_from_sunday());
    first
        .checked_sub_signed(Duration::days(offset))
        .ok_or_else(|| ScheduleError::validation(format!("Invalid year: {year}")))
}

/// Lay `activities` and `holidays` out on the 42-cell grid of a month.
///
/// `holidays` may cover any years; only exact date matches are used.
pub fn project(
    year: i32,
    month: u32,
    activities: &[Activity],
    holidays: &[Holiday],
    today: NaiveDate,
) -> ScheduleResult<ProjectedMonth> {
    let start = grid_start(year, month)?;
    let holidays_by_date: HashMap<NaiveDate, &Holiday> =
        holidays.iter().map(|holiday| (holiday.date, holiday)).collect();

    let mut ordered: Vec<&Activity> = activities.iter().collect();
    ordered.sort_by_key(|activity| activity.datetime);

    let cells: Vec<CalendarCell> = start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarCell {
            date,
            is_other_month: date.month() != month || date.year() != year,
            is_today: date == today,
            holiday: holidays_by_date.get(&date).map(|holiday| (*holiday).clone()),
            activities: ordered
                .iter()
                .filter(|activity| activity.touches(date))
                .map(|activity| (*activity).clone())
                .collect(),
        })
        .collect();

    debug!(
        "Projected {}/{} from {} with {} activities",
        month,
        year,
        start,
        activities.len()
    );
    Ok(ProjectedMonth { year, month, cells })
}

/// Calendar navigation and month metadata
#[derive(Clone)]
pub struct CalendarService {
    /// Month the calendar view is showing; kept in memory only
    current_focus_date: Arc<Mutex<CalendarFocusDate>>,
}

impl CalendarService {
    /// Start focused on the current civil month
    pub fn new() -> Self {
        let today = civil_time::today();
        Self::focused_on(today.month(), today.year())
    }

    pub fn focused_on(month: u32, year: i32) -> Self {
        Self {
            current_focus_date: Arc::new(Mutex::new(CalendarFocusDate { month, year })),
        }
    }

    pub fn project_month(
        &self,
        year: i32,
        month: u32,
        activities: &[Activity],
        holidays: &[Holiday],
    ) -> ScheduleResult<ProjectedMonth> {
        project(year, month, activities, holidays, civil_time::today())
    }

    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January", 2 => "February", 3 => "March", 4 => "April",
            5 => "May", 6 => "June", 7 => "July", 8 => "August",
            9 => "September", 10 => "October", 11 => "November", 12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Quote shown under the month header; out-of-range months get January's
    pub fn monthly_quote(&self, month: u32) -> MonthlyQuote {
        let index = month
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|i| *i < QUOTES.len())
            .unwrap_or(0);
        let (text, author) = QUOTES[index];
        MonthlyQuote {
            text: text.to_string(),
            author: author.to_string(),
        }
    }

    pub fn previous_month(&self, current_month: u32, current_year: i32) -> (u32, i32) {
        if current_month <= 1 {
            (12, current_year - 1)
        } else {
            (current_month - 1, current_year)
        }
    }

    pub fn next_month(&self, current_month: u32, current_year: i32) -> (u32, i32) {
        if current_month >= 12 {
            (1, current_year + 1)
        } else {
            (current_month + 1, current_year)
        }
    }

    /// Today on the civil calendar
    pub fn get_current_date(&self) -> CurrentDateResponse {
        let today = civil_time::today();
        CurrentDateResponse {
            year: today.year(),
            month: today.month(),
            day: today.day(),
            formatted_date: format!("{} {}, {}", self.month_name(today.month()), today.day(), today.year()),
            iso_date: civil_time::date_key(today),
        }
    }

    pub fn get_focus_date(&self) -> ScheduleResult<CalendarFocusDate> {
        self.current_focus_date
            .lock()
            .map(|focus| focus.clone())
            .map_err(|_| ScheduleError::Storage(anyhow::anyhow!("Calendar focus lock poisoned")))
    }

    pub fn set_focus_date(&self, month: u32, year: i32) -> ScheduleResult<CalendarFocusDate> {
        first_of_month(year, month)?;
        let focus = CalendarFocusDate { month, year };
        let mut current = self
            .current_focus_date
            .lock()
            .map_err(|_| ScheduleError::Storage(anyhow::anyhow!("Calendar focus lock poisoned")))?;
        *current = focus.clone();
        Ok(focus)
    }

    pub fn navigate_previous_month(&self) -> ScheduleResult<CalendarFocusDate> {
        let current = self.get_focus_date()?;
        let (month, year) = self.previous_month(current.month, current.year);
        self.set_focus_date(month, year)
    }

    pub fn navigate_next_month(&self) -> ScheduleResult<CalendarFocusDate> {
        let current = self.get_focus_date()?;
        let (month, year) = self.next_month(current.month, current.year);
        self.set_focus_date(month, year)
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}
