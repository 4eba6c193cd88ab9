use shared::CalendarMonth;

use super::{ActivityMapper, HolidayMapper};
use crate::backend::domain::calendar::{CalendarCell, ProjectedMonth};
use crate::backend::domain::civil_time;
use crate::backend::domain::models::category::Category;
use crate::backend::domain::CalendarService;

pub struct CalendarMapper;

impl CalendarMapper {
    pub fn to_dto(month: ProjectedMonth, calendar: &CalendarService, categories: &[Category]) -> CalendarMonth {
        CalendarMonth {
            year: month.year,
            month: month.month,
            month_name: calendar.month_name(month.month).to_string(),
            quote: calendar.monthly_quote(month.month),
            cells: month
                .cells
                .into_iter()
                .map(|cell| Self::cell_to_dto(cell, categories))
                .collect(),
        }
    }

    fn cell_to_dto(cell: CalendarCell, categories: &[Category]) -> shared::CalendarCell {
        let visible_limit = cell.visible_limit();
        let (_, overflow_count) = cell.visible_activities();
        shared::CalendarCell {
            date: civil_time::date_key(cell.date),
            day: chrono::Datelike::day(&cell.date),
            is_other_month: cell.is_other_month,
            is_today: cell.is_today,
            holiday: cell.holiday.map(HolidayMapper::to_dto),
            activities: ActivityMapper::to_view_list(cell.activities, categories),
            visible_limit,
            overflow_count,
        }
    }
}
