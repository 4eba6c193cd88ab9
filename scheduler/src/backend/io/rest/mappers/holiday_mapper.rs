use crate::backend::domain::civil_time;
use crate::backend::domain::models::holiday::Holiday;

pub struct HolidayMapper;

impl HolidayMapper {
    pub fn to_dto(holiday: Holiday) -> shared::Holiday {
        shared::Holiday {
            date: civil_time::date_key(holiday.date),
            name: holiday.name,
            local_name: holiday.local_name,
        }
    }

    pub fn to_dto_list(holidays: Vec<Holiday>) -> Vec<shared::Holiday> {
        holidays.into_iter().map(Self::to_dto).collect()
    }
}
