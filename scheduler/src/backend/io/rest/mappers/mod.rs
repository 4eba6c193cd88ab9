pub mod activity_mapper;
pub mod calendar_mapper;
pub mod category_mapper;
pub mod holiday_mapper;

pub use activity_mapper::ActivityMapper;
pub use calendar_mapper::CalendarMapper;
pub use category_mapper::CategoryMapper;
pub use holiday_mapper::HolidayMapper;
