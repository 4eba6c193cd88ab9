pub mod activity;
pub mod category;
pub mod holiday;
pub mod settings;
