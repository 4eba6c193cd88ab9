//! Personal activity scheduler: activities with recurrence, a month calendar
//! with public holidays, and whole-data-set sync to a cloud document.

pub mod backend;
pub mod config;
