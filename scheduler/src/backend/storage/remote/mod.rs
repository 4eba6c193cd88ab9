//! HTTP collaborators: the public holiday API and the gist-backed sync store.

pub mod gist_document_store;
pub mod nager_holiday_source;

pub use gist_document_store::{GistDocumentStore, DEFAULT_GIST_API_BASE};
pub use nager_holiday_source::{NagerHolidaySource, DEFAULT_HOLIDAY_API_BASE};
