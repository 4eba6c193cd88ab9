//! # Storage Layer
//!
//! Persistence and remote collaborators behind the traits in [`traits`].
//! `json` keeps local state in the data directory; `remote` talks HTTP.

pub mod json;
pub mod remote;
pub mod traits;

pub use traits::*;
