//! # IO Module
//!
//! Adapter between HTTP clients and the domain services. Currently a JSON
//! REST API served by axum; see [`rest`].

pub mod rest;
