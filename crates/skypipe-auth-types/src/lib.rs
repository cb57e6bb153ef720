//! Auth types shared across Skypipe services.
//!
//! Provides `Authorization: Bearer` parsing and the refresh-header extractor.

pub mod bearer;
pub mod refresh;
