//! Service plumbing shared by Skypipe HTTP services.

pub mod health;
pub mod middleware;
pub mod response;
pub mod serde;
pub mod tracing;
