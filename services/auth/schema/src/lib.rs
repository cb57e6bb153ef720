//! sea-orm entities for the auth service database.

pub mod access_tokens;
pub mod plans;
pub mod refresh_tokens;
pub mod user_profiles;
pub mod users;
pub mod verification_codes;
