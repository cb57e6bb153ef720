pub mod auth;
pub mod extract;
pub mod health;
pub mod password;
pub mod token;
pub mod user;
pub mod verification;
pub mod ws;
