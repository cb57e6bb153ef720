pub mod login;
pub mod otp;
pub mod password;
pub mod register;
pub mod token;
pub mod user;
pub mod verification;
