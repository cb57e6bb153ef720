pub mod cache;
pub mod captcha;
pub mod db;
pub mod mailer;
pub mod registry;
