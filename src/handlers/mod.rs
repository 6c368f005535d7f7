pub mod auth;
pub mod billing;
pub mod health;
pub mod recaptcha;
pub mod team;
pub mod tools;
