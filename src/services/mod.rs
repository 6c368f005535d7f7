pub mod appointments;
pub mod auth_gate;
pub mod billing;
pub mod recaptcha;
pub mod team;
