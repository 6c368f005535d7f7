pub mod appointment;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus};
pub use user::{SubscriptionStatus, User, UserRole};
