//! Email delivery for frostwatch.
//!
//! Builds the plain-text notification and sends it over SMTP. Delivery
//! never fails the run: without credentials, or when the server rejects
//! the message, the alerts are printed to stdout instead.

pub mod compose;
pub mod error;
pub mod mailer;

pub use compose::Notification;
pub use error::NotifyError;
pub use mailer::{Credentials, Delivery, Mailer};
