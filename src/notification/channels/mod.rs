//! Provider backends

pub mod simulated;
pub mod smtp;
pub mod twilio;
pub mod unconfigured;

pub use simulated::SimulatedChannel;
pub use smtp::SmtpChannel;
pub use twilio::TwilioChannel;
pub use unconfigured::UnconfiguredChannel;
