pub mod trigger;

pub use trigger::{RegistrationTrigger, TriggerError, TriggerState};
