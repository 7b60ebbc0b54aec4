//! Request-level facade.
//!
//! [`GenerationService`] wires the leaf components into the two documented
//! control flows:
//!
//! - text: quota check, provider fallback, quota charge, usage rows
//! - speech: cache lookup, provider fallback on miss, cache fill, usage rows
//!
//! Every collaborator is an explicit instance; nothing here is global.

mod request;
mod service;
pub mod prelude;

pub use request::{BatchRequest, SpeechRequest, TextRequest};
pub use service::{GenerationService, MaintenanceReport};
