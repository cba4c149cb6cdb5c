//! Multi-step listing flow: collects one validated fragment per step and
//! submits the assembled listing.

pub mod client;
pub mod error;
pub mod state;

pub use client::{ApiClient, UploadFile};
pub use error::WizardError;
pub use state::{PropertySubmitter, WizardState};
