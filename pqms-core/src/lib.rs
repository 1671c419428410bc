//! Derived statuses and calculations of the quality management system, and
//! the store through which its records change.

pub mod backup;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod forms;
pub mod ipqc;
pub mod logger;
pub mod progress;
pub mod reconciliation;
pub mod sample;
pub mod status;
pub mod store;

pub use error::{PqmsError, ValidationError};
pub use store::{builder::StoreBuilder, reducer::reduce, state::AppState, Store};
