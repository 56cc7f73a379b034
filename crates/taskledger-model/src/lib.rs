//! Domain model for task lifecycle records.
//!
//! Types here are shared by the event entry point and the backfill driver.
//! Nothing in this crate performs I/O.

mod domain;
pub use domain::*;

mod error;
pub use error::{EventError, ModelError};

pub mod event;
pub use event::TaskStateChangeEvent;
