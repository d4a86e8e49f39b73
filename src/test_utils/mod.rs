//! In-memory driver and helpers for exercising connections without a database.

mod scripted;
pub mod test_helpers;

pub use scripted::{CallLog, DriverCall, ScriptedDriver};
pub use test_helpers::{create_test_record, cursor_from};
