//! Shared utilities for the circulation workspace.
//!
//! Kept deliberately small: timestamp helpers, snowflake-style IDs and
//! the human-facing reference code formats used across the service.

pub mod util;

pub use util::{loan_reference, member_number, now_millis, reservation_reference, snowflake_id};
