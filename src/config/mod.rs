//! # Codec Configuration
//!
//! All tunable and format-defining constants live in [`constants`] so that
//! interdependent values are co-located and checked at compile time.
//!
//! ```ignore
//! use datum_codec::config::{DEFAULT_ARENA_CAPACITY, NO_COLUMN_ID};
//! ```

pub mod constants;
pub use constants::*;
