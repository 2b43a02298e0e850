//! # Decode Memory Management
//!
//! Decoders never allocate on the global heap for per-value containers. They
//! take a [`DatumAlloc`], a bump arena owned by one decode stream and reset by
//! the caller at batch boundaries.
//!
//! ```text
//! +--------------------------------------------------+
//! |                  DatumAlloc (Bump)                |
//! |  +---------+ +-----------+ +--------------------+ |
//! |  | strings | | dec digits| | array/tuple slices | |
//! |  +---------+ +-----------+ +--------------------+ |
//! +--------------------------------------------------+
//!          ^ &'a borrows          reset(&mut) ^
//! ```

mod datum_alloc;

pub use datum_alloc::DatumAlloc;
