//! # Codec Configuration Constants
//!
//! Constants are grouped by the component that consumes them. Values that
//! depend on each other are checked with compile-time assertions so that a
//! change to one cannot silently invalidate another.
//!
//! ```text
//! DEFAULT_ARENA_CAPACITY (4 KB)
//!       │
//!       └─> MAX_ARENA_RETAINED (must be >=)
//!             reset() keeps the first chunk only while it stays under this cap
//!
//! MAX_VALUE_PAYLOAD_LEN (u32::MAX)
//!       │
//!       └─> every length-prefixed payload is checked against it on decode
//!
//! VALUE_CHECKSUM_SIZE (4) + VALUE_TAG_SIZE (1)
//!       │
//!       └─> MARSHALLED_HEADER_SIZE
//! ```

// ============================================================================
// DATUM ALLOCATOR
// ============================================================================

/// Initial arena capacity for a fresh `DatumAlloc`.
pub const DEFAULT_ARENA_CAPACITY: usize = 4 * 1024;

/// Arenas that grew beyond this are dropped and recreated on reset instead of
/// being kept around between batches.
pub const MAX_ARENA_RETAINED: usize = 1024 * 1024;

const _: () = assert!(
    DEFAULT_ARENA_CAPACITY <= MAX_ARENA_RETAINED,
    "a fresh arena must be retainable across resets"
);

// ============================================================================
// VALUE ENCODING
// ============================================================================

/// Column identifier used for nested array elements and tuple fields.
pub const NO_COLUMN_ID: u32 = 0;

/// Largest payload length accepted by the value decoder.
pub const MAX_VALUE_PAYLOAD_LEN: u64 = u32::MAX as u64;

/// Size of the CRC32 checksum prefix on a marshalled column value.
pub const VALUE_CHECKSUM_SIZE: usize = 4;

/// Size of the tag byte following the checksum.
pub const VALUE_TAG_SIZE: usize = 1;

pub const MARSHALLED_HEADER_SIZE: usize = VALUE_CHECKSUM_SIZE + VALUE_TAG_SIZE;

const _: () = assert!(
    MARSHALLED_HEADER_SIZE == VALUE_CHECKSUM_SIZE + VALUE_TAG_SIZE,
    "MARSHALLED_HEADER_SIZE derivation mismatch"
);

// ============================================================================
// DECIMALS
// ============================================================================

/// Exponents of base 100 at or below this value are stored inline in the key
/// marker byte.
pub const DECIMAL_MEDIUM_EXPONENT_MAX: i64 = 10;

/// Upper bound on digits accepted when decoding a decimal, guarding the arena
/// against corrupt length fields.
pub const MAX_DECIMAL_DIGITS: usize = 16 * 1024;

// ============================================================================
// INTERVALS
// ============================================================================

/// Intervals are ordered by `months * DAYS_PER_MONTH + days` days plus micros.
pub const DAYS_PER_MONTH: i128 = 30;

pub const MICROS_PER_DAY: i128 = 86_400 * 1_000_000;
