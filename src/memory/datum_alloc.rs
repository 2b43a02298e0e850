//! # Datum Allocator
//!
//! Decoding a batch of rows produces many short-lived containers: unescaped
//! strings, decimal digit vectors, array and tuple element slices. Allocating
//! each one on the heap dominates decode cost, so decoders take a
//! [`DatumAlloc`] and carve those containers out of a bump arena instead.
//!
//! ## Lifetime Model
//!
//! ```text
//! let mut alloc = DatumAlloc::new();
//! loop {
//!     for row in batch {
//!         let (datum, n) = decode_key(&alloc, &ty, row, dir)?;   // borrows &alloc
//!         ...
//!     }
//!     alloc.reset();                                           // needs &mut alloc
//! }
//! ```
//!
//! Acquire operations take `&self` and hand out `&'a` slices tied to the
//! allocator borrow. `reset` takes `&mut self`, so the borrow checker rejects
//! any decoded datum that would outlive the batch boundary.
//!
//! ## Concurrency
//!
//! `bumpalo::Bump` is `Send` but not `Sync`. One allocator per decode stream;
//! sharing one across threads does not compile.
//!
//! ## Drop Semantics
//!
//! The arena never runs destructors. Decoders only place borrowed datums in
//! it (every `Cow` inside points into the input buffer or the arena itself),
//! so nothing leaks. `alloc_datums` checks the same in debug builds.

use crate::config::{DEFAULT_ARENA_CAPACITY, MAX_ARENA_RETAINED};
use crate::types::Datum;
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

pub struct DatumAlloc {
    bump: Bump,
    capacity: usize,
}

impl DatumAlloc {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ARENA_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
            capacity,
        }
    }

    /// Copies a byte run into the arena.
    pub fn alloc_bytes(&self, bytes: &[u8]) -> &[u8] {
        self.bump.alloc_slice_copy(bytes)
    }

    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Returns a zeroed digit slot of `len` decimal digits.
    pub fn alloc_decimal_digits(&self, len: usize) -> &mut [u8] {
        self.bump.alloc_slice_fill_copy(len, 0u8)
    }

    /// Moves decoded elements into arena-backed array or tuple storage.
    ///
    /// Items must only borrow: the arena never drops what it holds, so a
    /// `Cow::Owned` buffer placed here would leak. Debug builds panic on one.
    pub fn alloc_datums<'a, I>(&'a self, items: I) -> &'a [Datum<'a>]
    where
        I: IntoIterator<Item = Datum<'a>>,
    {
        let mut vec = BumpVec::new_in(&self.bump);
        vec.extend(items);
        debug_assert!(
            !vec.iter().any(Datum::owns_heap),
            "owned datum placed in the arena"
        );
        vec.into_bump_slice()
    }

    /// Growable datum vector for decoders that do not know the element count
    /// up front. Finish with `into_bump_slice`.
    pub(crate) fn datum_vec<'a>(&'a self, capacity: usize) -> BumpVec<'a, Datum<'a>> {
        BumpVec::with_capacity_in(capacity, &self.bump)
    }

    /// Scratch byte buffer, used when unescaping key-encoded strings.
    pub fn byte_buf(&self, capacity: usize) -> BumpVec<'_, u8> {
        BumpVec::with_capacity_in(capacity, &self.bump)
    }

    /// Bytes of arena capacity currently held, including unused chunk space.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Invalidates every slot handed out so far. Arenas that grew past
    /// `MAX_ARENA_RETAINED` are released and recreated at the initial capacity.
    pub fn reset(&mut self) {
        let used = self.bump.allocated_bytes();
        if used > MAX_ARENA_RETAINED {
            self.bump = Bump::with_capacity(self.capacity);
        } else {
            self.bump.reset();
        }
        tracing::trace!(released = used, "datum allocator reset");
    }
}

impl Default for DatumAlloc {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DatumAlloc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatumAlloc")
            .field("capacity", &self.capacity)
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}
