//! # Codec Errors
//!
//! Every failure raised by the codec is a [`CodecError`] carried inside an
//! `eyre::Report`. Public functions return `eyre::Result` like the rest of the
//! crate; callers that need to branch on the failure class recover it with
//! [`error_kind`].
//!
//! ## Error Kinds
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | `UnsupportedFamily` | key encoding requested for a family without one |
//! | `Truncated` | buffer ends before an encoded component completes |
//! | `MalformedMarker` | unknown marker, escape, or value tag byte |
//! | `LengthOverflow` | declared length exceeds the buffer or representable size |
//! | `TypeMismatch` | datum or encoded tag inconsistent with the descriptor |
//! | `InvalidData` | structurally valid bytes with an invalid payload (bad UTF-8, digit > 9) |
//! | `ChecksumMismatch` | marshalled column value fails CRC verification |
//! | `Internal` | classifier and codec disagree; a defect, not bad input |
//!
//! Corrupt input is always surfaced. Nothing is retried or coerced here.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecErrorKind {
    UnsupportedFamily,
    Truncated,
    MalformedMarker,
    LengthOverflow,
    TypeMismatch,
    InvalidData,
    ChecksumMismatch,
    Internal,
}

impl CodecErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            CodecErrorKind::UnsupportedFamily => "unsupported family",
            CodecErrorKind::Truncated => "truncated",
            CodecErrorKind::MalformedMarker => "malformed marker",
            CodecErrorKind::LengthOverflow => "length overflow",
            CodecErrorKind::TypeMismatch => "type mismatch",
            CodecErrorKind::InvalidData => "invalid data",
            CodecErrorKind::ChecksumMismatch => "checksum mismatch",
            CodecErrorKind::Internal => "internal",
        }
    }

    /// Returns true if the error was caused by malformed encoded input, as
    /// opposed to a caller contract violation or a codec defect.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CodecErrorKind::Truncated
                | CodecErrorKind::MalformedMarker
                | CodecErrorKind::LengthOverflow
                | CodecErrorKind::InvalidData
                | CodecErrorKind::ChecksumMismatch
        )
    }
}

#[derive(Debug)]
pub struct CodecError {
    pub kind: CodecErrorKind,
    pub detail: String,
}

impl CodecError {
    pub fn new(kind: CodecErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if kind == CodecErrorKind::Internal {
            tracing::error!(%detail, "codec invariant violated");
        } else {
            tracing::trace!(kind = kind.name(), %detail, "codec failure");
        }
        Self { kind, detail }
    }

    pub fn truncated(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::Truncated, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::MalformedMarker, detail)
    }

    pub fn overflow(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::LengthOverflow, detail)
    }

    pub fn mismatch(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::TypeMismatch, detail)
    }

    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::InvalidData, detail)
    }

    pub fn unsupported(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::UnsupportedFamily, detail)
    }

    pub fn checksum(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::ChecksumMismatch, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::Internal, detail)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.detail)
    }
}

impl std::error::Error for CodecError {}

/// Extracts the codec error kind from a report, if the report carries one.
pub fn error_kind(report: &eyre::Report) -> Option<CodecErrorKind> {
    report.downcast_ref::<CodecError>().map(|e| e.kind)
}
