//! Record identifier utilities.
//!
//! Every record in an HMS collection is keyed by an opaque string id. New ids are minted here
//! from a random (version 4) UUID and rendered in a *canonical* form:
//! **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that *guarantees* the canonical format once constructed.
//! - [`RecordId::is_canonical`], a cheap syntactic check for externally supplied ids.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Collections still accept records whose ids are not canonical (for example, records written
//! by older clients that used millisecond timestamps). Only *new* ids are guaranteed canonical.

mod id;

pub use id::RecordId;

/// Error type for record id operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for record id operations.
pub type UuidResult<T> = Result<T, UuidError>;
