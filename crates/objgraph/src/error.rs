// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for registry construction and stream encoding.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type CodecResult<T> = Result<T, CodecError>;

/// Coarse grouping of [`CodecError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Raised while building the registry; the codec stays uninitialized.
    Configuration,
    /// Caller misuse (wrong state, unregistered or mismatched type).
    Usage,
    /// Malformed or truncated stream, or an I/O failure.
    Protocol,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("type `{type_name}` is not serializable: {reason}")]
    Ineligible { type_name: String, reason: String },

    #[error("plugins `{first}` and `{second}` both claim type `{type_name}`")]
    ConflictingPlugins {
        type_name: String,
        first: String,
        second: String,
    },

    #[error("plugin `{0}` is registered more than once")]
    DuplicatePlugin(String),

    #[error("canonical name `{0}` is shared by two distinct types")]
    DuplicateTypeName(String),

    #[error("type graph holds {0} types, more than the 16-bit tag space allows")]
    TooManyTypes(usize),

    #[error("codec is already initialized")]
    AlreadyInitialized,

    #[error("no procedure bound for type `{0}`")]
    MissingBinding(String),

    #[error("codec is not initialized")]
    NotInitialized,

    #[error("type `{0}` is not registered")]
    UnknownType(String),

    #[error("value does not have the expected type `{expected}`")]
    TypeMismatch { expected: String },

    #[error("unknown type tag {tag} at offset {offset}")]
    UnknownTag { tag: u64, offset: u64 },

    #[error("unexpected end of stream at offset {offset}")]
    EndOfStream { offset: u64 },

    #[error("invalid data at offset {offset}: {reason}")]
    InvalidData { offset: u64, reason: String },

    #[error("back-reference {index} is out of range ({len} instances seen)")]
    BadReference { index: u64, len: usize },

    #[error("object graph nesting exceeds {0} levels")]
    DepthExceeded(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// `TypeMismatch` naming `T`.
    pub fn mismatch<T: ?Sized>() -> Self {
        CodecError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
        }
    }

    /// `TypeMismatch` naming a type by its canonical name.
    pub fn mismatch_named(name: &str) -> Self {
        CodecError::TypeMismatch {
            expected: name.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CodecError::Ineligible { .. }
            | CodecError::ConflictingPlugins { .. }
            | CodecError::DuplicatePlugin(_)
            | CodecError::DuplicateTypeName(_)
            | CodecError::TooManyTypes(_)
            | CodecError::AlreadyInitialized
            | CodecError::MissingBinding(_) => ErrorCategory::Configuration,
            CodecError::NotInitialized
            | CodecError::UnknownType(_)
            | CodecError::TypeMismatch { .. } => ErrorCategory::Usage,
            CodecError::UnknownTag { .. }
            | CodecError::EndOfStream { .. }
            | CodecError::InvalidData { .. }
            | CodecError::BadReference { .. }
            | CodecError::DepthExceeded(_)
            | CodecError::Io(_) => ErrorCategory::Protocol,
        }
    }

    /// True for errors caused by the byte stream rather than the caller.
    pub fn is_protocol(&self) -> bool {
        self.category() == ErrorCategory::Protocol
    }
}
