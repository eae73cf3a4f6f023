// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Vitalcard.
//
// Rendering itself never surfaces these to callers: asset and template
// failures are folded into absent layers at the loader boundary. They remain
// the currency of the internal fallible steps and of the file/config I/O.

use thiserror::Error;

/// Top-level error type for all Vitalcard operations.
#[derive(Debug, Error)]
pub enum VitalcardError {
    // -- Asset errors --
    #[error("asset fetch failed for {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    #[error("asset decode failed: {0}")]
    AssetDecode(String),

    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    // -- Rendering errors --
    #[error("template capture failed: {0}")]
    TemplateCapture(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VitalcardError>;
