// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vitalcard — Core types, physical geometry, configuration and error
// definitions shared across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod types;

pub use config::RenderConfig;
pub use error::VitalcardError;
pub use geometry::Geometry;
pub use types::*;
