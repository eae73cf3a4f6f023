// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vitalcard-document — Insurance attestation rendering for Vitalcard.
//
// Loads the card assets, captures or redraws the card base, composites the
// ID-1 card onto an A4 attestation page laid out around it, and serialises
// the page to PDF.

pub mod assembler;
pub mod asset;
pub mod card;
pub mod layout;
pub mod pdf;
pub mod template;

// Re-export the primary structs so callers can use `vitalcard_document::DocumentAssembler` etc.
pub use assembler::{Artifact, Composition, DocumentAssembler};
pub use asset::{Asset, AssetFetcher, AssetLoader, DefaultFetcher, MemoryFetcher};
pub use card::Compositor;
pub use layout::PageLayout;
pub use pdf::{PageCanvas, PdfWriter};
pub use template::{CardTemplate, NoTemplate, PrerenderedSnapshot, SvgSnapshotSource, VectorSnapshotSource};
