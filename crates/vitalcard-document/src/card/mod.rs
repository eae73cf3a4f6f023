// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The ID-1 card: overlay placement, vector fallback and layer compositing.

pub mod compositor;
pub mod fallback;
pub mod overlay;

pub use compositor::{CardLayers, CompositeReport, Compositor};
pub use fallback::FallbackRenderer;
pub use overlay::OverlayPlacement;
