// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card template capture and SVG rasterisation.

pub mod capture;
pub mod card_svg;
pub mod raster;

pub use capture::{
    HIDDEN_TEMPLATE_NODES, NoTemplate, PrerenderedSnapshot, SvgSnapshotSource, VectorSnapshotSource,
};
pub use card_svg::CardTemplate;
