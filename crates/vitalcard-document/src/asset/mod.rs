// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Asset module — fetching image references and shaping them into plain,
// elliptical or opacity-baked bitmaps, plus the built-in card graphics.

pub mod builtin;
pub mod fetch;
pub mod loader;

pub use fetch::{AssetFetcher, DefaultFetcher, MemoryFetcher};
pub use loader::{Asset, AssetLoader, BakedBitmap};
