// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the shared page canvas and its serialisation to PDF.

pub mod canvas;
pub mod writer;

pub use canvas::{PageCanvas, ZOrder};
pub use writer::PdfWriter;
