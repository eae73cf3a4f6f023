// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared page primitives: the titled band and the label + value box.

use vitalcard_core::geometry::RectMm;
use vitalcard_core::types::display_or_dash;

use crate::layout::text::fit_text;
use crate::pdf::canvas::{FontFace, PageCanvas, Stroke, TextRun, palette};

/// Height of a titled band.
pub const BAND_HEIGHT: f32 = 7.0;

/// Height of a label + value box.
pub const BOX_HEIGHT: f32 = 10.0;

const ACCENT_WIDTH: f32 = 2.0;
const PADDING: f32 = 2.0;

/// A pale strip with a green accent bar on the left and a bold label.
/// Returns the y coordinate just below the band.
pub fn titled_band(canvas: &mut PageCanvas, x: f32, y: f32, width: f32, title: &str) -> f32 {
    let band = RectMm::new(x, y, width, BAND_HEIGHT);
    canvas.rect(band, Some(palette::PALE_GREEN), None);
    canvas.rect(
        RectMm::new(x, y, ACCENT_WIDTH, BAND_HEIGHT),
        Some(palette::INSTITUTION_GREEN),
        None,
    );

    let label = fit_text(
        &title.to_uppercase(),
        8.5,
        FontFace::Bold,
        width - ACCENT_WIDTH - 2.0 * PADDING,
    );
    canvas.text(
        TextRun::new(label, x + ACCENT_WIDTH + PADDING, y + 4.8, 8.5, FontFace::Bold)
            .color(palette::INSTITUTION_GREEN),
    );
    band.bottom()
}

/// A light box with a small muted caption above a bold value. Empty values
/// print as a dash; long ones are shortened with an ellipsis.
pub fn label_value_box(canvas: &mut PageCanvas, rect: RectMm, label: &str, value: &str) {
    canvas.rounded_rect(
        rect,
        1.0,
        Some(palette::BOX_FILL),
        Some(Stroke::new(palette::BOX_BORDER, 0.2)),
    );

    let inner = rect.width - 2.0 * PADDING;
    canvas.text(
        TextRun::new(
            fit_text(label, 6.5, FontFace::Regular, inner),
            rect.x + PADDING,
            rect.y + 3.6,
            6.5,
            FontFace::Regular,
        )
        .color(palette::MUTED),
    );
    canvas.text(TextRun::new(
        fit_text(display_or_dash(value), 9.0, FontFace::Bold, inner),
        rect.x + PADDING,
        rect.y + rect.height - 2.2,
        9.0,
        FontFace::Bold,
    ));
}
