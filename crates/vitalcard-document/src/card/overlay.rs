// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay placement on the card, from the fractional design reference.

use vitalcard_core::geometry::{Geometry, RectMm};

/// Page-space rectangles of the four overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    pub emblem: RectMm,
    pub logo: RectMm,
    pub chip: RectMm,
    /// Bounding box of the photo ellipse, already clamped.
    pub photo: RectMm,
}

impl OverlayPlacement {
    /// Resolve the overlay fractions against the card rectangle. Used for
    /// both the captured and the fallback base so the overlays line up with
    /// either.
    pub fn compute(geometry: &Geometry) -> Self {
        let card = geometry.card_rect();
        let (wc, hc) = (card.width, card.height);
        let f = &geometry.overlays;

        let emblem_side = f.emblem_side * wc;
        let emblem = RectMm::new(
            card.x + f.emblem_origin.0 * wc,
            card.y + f.emblem_origin.1 * hc,
            emblem_side,
            emblem_side,
        );

        let logo_width = f.logo_width * wc;
        let logo = RectMm::new(
            card.x + f.logo_origin.0 * wc,
            card.y + f.logo_origin.1 * hc + f.logo_nudge_mm,
            logo_width,
            logo_width * f.logo_aspect,
        );

        let chip = RectMm::new(
            card.x + f.chip_origin.0 * wc,
            card.y + f.chip_origin.1 * hc,
            f.chip_size.0 * wc,
            f.chip_size.1 * hc,
        );

        let (rx, ry) = (f.photo_radii.0 * wc, f.photo_radii.1 * hc);
        let (cx, cy) = (card.x + f.photo_center.0 * wc, card.y + f.photo_center.1 * hc);
        let photo = clamp_inside(
            RectMm::new(cx - rx, cy - ry, 2.0 * rx, 2.0 * ry),
            card.inset(geometry.photo_safety_margin),
        );

        Self {
            emblem,
            logo,
            chip,
            photo,
        }
    }
}

/// Shift `rect` inward until it lies within `bounds`. The size never
/// changes; a rect larger than `bounds` is aligned to its top-left.
pub fn clamp_inside(rect: RectMm, bounds: RectMm) -> RectMm {
    let x = rect.x.min(bounds.right() - rect.width).max(bounds.x);
    let y = rect.y.min(bounds.bottom() - rect.height).max(bounds.y);
    RectMm::new(x, y, rect.width, rect.height)
}

/// Largest rectangle with the source aspect ratio that fits in `bounds`,
/// centred. Logos and emblems are never distorted or cropped.
pub fn contain_fit(source_width: u32, source_height: u32, bounds: RectMm) -> RectMm {
    if source_width == 0 || source_height == 0 {
        return bounds;
    }
    let scale = (bounds.width / source_width as f32).min(bounds.height / source_height as f32);
    let (w, h) = (source_width as f32 * scale, source_height as f32 * scale);
    RectMm::new(
        bounds.x + (bounds.width - w) / 2.0,
        bounds.y + (bounds.height - h) / 2.0,
        w,
        h,
    )
}

/// Pixel dimensions of `rect` at `px_per_mm`, at least one pixel each way.
pub fn pixel_size(rect: RectMm, px_per_mm: f32) -> (u32, u32) {
    (
        ((rect.width * px_per_mm).round() as u32).max(1),
        ((rect.height * px_per_mm).round() as u32).max(1),
    )
}
