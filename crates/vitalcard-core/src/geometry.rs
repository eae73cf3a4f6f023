// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Physical geometry of the attestation page and the ID-1 card.
//
// Every coordinate in this module is in millimetres, page space, origin at the
// top-left corner of the page with y growing downwards. Conversion to PDF
// points (bottom-left origin) happens only when the page is emitted.

use serde::{Deserialize, Serialize};

/// A point in page-space millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMm {
    pub x: f32,
    pub y: f32,
}

impl PointMm {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page-space millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectMm {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectMm {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> PointMm {
        PointMm::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrink the rectangle by `amount` on every side.
    pub fn inset(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            (self.width - 2.0 * amount).max(0.0),
            (self.height - 2.0 * amount).max(0.0),
        )
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Whether `other` lies fully inside `self`, with a float tolerance of
    /// one micrometre.
    pub fn contains(&self, other: &RectMm) -> bool {
        const EPS: f32 = 0.001;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    /// Whether the two rectangles share any interior area.
    pub fn intersects(&self, other: &RectMm) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Overlay placements, expressed as fractions of the card width `Wc` and
/// height `Hc`. Derived from the 1050 × 650 design reference of the card
/// template, so they survive minor scale changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayFractions {
    /// Emblem origin (fraction of Wc, fraction of Hc).
    pub emblem_origin: (f32, f32),
    /// Emblem square side (fraction of Wc).
    pub emblem_side: f32,
    /// Organisation logo origin (fraction of Wc, fraction of Hc).
    pub logo_origin: (f32, f32),
    /// Extra downward nudge applied to the logo, in millimetres.
    pub logo_nudge_mm: f32,
    /// Logo width (fraction of Wc).
    pub logo_width: f32,
    /// Logo height as a fraction of the logo width.
    pub logo_aspect: f32,
    /// Chip origin (fraction of Wc, fraction of Hc).
    pub chip_origin: (f32, f32),
    /// Chip size (fraction of Wc, fraction of Hc).
    pub chip_size: (f32, f32),
    /// Photo ellipse centre (fraction of Wc, fraction of Hc).
    pub photo_center: (f32, f32),
    /// Photo ellipse radii (horizontal as fraction of Wc, vertical as
    /// fraction of Hc).
    pub photo_radii: (f32, f32),
}

impl OverlayFractions {
    pub const DESIGN_REFERENCE: OverlayFractions = OverlayFractions {
        emblem_origin: (0.0352, 0.0231),
        emblem_side: 0.1314,
        logo_origin: (0.5810, 0.0446),
        logo_nudge_mm: 1.0,
        logo_width: 0.3810,
        logo_aspect: 0.20,
        chip_origin: (0.0886, 0.3431),
        chip_size: (0.1543, 0.1923),
        photo_center: (0.8067, 0.6877),
        photo_radii: (0.1238, 0.2462),
    };
}

/// The immutable physical layout contract of the page and the card.
///
/// Constructed once (usually as [`Geometry::ID1_ON_A4`]) and passed explicitly
/// to every layout and compositing function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub page_width: f32,
    pub page_height: f32,
    pub page_margin: f32,
    pub card_width: f32,
    pub card_height: f32,
    pub card_radius: f32,
    /// Distance from the page top to the card's top edge.
    pub card_top: f32,
    /// Inset applied to the base and watermark bitmaps so they never bleed
    /// past the rounded outline.
    pub base_inset: f32,
    /// Share of the card height (measured from the bottom) covered by the
    /// watermark.
    pub watermark_band: f32,
    /// Share of the card height taken by the white top band of the fallback
    /// rendering.
    pub fallback_top_band: f32,
    /// How far the edge mask strips reach beyond the card.
    pub edge_mask_extent: f32,
    /// Minimum clearance kept between the photo box and the card edges.
    pub photo_safety_margin: f32,
    /// Width/height of the card template in design units.
    pub design_width: f32,
    pub design_height: f32,
    pub overlays: OverlayFractions,
}

impl Geometry {
    /// ISO/IEC 7810 ID-1 card on an A4 portrait page.
    pub const ID1_ON_A4: Geometry = Geometry {
        page_width: 210.0,
        page_height: 297.0,
        page_margin: 15.0,
        card_width: 85.6,
        card_height: 53.98,
        card_radius: 3.0,
        card_top: 61.0,
        base_inset: 0.1,
        watermark_band: 0.734,
        fallback_top_band: 0.254,
        edge_mask_extent: 5.0,
        photo_safety_margin: 0.5,
        design_width: 1050.0,
        design_height: 650.0,
        overlays: OverlayFractions::DESIGN_REFERENCE,
    };

    /// The card's left edge: flush with the right page margin.
    pub fn card_x(&self) -> f32 {
        self.page_width - self.page_margin - self.card_width
    }

    /// The card's bounding rectangle in page space.
    pub fn card_rect(&self) -> RectMm {
        RectMm::new(self.card_x(), self.card_top, self.card_width, self.card_height)
    }

    /// The page content area inside the margins.
    pub fn content_rect(&self) -> RectMm {
        RectMm::new(
            self.page_margin,
            self.page_margin,
            self.page_width - 2.0 * self.page_margin,
            self.page_height - 2.0 * self.page_margin,
        )
    }

    /// Whether the card fits inside the page for this geometry.
    pub fn card_within_page(&self) -> bool {
        let card = self.card_rect();
        card.x >= 0.0
            && card.y >= 0.0
            && card.right() <= self.page_width - self.page_margin + 0.001
            && card.bottom() <= self.page_height
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::ID1_ON_A4
    }
}
