// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page canvas — a display list of shapes, text runs and bitmap layers in
// page-space millimetres (top-left origin).
//
// The page layout engine and the card compositor both draw onto the same
// canvas; the PDF writer turns it into printpdf operations afterwards.
// Keeping the intermediate form makes geometry inspectable and comparable.

use std::sync::Arc;

use image::RgbaImage;
use vitalcard_core::geometry::{Geometry, PointMm, RectMm};

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8(pub u8, pub u8, pub u8);

impl Rgb8 {
    pub const fn gray(level: u8) -> Self {
        Self(level, level, level)
    }
}

/// Colours shared by the page and the card.
pub mod palette {
    use super::Rgb8;

    pub const WHITE: Rgb8 = Rgb8(255, 255, 255);
    pub const INK: Rgb8 = Rgb8(33, 37, 41);
    pub const MUTED: Rgb8 = Rgb8(108, 117, 125);
    pub const INSTITUTION_GREEN: Rgb8 = Rgb8(0, 122, 61);
    pub const PALE_GREEN: Rgb8 = Rgb8(232, 245, 236);
    pub const CARD_GREEN: Rgb8 = Rgb8(225, 242, 230);
    pub const GOLD: Rgb8 = Rgb8(212, 175, 55);
    pub const BOX_FILL: Rgb8 = Rgb8(246, 248, 247);
    pub const BOX_BORDER: Rgb8 = Rgb8(210, 218, 213);
    pub const WARNING_FILL: Rgb8 = Rgb8(255, 244, 229);
    pub const WARNING_BORDER: Rgb8 = Rgb8(230, 126, 34);
}

/// Stroke style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb8,
    pub width_mm: f32,
}

impl Stroke {
    pub const fn new(color: Rgb8, width_mm: f32) -> Self {
        Self { color, width_mm }
    }
}

/// Built-in PDF faces available without font embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
    Mono,
    MonoBold,
}

impl FontFace {
    /// Average advance width as a fraction of the font size. Exact for the
    /// Courier faces, an estimate for Helvetica.
    pub fn average_advance(&self) -> f32 {
        match self {
            Self::Regular | Self::Italic => 0.52,
            Self::Bold => 0.56,
            Self::Mono | Self::MonoBold => 0.60,
        }
    }
}

/// Horizontal anchoring of a text run relative to its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Stacking order. Elements are emitted sorted by this (stable), so the card
/// layers keep the order in which the compositor pushed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZOrder {
    Page,
    Shadow,
    CardBackground,
    Base,
    Watermark,
    Overlay,
    EdgeMask,
    CardStroke,
    DebugGrid,
}

/// A single line of text. `origin.y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub origin: PointMm,
    pub size_pt: f32,
    pub face: FontFace,
    pub color: Rgb8,
    pub align: Align,
    /// Carries wall-clock time and therefore differs between runs.
    pub timestamp: bool,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size_pt: f32, face: FontFace) -> Self {
        Self {
            text: text.into(),
            origin: PointMm::new(x, y),
            size_pt,
            face,
            color: palette::INK,
            align: Align::Left,
            timestamp: false,
        }
    }

    pub fn color(mut self, color: Rgb8) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    /// Estimated rendered width in millimetres.
    pub fn width_mm(&self) -> f32 {
        crate::layout::text::text_width_mm(&self.text, self.size_pt, self.face)
    }

    /// Left edge after alignment.
    pub fn left_mm(&self) -> f32 {
        match self.align {
            Align::Left => self.origin.x,
            Align::Center => self.origin.x - self.width_mm() / 2.0,
            Align::Right => self.origin.x - self.width_mm(),
        }
    }
}

/// A positioned bitmap in page space. Built per call, discarded after the
/// page is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub rect: RectMm,
    pub bitmap: Arc<RgbaImage>,
}

/// Drawable content.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        rect: RectMm,
        radius: f32,
        fill: Option<Rgb8>,
        stroke: Option<Stroke>,
    },
    Polygon {
        points: Vec<PointMm>,
        fill: Rgb8,
    },
    Line {
        from: PointMm,
        to: PointMm,
        stroke: Stroke,
    },
    Text(TextRun),
    Image(Layer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageElement {
    pub z: ZOrder,
    pub shape: Shape,
}

/// The single page every component draws on.
#[derive(Debug, Clone)]
pub struct PageCanvas {
    geometry: Geometry,
    z: ZOrder,
    elements: Vec<PageElement>,
}

impl PageCanvas {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            z: ZOrder::Page,
            elements: Vec::new(),
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Subsequent elements are pushed at `z`.
    pub fn set_z(&mut self, z: ZOrder) {
        self.z = z;
    }

    pub fn z(&self) -> ZOrder {
        self.z
    }

    pub fn elements(&self) -> &[PageElement] {
        &self.elements
    }

    /// Elements in emission order (stable sort by z).
    pub fn ordered(&self) -> Vec<&PageElement> {
        let mut ordered: Vec<&PageElement> = self.elements.iter().collect();
        ordered.sort_by_key(|element| element.z);
        ordered
    }

    /// All text runs, in push order.
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.elements.iter().filter_map(|element| match &element.shape {
            Shape::Text(run) => Some(run),
            _ => None,
        })
    }

    /// Whether any text run reads exactly `text`.
    pub fn has_text(&self, text: &str) -> bool {
        self.texts().any(|run| run.text == text)
    }

    fn push(&mut self, shape: Shape) {
        self.elements.push(PageElement { z: self.z, shape });
    }

    pub fn rect(&mut self, rect: RectMm, fill: Option<Rgb8>, stroke: Option<Stroke>) {
        self.rounded_rect(rect, 0.0, fill, stroke);
    }

    pub fn rounded_rect(
        &mut self,
        rect: RectMm,
        radius: f32,
        fill: Option<Rgb8>,
        stroke: Option<Stroke>,
    ) {
        if fill.is_none() && stroke.is_none() {
            return;
        }
        self.push(Shape::Rect {
            rect,
            radius,
            fill,
            stroke,
        });
    }

    pub fn polygon(&mut self, points: Vec<PointMm>, fill: Rgb8) {
        if points.len() >= 3 {
            self.push(Shape::Polygon { points, fill });
        }
    }

    pub fn line(&mut self, from: PointMm, to: PointMm, stroke: Stroke) {
        self.push(Shape::Line { from, to, stroke });
    }

    pub fn text(&mut self, run: TextRun) {
        if !run.text.is_empty() {
            self.push(Shape::Text(run));
        }
    }

    pub fn image(&mut self, rect: RectMm, bitmap: Arc<RgbaImage>) {
        if bitmap.width() > 0 && bitmap.height() > 0 {
            self.push(Shape::Image(Layer { rect, bitmap }));
        }
    }
}

/// Outline of a rounded rectangle as a polygon, clockwise from the top-left
/// arc. `segments` controls how many chords approximate each quarter arc.
pub fn rounded_rect_outline(rect: RectMm, radius: f32, segments: usize) -> Vec<PointMm> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    if r <= f32::EPSILON {
        return vec![
            PointMm::new(rect.x, rect.y),
            PointMm::new(rect.right(), rect.y),
            PointMm::new(rect.right(), rect.bottom()),
            PointMm::new(rect.x, rect.bottom()),
        ];
    }

    // Corner centres with the start angle of each quarter arc (y grows down).
    let corners = [
        (rect.x + r, rect.y + r, 180.0_f32),
        (rect.right() - r, rect.y + r, 270.0),
        (rect.right() - r, rect.bottom() - r, 0.0),
        (rect.x + r, rect.bottom() - r, 90.0),
    ];

    let segments = segments.max(1);
    let mut points = Vec::with_capacity(4 * (segments + 1));
    for (cx, cy, start) in corners {
        for step in 0..=segments {
            let angle = (start + 90.0 * step as f32 / segments as f32).to_radians();
            points.push(PointMm::new(cx + r * angle.cos(), cy + r * angle.sin()));
        }
    }
    points
}
