// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card compositor.
//
// Back to front: shadow stack, white card body, base (captured bitmap or
// vector fallback), watermark, overlays, edge mask, final stroke. Each step
// draws at its own `ZOrder`, so the order holds no matter how the canvas is
// later sorted.

use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, instrument};
use vitalcard_core::config::RenderConfig;
use vitalcard_core::geometry::{Geometry, RectMm};
use vitalcard_core::types::{AssetKind, DocumentRecord};

use crate::asset::loader::{Asset, BakedBitmap, clip_to_rounded_rect};
use crate::card::fallback::FallbackRenderer;
use crate::card::overlay::{OverlayPlacement, contain_fit};
use crate::pdf::canvas::{PageCanvas, Rgb8, Stroke, ZOrder, palette};

/// Number of rounded rects in the shadow stack.
const SHADOW_LAYERS: usize = 6;
/// Extra spread of the outermost shadow copy; each later copy shrinks evenly.
const SHADOW_SPREAD: f32 = 1.2;
/// Sub-millimetre drop of the whole stack.
const SHADOW_OFFSET: (f32, f32) = (0.35, 0.5);
/// Outermost to innermost gray levels.
const SHADOW_GRAY: (u8, u8) = (240, 178);

const OUTER_STROKE: Stroke = Stroke::new(Rgb8(160, 172, 166), 0.3);
const INNER_STROKE: Stroke = Stroke::new(Rgb8(222, 228, 225), 0.15);

/// The resolved layers of one card.
#[derive(Debug, Clone)]
pub struct CardLayers {
    /// Template capture; absent selects the vector fallback.
    pub base: Asset<RgbaImage>,
    pub watermark: Asset<BakedBitmap>,
    pub emblem: Asset<RgbaImage>,
    pub logo: Asset<RgbaImage>,
    pub chip: Asset<RgbaImage>,
    /// Already clipped to its ellipse.
    pub photo: Asset<RgbaImage>,
}

impl CardLayers {
    /// Nothing resolved: fallback base and no bitmaps.
    pub fn absent() -> Self {
        Self {
            base: Asset::Absent,
            watermark: Asset::Absent,
            emblem: Asset::Absent,
            logo: Asset::Absent,
            chip: Asset::Absent,
            photo: Asset::Absent,
        }
    }
}

/// Which layers ended up on the card.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeReport {
    pub used_fallback: bool,
    pub drawn: Vec<AssetKind>,
    pub skipped: Vec<AssetKind>,
}

impl CompositeReport {
    fn record<T>(&mut self, kind: AssetKind, asset: &Asset<T>) {
        if asset.is_present() {
            self.drawn.push(kind);
        } else {
            self.skipped.push(kind);
        }
    }
}

/// Assembles the card onto the page canvas.
pub struct Compositor<'a> {
    geometry: &'a Geometry,
    config: &'a RenderConfig,
}

impl<'a> Compositor<'a> {
    pub fn new(geometry: &'a Geometry, config: &'a RenderConfig) -> Self {
        Self { geometry, config }
    }

    /// How far the shadow stack reaches beyond the card on any side.
    pub fn shadow_extent(&self) -> f32 {
        SHADOW_SPREAD + SHADOW_OFFSET.0.max(SHADOW_OFFSET.1)
    }

    #[instrument(skip_all, fields(numero = %record.insured_number))]
    pub fn composite(
        &self,
        canvas: &mut PageCanvas,
        record: &DocumentRecord,
        layers: CardLayers,
    ) -> CompositeReport {
        let card = self.geometry.card_rect();
        let base_rect = card.inset(self.geometry.base_inset);
        let placement = OverlayPlacement::compute(self.geometry);
        let mut report = CompositeReport::default();
        let previous_z = canvas.z();

        // 1. Shadow stack.
        canvas.set_z(ZOrder::Shadow);
        self.draw_shadow(canvas, card);

        // 2. Opaque white body.
        canvas.set_z(ZOrder::CardBackground);
        canvas.rounded_rect(card, self.geometry.card_radius, Some(palette::WHITE), None);

        // 3. Base layer.
        canvas.set_z(ZOrder::Base);
        report.record(AssetKind::Template, &layers.base);
        match layers.base {
            Asset::Present(mut bitmap) => {
                let radius_px = self.corner_radius_px(&bitmap, base_rect);
                clip_to_rounded_rect(&mut bitmap, radius_px);
                canvas.image(base_rect, Arc::new(bitmap));
            }
            Asset::Absent => {
                report.used_fallback = true;
                FallbackRenderer::new(self.geometry, self.config).draw(canvas, record);
            }
        }

        // 4. Watermark in the lower band.
        canvas.set_z(ZOrder::Watermark);
        report.record(AssetKind::Watermark, &layers.watermark);
        if let Asset::Present(baked) = layers.watermark {
            let region = self.watermark_region();
            let mut bitmap = baked.into_image();
            let radius_px = self.corner_radius_px(&bitmap, region);
            clip_to_rounded_rect(&mut bitmap, radius_px);
            canvas.image(region, Arc::new(bitmap));
        }

        // 5. Overlays.
        canvas.set_z(ZOrder::Overlay);
        report.record(AssetKind::Emblem, &layers.emblem);
        if let Asset::Present(emblem) = layers.emblem {
            let rect = contain_fit(emblem.width(), emblem.height(), placement.emblem);
            canvas.image(rect, Arc::new(emblem));
        }
        report.record(AssetKind::Logo, &layers.logo);
        if let Asset::Present(logo) = layers.logo {
            let rect = contain_fit(logo.width(), logo.height(), placement.logo);
            canvas.image(rect, Arc::new(logo));
        }
        report.record(AssetKind::Chip, &layers.chip);
        if let Asset::Present(chip) = layers.chip {
            canvas.image(placement.chip, Arc::new(chip));
        }
        report.record(AssetKind::Photo, &layers.photo);
        if let Asset::Present(photo) = layers.photo {
            canvas.image(placement.photo, Arc::new(photo));
        }

        // 6. Edge mask.
        canvas.set_z(ZOrder::EdgeMask);
        for strip in self.edge_mask_strips() {
            canvas.rect(strip, Some(palette::WHITE), None);
        }

        // 7. Final stroke.
        canvas.set_z(ZOrder::CardStroke);
        canvas.rounded_rect(card, self.geometry.card_radius, None, Some(OUTER_STROKE));
        canvas.rounded_rect(
            card.inset(self.geometry.base_inset),
            (self.geometry.card_radius - self.geometry.base_inset).max(0.0),
            None,
            Some(INNER_STROKE),
        );

        canvas.set_z(previous_z);
        info!(
            fallback = report.used_fallback,
            drawn = report.drawn.len(),
            skipped = report.skipped.len(),
            "Card composited"
        );
        report
    }

    fn draw_shadow(&self, canvas: &mut PageCanvas, card: RectMm) {
        let (light, dark) = (SHADOW_GRAY.0 as f32, SHADOW_GRAY.1 as f32);
        for layer in 0..SHADOW_LAYERS {
            let t = layer as f32 / (SHADOW_LAYERS - 1) as f32;
            let spread = SHADOW_SPREAD * (1.0 - t);
            let level = (light + (dark - light) * t).round() as u8;
            let rect = RectMm::new(
                card.x - spread + SHADOW_OFFSET.0,
                card.y - spread + SHADOW_OFFSET.1,
                card.width + 2.0 * spread,
                card.height + 2.0 * spread,
            );
            canvas.rounded_rect(
                rect,
                self.geometry.card_radius + spread,
                Some(Rgb8::gray(level)),
                None,
            );
        }
        debug!(layers = SHADOW_LAYERS, "Shadow stack drawn");
    }

    /// Lower `watermark_band` of the card, inside the base inset.
    pub fn watermark_region(&self) -> RectMm {
        let card = self.geometry.card_rect();
        let inset = self.geometry.base_inset;
        let height = self.geometry.watermark_band * card.height - inset;
        RectMm::new(card.x + inset, card.bottom() - inset - height, card.width - 2.0 * inset, height)
    }

    /// Four white strips reaching `edge_mask_extent` beyond each side. They
    /// start past the shadow so it stays visible; the card bitmaps carry
    /// their own rounded-corner clip.
    pub fn edge_mask_strips(&self) -> [RectMm; 4] {
        let card = self.geometry.card_rect();
        let extent = self.geometry.edge_mask_extent;
        let clear = self.shadow_extent().min(extent);
        let depth = extent - clear;
        [
            // top, bottom
            RectMm::new(card.x - extent, card.y - extent, card.width + 2.0 * extent, depth),
            RectMm::new(card.x - extent, card.bottom() + clear, card.width + 2.0 * extent, depth),
            // left, right
            RectMm::new(card.x - extent, card.y - clear, depth, card.height + 2.0 * clear),
            RectMm::new(card.right() + clear, card.y - clear, depth, card.height + 2.0 * clear),
        ]
    }

    /// Card corner radius expressed in the pixel grid of `bitmap` placed over
    /// `rect`.
    fn corner_radius_px(&self, bitmap: &RgbaImage, rect: RectMm) -> f32 {
        let radius_mm = (self.geometry.card_radius - self.geometry.base_inset).max(0.0);
        radius_mm * bitmap.width() as f32 / rect.width.max(f32::EPSILON)
    }
}
