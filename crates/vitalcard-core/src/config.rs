// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalcardError};

/// Tunable rendering settings. The physical layout contract is not part of
/// this; see [`crate::Geometry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pixel-density multiplier for the template capture and the watermark.
    pub upscale: f32,
    /// Base raster density of the captured card, in pixels per millimetre.
    pub px_per_mm: f32,
    /// Raster density of the overlay bitmaps (emblem, logo, chip, photo).
    pub overlay_px_per_mm: f32,
    /// Constant alpha baked into the watermark.
    pub watermark_opacity: f32,
    /// Per-asset fetch timeout, in milliseconds.
    pub asset_timeout_ms: u64,
    /// Load system fonts so the SVG template's text can be rasterised.
    pub load_system_fonts: bool,
    /// Country line of the page and card headers.
    pub country: String,
    /// Issuing institution, printed in the headers.
    pub institution: String,
    /// Short institution name, used on the card.
    pub institution_short: String,
    /// Contact line printed in the page footer.
    pub footer_contact: String,
    /// Place of issue in the signature block.
    pub issuing_city: String,
    /// Signatory title in the signature block.
    pub signatory: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            upscale: 6.0,
            px_per_mm: 10.0,
            overlay_px_per_mm: 12.0,
            watermark_opacity: 0.12,
            asset_timeout_ms: 8_000,
            load_system_fonts: true,
            country: "RÉPUBLIQUE GABONAISE".into(),
            institution: "CAISSE NATIONALE D'ASSURANCE MALADIE ET DE GARANTIE SOCIALE".into(),
            institution_short: "CNAMGS".into(),
            footer_contact: "CNAMGS — B.P. 15 550 Libreville — Tél. : (+241) 01 44 77 00 — www.cnamgs.ga"
                .into(),
            issuing_city: "Libreville".into(),
            signatory: "Le Directeur Général".into(),
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file. Missing keys take their default.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce empty rasters or nonsensical alpha.
    pub fn validate(&self) -> Result<()> {
        if !(self.upscale.is_finite() && self.upscale > 0.0) {
            return Err(VitalcardError::InvalidConfig(format!(
                "upscale must be positive, got {}",
                self.upscale
            )));
        }
        if !(self.px_per_mm.is_finite() && self.px_per_mm > 0.0) {
            return Err(VitalcardError::InvalidConfig(format!(
                "px_per_mm must be positive, got {}",
                self.px_per_mm
            )));
        }
        if !(self.overlay_px_per_mm.is_finite() && self.overlay_px_per_mm > 0.0) {
            return Err(VitalcardError::InvalidConfig(format!(
                "overlay_px_per_mm must be positive, got {}",
                self.overlay_px_per_mm
            )));
        }
        if !(0.0..=1.0).contains(&self.watermark_opacity) {
            return Err(VitalcardError::InvalidConfig(format!(
                "watermark_opacity must be within 0..=1, got {}",
                self.watermark_opacity
            )));
        }
        Ok(())
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }
}
