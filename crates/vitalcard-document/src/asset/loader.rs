// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Asset loader — turn image references into embeddable bitmaps.
//
// Three variants: plain, elliptically clipped and opacity-baked. None of them
// fails: every fetch, timeout or decode problem is logged and resolves to
// `Asset::Absent`, so one broken image only removes its own layer.

use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};
use tracing::{debug, instrument, warn};
use vitalcard_core::error::{Result, VitalcardError};

use crate::asset::fetch::AssetFetcher;
use crate::template::raster;

/// Pixel edge length used when an SVG asset has to be rasterised without a
/// target size.
const SVG_FALLBACK_EDGE_PX: u32 = 1024;

/// Outcome of resolving one visual element.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset<T> {
    Present(T),
    Absent,
}

impl<T> Asset<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_ref(&self) -> Asset<&T> {
        match self {
            Self::Present(value) => Asset::Present(value),
            Self::Absent => Asset::Absent,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Asset<U> {
        match self {
            Self::Present(value) => Asset::Present(f(value)),
            Self::Absent => Asset::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Asset<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Present(value),
            None => Self::Absent,
        }
    }
}

/// A bitmap whose alpha channel already carries a constant opacity.
///
/// Only [`bake_opacity`] produces one, and it only accepts raw sources, so a
/// baked bitmap can never be darkened twice.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedBitmap {
    image: RgbaImage,
    opacity: f32,
}

impl BakedBitmap {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

/// Fetches, decodes and shapes assets under a per-asset timeout.
pub struct AssetLoader<F> {
    fetcher: F,
    timeout: Duration,
}

impl<F: AssetFetcher> AssetLoader<F> {
    pub fn new(fetcher: F, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch under the timeout.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        if url.trim().is_empty() {
            return Err(VitalcardError::AssetFetch {
                url: String::new(),
                reason: "empty reference".into(),
            });
        }
        tokio::time::timeout(self.timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| VitalcardError::Timeout(self.timeout.as_millis() as u64))?
    }

    /// Fetch, then decode and shape on the blocking pool so concurrent loads
    /// do not serialise on the executor thread.
    async fn load_shaped<T, S>(&self, url: &str, shape: S) -> Asset<T>
    where
        T: Send + 'static,
        S: FnOnce(DynamicImage) -> T + Send + 'static,
    {
        let bytes = match self.fetch_bytes(url).await {
            Ok(bytes) => bytes,
            Err(err) => return absent(url, &err),
        };
        match tokio::task::spawn_blocking(move || decode_image(&bytes).map(shape)).await {
            Ok(Ok(value)) => Asset::Present(value),
            Ok(Err(err)) => absent(url, &err),
            Err(err) => {
                warn!(url = %short(url), error = %err, "Asset shaping task failed, layer omitted");
                Asset::Absent
            }
        }
    }

    /// Load a bitmap as-is.
    #[instrument(skip(self), fields(url = %short(url)))]
    pub async fn load_plain(&self, url: &str) -> Asset<RgbaImage> {
        self.load_shaped(url, |image| image.to_rgba8()).await
    }

    /// Load a bitmap shrunk, aspect kept, to fit within `max_width ×
    /// max_height` pixels.
    #[instrument(skip(self), fields(url = %short(url)))]
    pub async fn load_within(&self, url: &str, max_width: u32, max_height: u32) -> Asset<RgbaImage> {
        self.load_shaped(url, move |image| {
            downscale_to_fit(image.to_rgba8(), max_width, max_height)
        })
        .await
    }

    /// Load a bitmap cover-fitted into `width × height` pixels and clipped to
    /// the inscribed ellipse.
    #[instrument(skip(self), fields(url = %short(url)))]
    pub async fn load_elliptical(&self, url: &str, width: u32, height: u32) -> Asset<RgbaImage> {
        self.load_shaped(url, move |image| elliptical_from_image(&image, width, height))
            .await
    }

    /// Load a bitmap cover-fitted into `target × upscale` pixels with a
    /// constant `opacity` baked into its alpha channel.
    #[instrument(skip(self), fields(url = %short(url)))]
    pub async fn load_with_opacity(
        &self,
        url: &str,
        opacity: f32,
        target_width: u32,
        target_height: u32,
        upscale: f32,
    ) -> Asset<BakedBitmap> {
        self.load_shaped(url, move |image| {
            opacity_from_image(&image, opacity, target_width, target_height, upscale)
        })
        .await
    }
}

fn absent<T>(url: &str, err: &VitalcardError) -> Asset<T> {
    warn!(url = %short(url), error = %err, "Asset unavailable, layer omitted");
    Asset::Absent
}

/// Data URIs can be megabytes long; keep log fields readable.
fn short(url: &str) -> String {
    const MAX: usize = 64;
    if url.chars().count() <= MAX {
        url.to_string()
    } else {
        let head: String = url.chars().take(MAX).collect();
        format!("{head}…")
    }
}

/// Decode raster formats via `image`, falling back to SVG rasterisation.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    match image::load_from_memory(bytes) {
        Ok(image) => {
            debug!(
                width = image.width(),
                height = image.height(),
                "Asset decoded"
            );
            Ok(image)
        }
        Err(err) if raster::looks_like_svg(bytes) => {
            debug!(error = %err, "Raster decode failed, trying SVG");
            let markup = std::str::from_utf8(bytes)
                .map_err(|e| VitalcardError::AssetDecode(format!("SVG is not UTF-8: {e}")))?;
            let image = raster::rasterize_svg_fit(markup, SVG_FALLBACK_EDGE_PX, None)?;
            Ok(DynamicImage::ImageRgba8(image))
        }
        Err(err) => Err(VitalcardError::AssetDecode(format!(
            "failed to decode image: {err}"
        ))),
    }
}

// -- Bitmap shaping -------------------------------------------------------------

/// Scale `source` so it fully covers `width × height` (`scale = max(w/srcW,
/// h/srcH)`), centred, cropping the overflow. Never letterboxes.
///
/// The crop window is taken in source pixels before resampling, so memory
/// stays bounded by the source and the target whatever the aspect ratio.
pub fn cover_fit(source: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return RgbaImage::new(width, height);
    }

    let scale = (width as f32 / src_w as f32).max(height as f32 / src_h as f32);
    let crop_w = ((width as f32 / scale).round() as u32).clamp(1, src_w);
    let crop_h = ((height as f32 / scale).round() as u32).clamp(1, src_h);
    let x = (src_w - crop_w) / 2;
    let y = (src_h - crop_h) / 2;

    source
        .crop_imm(x, y, crop_w, crop_h)
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgba8()
}

/// Zero the alpha of every pixel outside the ellipse inscribed in the image,
/// with a one-pixel anti-aliased rim.
pub fn clip_to_ellipse(image: &mut RgbaImage) {
    let rx = image.width() as f32 / 2.0;
    let ry = image.height() as f32 / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let min_radius = rx.min(ry);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = (x as f32 + 0.5 - rx) / rx;
        let dy = (y as f32 + 0.5 - ry) / ry;
        let distance = (dx * dx + dy * dy).sqrt();
        let coverage = ((1.0 - distance) * min_radius + 0.5).clamp(0.0, 1.0);
        pixel.0[3] = (pixel.0[3] as f32 * coverage).round() as u8;
    }
}

/// Zero the alpha outside a rounded rectangle spanning the whole image, so a
/// square bitmap does not poke out past the card's rounded corners.
pub fn clip_to_rounded_rect(image: &mut RgbaImage, radius_px: f32) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let r = radius_px.min(w / 2.0).min(h / 2.0);
    if r <= 0.0 {
        return;
    }

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        // Distance into the corner zone, zero along the straight edges.
        let dx = (r - px).max(px - (w - r)).max(0.0);
        let dy = (r - py).max(py - (h - r)).max(0.0);
        if dx == 0.0 || dy == 0.0 {
            continue;
        }
        let coverage = (r - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        pixel.0[3] = (pixel.0[3] as f32 * coverage).round() as u8;
    }
}

/// Shrink `image` to fit within `max_width × max_height`, keeping its aspect
/// ratio. Smaller images are returned untouched.
pub fn downscale_to_fit(image: RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= max_width.max(1) && h <= max_height.max(1) {
        return image;
    }
    DynamicImage::ImageRgba8(image)
        .resize(max_width.max(1), max_height.max(1), FilterType::Triangle)
        .to_rgba8()
}

/// Cover-fit and elliptical clip of an already decoded image.
pub fn elliptical_from_image(source: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let mut fitted = cover_fit(source, width, height);
    clip_to_ellipse(&mut fitted);
    fitted
}

/// Multiply a constant alpha into every pixel of a raw source.
pub fn bake_opacity(source: RgbaImage, opacity: f32) -> BakedBitmap {
    let opacity = opacity.clamp(0.0, 1.0);
    let mut image = source;
    for pixel in image.pixels_mut() {
        pixel.0[3] = (pixel.0[3] as f32 * opacity).round() as u8;
    }
    BakedBitmap { image, opacity }
}

/// Cover-fit at `upscale ×` density, then bake `opacity`.
pub fn opacity_from_image(
    source: &DynamicImage,
    opacity: f32,
    target_width: u32,
    target_height: u32,
    upscale: f32,
) -> BakedBitmap {
    let upscale = if upscale.is_finite() && upscale > 0.0 {
        upscale
    } else {
        1.0
    };
    let width = ((target_width as f32 * upscale).round() as u32).max(1);
    let height = ((target_height as f32 * upscale).round() as u32).max(1);
    bake_opacity(cover_fit(source, width, height), opacity)
}
