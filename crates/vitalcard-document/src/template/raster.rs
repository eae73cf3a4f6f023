// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SVG rasterisation through resvg.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use vitalcard_core::error::{Result, VitalcardError};

pub type FontDatabase = usvg::fontdb::Database;

/// Whether `bytes` start like an SVG document.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// A font database populated from the host's installed fonts.
pub fn system_fonts() -> Arc<FontDatabase> {
    let mut db = FontDatabase::new();
    db.load_system_fonts();
    Arc::new(db)
}

fn parse(markup: &str, fonts: Option<Arc<FontDatabase>>) -> Result<usvg::Tree> {
    let mut options = usvg::Options::default();
    if let Some(fonts) = fonts {
        options.fontdb = fonts;
    }
    usvg::Tree::from_str(markup, &options)
        .map_err(|e| VitalcardError::TemplateCapture(format!("SVG parse failed: {e}")))
}

fn render_tree(tree: &usvg::Tree, width: u32, height: u32) -> Result<RgbaImage> {
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        VitalcardError::TemplateCapture(format!("cannot allocate {width}x{height} canvas"))
    })?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha.
    let mut image = RgbaImage::new(width, height);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    Ok(image)
}

/// Rasterise `markup` stretched onto exactly `width × height` pixels.
pub fn rasterize_svg(
    markup: &str,
    width: u32,
    height: u32,
    fonts: Option<Arc<FontDatabase>>,
) -> Result<RgbaImage> {
    let tree = parse(markup, fonts)?;
    render_tree(&tree, width.max(1), height.max(1))
}

/// Rasterise `markup` at its own aspect ratio, longest edge `max_edge` pixels.
pub fn rasterize_svg_fit(
    markup: &str,
    max_edge: u32,
    fonts: Option<Arc<FontDatabase>>,
) -> Result<RgbaImage> {
    let tree = parse(markup, fonts)?;
    let size = tree.size();
    let scale = max_edge as f32 / size.width().max(size.height());
    let width = ((size.width() * scale).round() as u32).max(1);
    let height = ((size.height() * scale).round() as u32).max(1);
    render_tree(&tree, width, height)
}
