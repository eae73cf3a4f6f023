// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in card graphics — the contact chip and the watermark.
//
// Neither is caller-supplied. Both are drawn procedurally with `imageproc` so
// the crate ships no binary assets; they are raw sources and go through the
// same shaping (cover fit, opacity baking) as fetched images.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

const CHIP_GOLD: Rgba<u8> = Rgba([214, 178, 92, 255]);
const CHIP_HIGHLIGHT: Rgba<u8> = Rgba([236, 208, 137, 255]);
const CHIP_CONTACT: Rgba<u8> = Rgba([150, 116, 44, 255]);
const WATERMARK_GREEN: Rgba<u8> = Rgba([0, 122, 61, 255]);

/// Source resolution of the chip graphic.
pub const CHIP_SOURCE_SIZE: (u32, u32) = (264, 208);

/// Source resolution of the watermark graphic.
pub const WATERMARK_SOURCE_SIZE: (u32, u32) = (900, 480);

/// Fill a rounded rectangle: two crossing rectangles plus four corner discs.
fn fill_rounded_rect(image: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, r: u32, color: Rgba<u8>) {
    let r = r.min(w / 2).min(h / 2);
    let ri = r as i32;
    draw_filled_rect_mut(image, Rect::at(x + ri, y).of_size(w - 2 * r, h), color);
    draw_filled_rect_mut(image, Rect::at(x, y + ri).of_size(w, h - 2 * r), color);
    let (right, bottom) = (x + w as i32 - 1 - ri, y + h as i32 - 1 - ri);
    for (cx, cy) in [(x + ri, y + ri), (right, y + ri), (x + ri, bottom), (right, bottom)] {
        draw_filled_circle_mut(image, (cx, cy), ri, color);
    }
}

/// Segment drawn `thickness` pixels wide by stacking parallel 1px segments.
fn thick_segment(
    image: &mut RgbaImage,
    from: (f32, f32),
    to: (f32, f32),
    thickness: u32,
    color: Rgba<u8>,
) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);
    let (nx, ny) = (-dy / length, dx / length);
    let half = thickness as f32 / 2.0;
    let mut offset = -half;
    while offset <= half {
        draw_line_segment_mut(
            image,
            (from.0 + nx * offset, from.1 + ny * offset),
            (to.0 + nx * offset, to.1 + ny * offset),
            color,
        );
        offset += 0.5;
    }
}

/// The gold contact chip.
pub fn chip_graphic() -> DynamicImage {
    let (w, h) = CHIP_SOURCE_SIZE;
    let mut image = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    fill_rounded_rect(&mut image, 0, 0, w, h, 28, CHIP_GOLD);
    fill_rounded_rect(&mut image, 10, 10, w - 20, h / 3, 18, CHIP_HIGHLIGHT);

    let (wf, hf) = (w as f32, h as f32);
    // Contact separations: two horizontal rails, one vertical split, and the
    // central pad outline.
    for fraction in [1.0 / 3.0, 2.0 / 3.0] {
        thick_segment(&mut image, (0.0, hf * fraction), (wf * 0.34, hf * fraction), 6, CHIP_CONTACT);
        thick_segment(&mut image, (wf * 0.66, hf * fraction), (wf, hf * fraction), 6, CHIP_CONTACT);
    }
    thick_segment(&mut image, (wf / 2.0, 0.0), (wf / 2.0, hf * 0.25), 6, CHIP_CONTACT);
    thick_segment(&mut image, (wf / 2.0, hf * 0.75), (wf / 2.0, hf), 6, CHIP_CONTACT);

    let pad = [
        (wf * 0.34, hf * 0.25),
        (wf * 0.66, hf * 0.25),
        (wf * 0.66, hf * 0.75),
        (wf * 0.34, hf * 0.75),
    ];
    for i in 0..pad.len() {
        thick_segment(&mut image, pad[i], pad[(i + 1) % pad.len()], 6, CHIP_CONTACT);
    }

    DynamicImage::ImageRgba8(image)
}

/// The institutional watermark: concentric rings around a medical cross,
/// flanked by lighter rings. Drawn fully opaque; opacity is baked later.
pub fn watermark_graphic() -> DynamicImage {
    let (w, h) = WATERMARK_SOURCE_SIZE;
    let mut image = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    let (cx, cy) = (w as i32 / 2, h as i32 / 2);

    for radius in 178..=190 {
        draw_hollow_circle_mut(&mut image, (cx, cy), radius, WATERMARK_GREEN);
    }
    for radius in 150..=154 {
        draw_hollow_circle_mut(&mut image, (cx, cy), radius, WATERMARK_GREEN);
    }

    let arm = 110u32;
    let thickness = 40u32;
    draw_filled_rect_mut(
        &mut image,
        Rect::at(cx - arm as i32, cy - thickness as i32 / 2).of_size(2 * arm, thickness),
        WATERMARK_GREEN,
    );
    draw_filled_rect_mut(
        &mut image,
        Rect::at(cx - thickness as i32 / 2, cy - arm as i32).of_size(thickness, 2 * arm),
        WATERMARK_GREEN,
    );

    // Side rings repeat the motif towards the card edges.
    for offset in [-330, 330] {
        for radius in 96..=102 {
            draw_hollow_circle_mut(&mut image, (cx + offset, cy), radius, WATERMARK_GREEN);
        }
    }

    DynamicImage::ImageRgba8(image)
}
