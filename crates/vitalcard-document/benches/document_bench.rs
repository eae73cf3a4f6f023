// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the vitalcard-document crate: the opacity bake
// of the watermark and a full fallback-card page composition.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgba, RgbaImage};

use vitalcard_core::{CoverageEntry, DocumentRecord, RenderConfig, RenderOptions};
use vitalcard_document::DocumentAssembler;
use vitalcard_document::asset::loader::opacity_from_image;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Cover-fit and bake a 900x480 source at the default 6x upscale into the
/// watermark region (854x395 px before upscaling at 10 px/mm).
fn bench_watermark_bake(c: &mut Criterion) {
    let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(900, 480, Rgba([0, 122, 61, 255])));

    c.bench_function("watermark_bake (6x)", |b| {
        b.iter(|| {
            let baked = opacity_from_image(black_box(&source), 0.12, 854, 395, 6.0);
            black_box(baked);
        });
    });
}

/// Compose and serialise a page with no assets and the vector fallback card.
/// Upscale is kept at 1x so the run measures layout and PDF output rather
/// than raster work.
fn bench_fallback_page(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let config = RenderConfig {
        upscale: 1.0,
        load_system_fonts: false,
        ..RenderConfig::default()
    };
    let assembler = DocumentAssembler::new(config);
    let record = DocumentRecord {
        insured_number: "001-012-198-2".into(),
        last_name: "PELLEN-LAKOUMBA".into(),
        first_names: "GUEYLORD ASTED".into(),
        coverages: vec![CoverageEntry::new("Consultation", "80%", "20% à charge")],
        ..DocumentRecord::default()
    };
    let options = RenderOptions::default();

    c.bench_function("fallback_page (no assets)", |b| {
        b.iter(|| {
            let bytes = runtime.block_on(assembler.render(black_box(&record), None, &options));
            black_box(bytes);
        });
    });
}

criterion_group!(benches, bench_watermark_bake, bench_fallback_page);
criterion_main!(benches);
