// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — one call, one page.
//
// Template capture and every asset load run concurrently and are joined
// before compositing; each one that fails only removes its own layer. The
// page layout and the card are then drawn onto one canvas and serialised.

use std::path::{Path, PathBuf};

use chrono::Local;
use image::RgbaImage;
use tracing::{debug, info, instrument, warn};
use vitalcard_core::config::RenderConfig;
use vitalcard_core::error::Result;
use vitalcard_core::geometry::Geometry;
use vitalcard_core::types::{AssetSet, DocumentRecord, RenderOptions};

use crate::asset::builtin::{chip_graphic, watermark_graphic};
use crate::asset::fetch::{AssetFetcher, DefaultFetcher};
use crate::asset::loader::{Asset, AssetLoader, BakedBitmap, cover_fit, opacity_from_image};
use crate::card::compositor::{CardLayers, CompositeReport, Compositor};
use crate::card::overlay::{OverlayPlacement, pixel_size};
use crate::layout::page::{LayoutReport, PageLayout, draw_debug_grid};
use crate::pdf::canvas::PageCanvas;
use crate::pdf::writer::PdfWriter;
use crate::template::capture::{HIDDEN_TEMPLATE_NODES, NoTemplate, VectorSnapshotSource};

/// The drawn page before serialisation.
#[derive(Debug, Clone)]
pub struct Composition {
    pub canvas: PageCanvas,
    pub layout: LayoutReport,
    pub card: CompositeReport,
}

/// The finished document.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Single-page PDF.
    pub bytes: Vec<u8>,
    /// Where the PDF was written, when a filename was requested and the write
    /// succeeded.
    pub saved_to: Option<PathBuf>,
    /// Why the requested write failed. The bytes are still valid.
    pub save_error: Option<String>,
    pub layout: LayoutReport,
    pub card: CompositeReport,
}

/// Orchestrates asset resolution, layout, compositing and PDF output.
pub struct DocumentAssembler<F = DefaultFetcher, T = NoTemplate> {
    geometry: Geometry,
    config: RenderConfig,
    loader: AssetLoader<F>,
    template: T,
}

impl DocumentAssembler {
    /// Assets resolved by [`DefaultFetcher`]; the card base is always the
    /// vector fallback until a template is set.
    pub fn new(config: RenderConfig) -> Self {
        let timeout = config.asset_timeout();
        Self {
            geometry: Geometry::ID1_ON_A4,
            config,
            loader: AssetLoader::new(DefaultFetcher::new(), timeout),
            template: NoTemplate,
        }
    }
}

impl<F: AssetFetcher, T: VectorSnapshotSource> DocumentAssembler<F, T> {
    pub fn with_fetcher<G: AssetFetcher>(self, fetcher: G) -> DocumentAssembler<G, T> {
        DocumentAssembler {
            loader: AssetLoader::new(fetcher, self.config.asset_timeout()),
            geometry: self.geometry,
            config: self.config,
            template: self.template,
        }
    }

    pub fn with_template<U: VectorSnapshotSource>(self, template: U) -> DocumentAssembler<F, U> {
        DocumentAssembler {
            geometry: self.geometry,
            config: self.config,
            loader: self.loader,
            template,
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Resolve every layer and draw the page.
    #[instrument(skip_all, fields(numero = %record.insured_number))]
    pub async fn compose(
        &self,
        record: &DocumentRecord,
        assets: Option<&AssetSet>,
        options: &RenderOptions,
    ) -> Composition {
        let issued_on = options.issue_date();
        let generated_at = Local::now().naive_local();
        let empty = AssetSet::default();
        let assets = assets.unwrap_or(&empty);

        let placement = OverlayPlacement::compute(&self.geometry);
        let density = self.config.overlay_px_per_mm;
        let emblem_px = pixel_size(placement.emblem, density);
        let logo_px = pixel_size(placement.logo, density);
        let chip_px = pixel_size(placement.chip, density);
        let photo_px = pixel_size(placement.photo, density);
        let watermark_px = pixel_size(
            Compositor::new(&self.geometry, &self.config).watermark_region(),
            self.config.px_per_mm,
        );

        let (base, emblem, logo, photo, chip, watermark) = tokio::join!(
            self.template.render(&HIDDEN_TEMPLATE_NODES),
            self.load_overlay(assets.emblem.as_deref(), emblem_px),
            self.load_overlay(assets.logo.as_deref(), logo_px),
            self.load_photo(assets.photo.as_deref(), photo_px),
            self.builtin_chip(chip_px),
            self.builtin_watermark(watermark_px),
        );

        let layers = CardLayers {
            base,
            watermark,
            emblem,
            logo,
            chip,
            photo,
        };

        let mut canvas = PageCanvas::new(self.geometry);
        let layout = PageLayout::new(&self.geometry, &self.config).draw(
            &mut canvas,
            record,
            issued_on,
            generated_at,
        );
        let card = Compositor::new(&self.geometry, &self.config).composite(&mut canvas, record, layers);
        if options.debug_grid {
            draw_debug_grid(&mut canvas);
        }

        Composition { canvas, layout, card }
    }

    /// Build the page and serialise it to PDF bytes.
    pub async fn render(
        &self,
        record: &DocumentRecord,
        assets: Option<&AssetSet>,
        options: &RenderOptions,
    ) -> Vec<u8> {
        let options = RenderOptions {
            filename: None,
            ..options.clone()
        };
        self.generate(record, assets, &options).await.bytes
    }

    /// Build, serialise and, when `options.filename` is set, write the PDF.
    /// A failed write is reported in the artifact, never raised.
    pub async fn generate(
        &self,
        record: &DocumentRecord,
        assets: Option<&AssetSet>,
        options: &RenderOptions,
    ) -> Artifact {
        let Composition { canvas, layout, card } = self.compose(record, assets, options).await;

        let mut writer = PdfWriter::new(self.geometry);
        writer.set_title(format!("Attestation de droits {}", layout.reference));
        let bytes = writer.render(&canvas);
        info!(
            reference = %layout.reference,
            bytes = bytes.len(),
            fallback = card.used_fallback,
            "Attestation generated"
        );

        let (saved_to, save_error) = match &options.filename {
            Some(path) => match save(&bytes, path).await {
                Ok(()) => (Some(path.clone()), None),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Could not save attestation");
                    (None, Some(err.to_string()))
                }
            },
            None => (None, None),
        };

        Artifact {
            bytes,
            saved_to,
            save_error,
            layout,
            card,
        }
    }

    // -- Layer resolution ---------------------------------------------------------

    async fn load_overlay(&self, url: Option<&str>, max_px: (u32, u32)) -> Asset<RgbaImage> {
        match url {
            Some(url) => self.loader.load_within(url, max_px.0, max_px.1).await,
            None => Asset::Absent,
        }
    }

    async fn load_photo(&self, url: Option<&str>, px: (u32, u32)) -> Asset<RgbaImage> {
        match url {
            Some(url) => self.loader.load_elliptical(url, px.0, px.1).await,
            None => Asset::Absent,
        }
    }

    async fn builtin_chip(&self, px: (u32, u32)) -> Asset<RgbaImage> {
        let shaped = tokio::task::spawn_blocking(move || cover_fit(&chip_graphic(), px.0, px.1)).await;
        match shaped {
            Ok(chip) => Asset::Present(chip),
            Err(err) => {
                warn!(error = %err, "Chip graphic unavailable");
                Asset::Absent
            }
        }
    }

    async fn builtin_watermark(&self, px: (u32, u32)) -> Asset<BakedBitmap> {
        let opacity = self.config.watermark_opacity;
        let upscale = self.config.upscale;
        let baked = tokio::task::spawn_blocking(move || {
            opacity_from_image(&watermark_graphic(), opacity, px.0, px.1, upscale)
        })
        .await;
        match baked {
            Ok(baked) => {
                debug!(width = baked.image().width(), height = baked.image().height(), "Watermark baked");
                Asset::Present(baked)
            }
            Err(err) => {
                warn!(error = %err, "Watermark unavailable");
                Asset::Absent
            }
        }
    }
}

/// Write PDF bytes to `path`.
pub async fn save(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path.as_ref(), bytes).await?;
    info!("Wrote attestation PDF to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;
    use image::{ImageFormat, Rgba};
    use vitalcard_core::types::{AssetKind, CoverageEntry};

    use super::*;
    use crate::asset::fetch::MemoryFetcher;
    use crate::pdf::canvas::{PageElement, Shape, ZOrder};
    use crate::template::card_svg::CardTemplate;

    fn config() -> RenderConfig {
        RenderConfig {
            upscale: 1.0,
            px_per_mm: 4.0,
            overlay_px_per_mm: 4.0,
            asset_timeout_ms: 2_000,
            load_system_fonts: false,
            ..RenderConfig::default()
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            issued_on: NaiveDate::from_ymd_opt(2026, 3, 14),
            ..RenderOptions::default()
        }
    }

    fn example_record() -> DocumentRecord {
        serde_json::from_str(
            r#"{
                "numero": "001-012-198-2",
                "nom": "PELLEN-LAKOUMBA",
                "prenoms": "GUEYLORD ASTED",
                "dateNaissance": "01/12/1982",
                "regime": "Secteur Privé",
                "employeur": "ORGANÉUS GABON",
                "couvertures": [
                    { "type": "Consultation", "taux": "80%", "ticket": "20% à charge" }
                ]
            }"#,
        )
        .unwrap()
    }

    fn png(color: [u8; 4], w: u32, h: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(w, h, Rgba(color))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn memory_assets() -> (MemoryFetcher, AssetSet) {
        let fetcher = MemoryFetcher::new()
            .with("mem://emblem", png([0, 100, 0, 255], 64, 64))
            .with("mem://logo", png([0, 0, 120, 255], 200, 40))
            .with("mem://photo", png([150, 120, 100, 255], 60, 80));
        let assets = AssetSet {
            emblem: Some("mem://emblem".into()),
            logo: Some("mem://logo".into()),
            photo: Some("mem://photo".into()),
        };
        (fetcher, assets)
    }

    fn without_timestamps(canvas: &PageCanvas) -> Vec<PageElement> {
        canvas
            .elements()
            .iter()
            .filter(|e| !matches!(&e.shape, Shape::Text(run) if run.timestamp))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn example_scenario_produces_expected_page() {
        let assembler = DocumentAssembler::new(config());
        let composition = assembler.compose(&example_record(), None, &options()).await;
        let canvas = &composition.canvas;

        assert!(canvas.has_text("CAISSE NATIONALE D'ASSURANCE MALADIE ET DE GARANTIE SOCIALE"));
        assert!(canvas.has_text("ATTESTATION DE DROITS"));
        assert!(composition.layout.reference.starts_with("ATT-2026-"));
        assert!(canvas.has_text(&format!("Réf. : {}", composition.layout.reference)));

        assert!(composition.card.used_fallback);
        assert!(canvas.has_text("001-012-198-2"));
        assert!(canvas.has_text("PELLEN-LAKOUMBA"));

        assert_eq!(composition.layout.coverage_rows, 1);
        assert!(canvas.has_text("Consultation"));
        assert!(canvas.has_text("80%"));
        assert!(canvas.has_text("20% à charge"));
        assert!(canvas.has_text(&RenderConfig::default().footer_contact));
    }

    #[tokio::test]
    async fn unreachable_assets_still_yield_a_valid_page() {
        let assembler = DocumentAssembler::new(config());
        let assets = AssetSet {
            emblem: Some("/definitely/missing/emblem.png".into()),
            logo: Some("data:image/png;base64,@@@@".into()),
            photo: Some("blob:https://app.example/7f3a".into()),
        };
        let artifact = assembler
            .generate(&example_record(), Some(&assets), &options())
            .await;

        assert!(artifact.card.used_fallback);
        for kind in [AssetKind::Emblem, AssetKind::Logo, AssetKind::Photo, AssetKind::Template] {
            assert!(artifact.card.skipped.contains(&kind), "{kind} should be absent");
        }
        assert!(artifact.card.drawn.contains(&AssetKind::Chip));
        assert!(artifact.card.drawn.contains(&AssetKind::Watermark));

        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert!(artifact.bytes.len() > 1_000);
        assert!(artifact.bytes.len() < 2_000_000, "{} bytes", artifact.bytes.len());
        let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[tokio::test]
    async fn default_settings_keep_the_upscaled_watermark_within_size() {
        let config = RenderConfig {
            load_system_fonts: false,
            ..RenderConfig::default()
        };
        let assembler = DocumentAssembler::new(config);
        let composition = assembler.compose(&example_record(), None, &options()).await;
        let watermark_width = composition
            .canvas
            .elements()
            .iter()
            .filter(|e| e.z == ZOrder::Watermark)
            .find_map(|e| match &e.shape {
                Shape::Image(layer) => Some(layer.bitmap.width()),
                _ => None,
            })
            .unwrap();
        // 10 px/mm at 6x over an 85+ mm wide band.
        assert!(watermark_width > 5_000);

        let bytes = assembler.render(&example_record(), None, &options()).await;
        assert!(bytes.len() > 1_000);
        assert!(bytes.len() < 2_000_000, "{} bytes", bytes.len());

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let widest = doc
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter_map(|stream| stream.dict.get(b"Width").and_then(|v| v.as_i64()).ok())
            .max()
            .unwrap();
        assert_eq!(widest, i64::from(watermark_width));
    }

    #[tokio::test]
    async fn resolved_assets_become_overlays() {
        let (fetcher, assets) = memory_assets();
        let assembler = DocumentAssembler::new(config()).with_fetcher(fetcher);
        let composition = assembler
            .compose(&example_record(), Some(&assets), &options())
            .await;

        for kind in [AssetKind::Emblem, AssetKind::Logo, AssetKind::Photo, AssetKind::Chip] {
            assert!(composition.card.drawn.contains(&kind), "{kind} missing");
        }
        let images = composition
            .canvas
            .elements()
            .iter()
            .filter(|e| matches!(e.shape, Shape::Image(_)))
            .count();
        // watermark, emblem, logo, chip, photo
        assert_eq!(images, 5);
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_geometry() {
        let (fetcher, assets) = memory_assets();
        let assembler = DocumentAssembler::new(config()).with_fetcher(fetcher);
        let record = example_record();

        let first = assembler.compose(&record, Some(&assets), &options()).await;
        let second = assembler.compose(&record, Some(&assets), &options()).await;
        assert_eq!(without_timestamps(&first.canvas), without_timestamps(&second.canvas));
        assert_eq!(first.layout, second.layout);
    }

    #[tokio::test]
    async fn captured_template_replaces_fallback() {
        let cfg = config();
        let geometry = Geometry::ID1_ON_A4;
        let record = example_record();
        let source = CardTemplate::new(&geometry, &cfg).snapshot_source(&record);
        let assembler = DocumentAssembler::new(cfg.clone()).with_template(source);

        let composition = assembler.compose(&record, None, &options()).await;
        assert!(!composition.card.used_fallback);
        assert!(composition.card.drawn.contains(&AssetKind::Template));
        // The number is baked into the bitmap, not drawn as text.
        assert!(!composition.canvas.has_text("001-012-198-2"));
    }

    #[tokio::test]
    async fn many_coverages_stay_on_one_page() {
        let mut record = example_record();
        record.coverages = (0..30)
            .map(|i| CoverageEntry::new(format!("Acte {i}"), "70%", "30%"))
            .collect();
        let assembler = DocumentAssembler::new(config());
        let artifact = assembler.generate(&record, None, &options()).await;

        assert!(artifact.layout.hidden_coverages > 0);
        let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[tokio::test]
    async fn writes_requested_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attestation.pdf");
        let assembler = DocumentAssembler::new(config());
        let opts = RenderOptions {
            filename: Some(path.clone()),
            ..options()
        };

        let artifact = assembler.generate(&example_record(), None, &opts).await;
        assert_eq!(artifact.saved_to.as_deref(), Some(path.as_path()));
        assert!(artifact.save_error.is_none());
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
    }

    #[tokio::test]
    async fn failed_save_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let opts = RenderOptions {
            filename: Some(dir.path().join("missing").join("attestation.pdf")),
            ..options()
        };
        let artifact = DocumentAssembler::new(config())
            .generate(&example_record(), None, &opts)
            .await;
        assert!(artifact.saved_to.is_none());
        assert!(artifact.save_error.is_some());
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn debug_grid_is_optional() {
        let assembler = DocumentAssembler::new(config());
        let plain = assembler.compose(&example_record(), None, &options()).await;
        let grid = assembler
            .compose(
                &example_record(),
                None,
                &RenderOptions {
                    debug_grid: true,
                    ..options()
                },
            )
            .await;
        assert!(grid.canvas.elements().len() > plain.canvas.elements().len());
        assert!(!plain.canvas.has_text("100"));
        assert!(grid.canvas.has_text("100"));
    }
}
