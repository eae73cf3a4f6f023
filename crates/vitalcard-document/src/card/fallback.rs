// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fallback vector renderer — the card's base layer drawn from primitive
// shapes and text when no template capture is available.
//
// Positions are fractions of the card so the fields keep their relation to
// the overlays, which are placed by the same formulas either way.

use tracing::debug;
use vitalcard_core::config::RenderConfig;
use vitalcard_core::geometry::{Geometry, PointMm, RectMm};
use vitalcard_core::types::{DocumentRecord, EMPTY_FIELD, display_or_dash};

use crate::card::overlay::OverlayPlacement;
use crate::layout::text::fit_text;
use crate::pdf::canvas::{Align, FontFace, PageCanvas, Stroke, TextRun, palette};

/// Horizontal centre of the header text block, as a fraction of `Wc`.
const HEADER_CENTRE: f32 = 0.37;
/// Horizontal centre of the document/plan labels.
const LABEL_CENTRE: f32 = 0.45;
/// Identity number position.
const NUMBER_ORIGIN: (f32, f32) = (0.27, 0.47);
/// Second identity grid column; the first is aligned with the chip.
const SECOND_COLUMN: f32 = 0.36;
/// Caption baselines of the two grid rows.
const GRID_ROWS: [f32; 2] = [0.62, 0.80];
/// Caption baseline to value baseline.
const VALUE_DROP_MM: f32 = 2.6;

/// Draws the vector stand-in for a captured card template.
pub struct FallbackRenderer<'a> {
    geometry: &'a Geometry,
    config: &'a RenderConfig,
}

impl<'a> FallbackRenderer<'a> {
    pub fn new(geometry: &'a Geometry, config: &'a RenderConfig) -> Self {
        Self { geometry, config }
    }

    /// Draw the base layer at the canvas's current z.
    pub fn draw(&self, canvas: &mut PageCanvas, record: &DocumentRecord) {
        let card = self.geometry.card_rect();
        let base = card.inset(self.geometry.base_inset);
        let radius = (self.geometry.card_radius - self.geometry.base_inset).max(0.0);
        let placement = OverlayPlacement::compute(self.geometry);
        let (wc, hc) = (card.width, card.height);
        let at = |fx: f32, fy: f32| PointMm::new(card.x + fx * wc, card.y + fy * hc);

        // Two-tone background: the pale green body, then a white top band
        // whose lower corners are squared off again by a green strip.
        let split = card.y + self.geometry.fallback_top_band * hc;
        canvas.rounded_rect(base, radius, Some(palette::CARD_GREEN), None);
        canvas.rounded_rect(
            RectMm::new(base.x, base.y, base.width, split - base.y + radius),
            radius,
            Some(palette::WHITE),
            None,
        );
        canvas.rect(
            RectMm::new(base.x, split, base.width, radius),
            Some(palette::CARD_GREEN),
            None,
        );
        canvas.line(
            PointMm::new(base.x, split),
            PointMm::new(base.right(), split),
            Stroke::new(palette::INSTITUTION_GREEN, 0.35),
        );

        // Header, centred between the emblem and the logo.
        let header = at(HEADER_CENTRE, 0.0);
        let header_room =
            2.0 * (header.x - placement.emblem.right()).min(placement.logo.x - header.x) - 1.0;
        for (text, fy, size, face, color) in [
            (self.config.country.to_uppercase(), 0.09, 5.5, FontFace::Bold, palette::INK),
            (self.config.institution_short.clone(), 0.15, 7.5, FontFace::Bold, palette::INSTITUTION_GREEN),
            ("Assurance Maladie Obligatoire".to_string(), 0.21, 4.5, FontFace::Regular, palette::MUTED),
        ] {
            canvas.text(
                TextRun::new(fit_text(&text, size, face, header_room), header.x, at(0.0, fy).y, size, face)
                    .color(color)
                    .align(Align::Center),
            );
        }

        // Document type and plan labels, clear of the chip.
        let label = at(LABEL_CENTRE, 0.0);
        let label_room = 2.0 * (label.x - placement.chip.right() - 1.0);
        canvas.text(
            TextRun::new(
                fit_text("CARTE D'ASSURÉ MALADIE", 6.5, FontFace::Bold, label_room),
                label.x,
                at(0.0, 0.31).y,
                6.5,
                FontFace::Bold,
            )
            .color(palette::INSTITUTION_GREEN)
            .align(Align::Center),
        );
        canvas.text(
            TextRun::new(
                fit_text(
                    &format!("RÉGIME : {}", display_or_dash(&record.regime)).to_uppercase(),
                    5.5,
                    FontFace::Regular,
                    label_room,
                ),
                label.x,
                at(0.0, 0.37).y,
                5.5,
                FontFace::Regular,
            )
            .align(Align::Center),
        );

        // Identity number in Courier, stopping short of the photo.
        let number = at(NUMBER_ORIGIN.0, NUMBER_ORIGIN.1);
        canvas.text(TextRun::new(
            fit_text(
                display_or_dash(&record.insured_number),
                9.0,
                FontFace::MonoBold,
                placement.photo.x - 1.0 - number.x,
            ),
            number.x,
            number.y,
            9.0,
            FontFace::MonoBold,
        ));

        // Identity grid: caption above bold value.
        let sex = record
            .sex
            .as_deref()
            .map(display_or_dash)
            .unwrap_or(EMPTY_FIELD)
            .to_string();
        let columns = [
            (placement.chip.x, card.x + SECOND_COLUMN * wc - 1.0),
            (card.x + SECOND_COLUMN * wc, placement.photo.x - 1.0),
        ];
        let cells = [
            [("NOM", record.last_name.to_uppercase()), ("PRÉNOMS", record.first_names.clone())],
            [("NÉ(E) LE", record.birth_date.clone()), ("SEXE", sex)],
        ];
        for (row, fy) in cells.into_iter().zip(GRID_ROWS) {
            let caption_y = at(0.0, fy).y;
            for ((caption, value), (x, right)) in row.into_iter().zip(columns) {
                canvas.text(
                    TextRun::new(caption, x, caption_y, 4.0, FontFace::Regular).color(palette::MUTED),
                );
                canvas.text(TextRun::new(
                    fit_text(display_or_dash(&value), 6.0, FontFace::Bold, right - x),
                    x,
                    caption_y + VALUE_DROP_MM,
                    6.0,
                    FontFace::Bold,
                ));
            }
        }

        debug!(numero = %record.insured_number, "Fallback card base drawn");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::canvas::{Shape, ZOrder};

    fn record() -> DocumentRecord {
        DocumentRecord {
            insured_number: "001-012-198-2".into(),
            last_name: "Pellen-Lakoumba".into(),
            first_names: "GUEYLORD ASTED".into(),
            birth_date: "01/12/1982".into(),
            regime: "Secteur Privé".into(),
            ..DocumentRecord::default()
        }
    }

    fn drawn() -> PageCanvas {
        let geometry = Geometry::ID1_ON_A4;
        let config = RenderConfig::default();
        let mut canvas = PageCanvas::new(geometry);
        canvas.set_z(ZOrder::Base);
        FallbackRenderer::new(&geometry, &config).draw(&mut canvas, &record());
        canvas
    }

    #[test]
    fn shows_number_name_and_labels() {
        let canvas = drawn();
        assert!(canvas.has_text("001-012-198-2"));
        assert!(canvas.has_text("PELLEN-LAKOUMBA"));
        assert!(canvas.has_text("GUEYLORD ASTED"));
        assert!(canvas.has_text("RÉGIME : SECTEUR PRIVÉ"));
        assert!(canvas.has_text("CARTE D'ASSURÉ MALADIE"));
        assert!(canvas.has_text("CNAMGS"));
        // Missing sex prints the dash.
        assert!(canvas.has_text("—"));
    }

    #[test]
    fn number_is_monospaced() {
        let canvas = drawn();
        let number = canvas.texts().find(|r| r.text == "001-012-198-2").unwrap();
        assert_eq!(number.face, FontFace::MonoBold);
    }

    #[test]
    fn everything_stays_on_the_card_at_base_z() {
        let geometry = Geometry::ID1_ON_A4;
        let card = geometry.card_rect();
        let canvas = drawn();
        assert!(canvas.elements().iter().all(|e| e.z == ZOrder::Base));

        for element in canvas.elements() {
            match &element.shape {
                Shape::Rect { rect, .. } => assert!(card.contains(rect)),
                Shape::Text(run) => {
                    assert!(run.left_mm() >= card.x - 1e-3);
                    assert!(run.left_mm() + run.width_mm() <= card.right() + 1e-3);
                    assert!(run.origin.y > card.y && run.origin.y < card.bottom());
                }
                _ => {}
            }
        }
    }

    #[test]
    fn text_avoids_the_photo() {
        let geometry = Geometry::ID1_ON_A4;
        let photo = OverlayPlacement::compute(&geometry).photo;
        for run in drawn().texts() {
            let below_top = run.origin.y > photo.y;
            if below_top {
                assert!(run.left_mm() + run.width_mm() <= photo.x + 1e-3, "{} runs into the photo", run.text);
            }
        }
    }
}
