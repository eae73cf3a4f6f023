// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout engine.
//
// Sections below the title band follow a running vertical cursor. Sections
// spanning the full width start at `max(cursor, card bottom + gap)` so they
// never collide with the card, which the compositor places independently.
// The bottom block (validity, warning, signature) is measured up front so the
// coverage table knows how many rows it may use.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, instrument, warn};
use vitalcard_core::config::RenderConfig;
use vitalcard_core::geometry::{Geometry, PointMm, RectMm};
use vitalcard_core::types::{CoverageEntry, DATE_FORMAT, DocumentRecord, EMPTY_FIELD, display_or_dash};

use crate::layout::attestation_reference;
use crate::layout::primitives::{BAND_HEIGHT, BOX_HEIGHT, label_value_box, titled_band};
use crate::layout::text::{fit_text, wrap_text};
use crate::pdf::canvas::{Align, FontFace, PageCanvas, Rgb8, Stroke, TextRun, ZOrder, palette};

const HEADER_HEIGHT: f32 = 18.0;
const TITLE_TOP: f32 = 38.0;
const TITLE_HEIGHT: f32 = 14.0;
const SECTION_GAP: f32 = 4.0;
/// Clearance between the card's bottom edge and the next full-width section.
const CARD_GAP: f32 = 6.0;
const GUTTER: f32 = 2.0;
const TABLE_HEADER_HEIGHT: f32 = 7.0;
const ROW_HEIGHT: f32 = 6.5;
const WARNING_TEXT_SIZE: f32 = 7.5;
const WARNING_LINE_HEIGHT: f32 = 3.4;
const SIGNATURE_HEIGHT: f32 = 20.0;
const FOOTER_HEIGHT: f32 = 10.0;

/// Fractions of the table width given to benefit, rate and copayment.
const COLUMN_SHARES: [f32; 3] = [0.5, 0.2, 0.3];

const WARNING_TEXT: &str = "Cette attestation est strictement personnelle. Elle doit être \
     présentée avec une pièce d'identité lors de chaque prise en charge. Toute fraude ou \
     falsification expose son auteur à des poursuites.";

/// A laid-out block of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub name: &'static str,
    pub rect: RectMm,
}

/// What the layout pass decided, for logging and inspection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutReport {
    /// Reference printed in the title band.
    pub reference: String,
    /// Coverage rows the table has room for.
    pub coverage_capacity: usize,
    /// Coverage entries actually drawn as rows.
    pub coverage_rows: usize,
    /// Entries folded into the trailing "… et N autres" row.
    pub hidden_coverages: usize,
    /// One rectangle per drawn table row, including the overflow row. An
    /// empty list has none.
    pub row_rects: Vec<RectMm>,
    /// Page blocks in drawing order.
    pub sections: Vec<Section>,
}

impl LayoutReport {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// Lays out the page around the card.
pub struct PageLayout<'a> {
    geometry: &'a Geometry,
    config: &'a RenderConfig,
}

impl<'a> PageLayout<'a> {
    pub fn new(geometry: &'a Geometry, config: &'a RenderConfig) -> Self {
        Self { geometry, config }
    }

    fn left(&self) -> f32 {
        self.geometry.page_margin
    }

    fn width(&self) -> f32 {
        self.geometry.page_width - 2.0 * self.geometry.page_margin
    }

    fn right(&self) -> f32 {
        self.geometry.page_width - self.geometry.page_margin
    }

    /// Draw every page section for `record`. `generated_at` only feeds the
    /// footer timestamp.
    #[instrument(skip_all, fields(numero = %record.insured_number, coverages = record.coverages.len()))]
    pub fn draw(
        &self,
        canvas: &mut PageCanvas,
        record: &DocumentRecord,
        issued_on: NaiveDate,
        generated_at: NaiveDateTime,
    ) -> LayoutReport {
        canvas.set_z(ZOrder::Page);
        let mut report = LayoutReport {
            reference: attestation_reference(record, issued_on),
            ..LayoutReport::default()
        };

        self.draw_header(canvas, &mut report);
        self.draw_title(canvas, &mut report);

        let mut cursor = (TITLE_TOP + TITLE_HEIGHT + SECTION_GAP).max(self.geometry.card_top);
        cursor = self.draw_identity(canvas, record, cursor, &mut report);

        let card_bottom = self.geometry.card_rect().bottom();
        cursor = cursor.max(card_bottom + CARD_GAP);

        let warning_lines = wrap_text(
            WARNING_TEXT,
            WARNING_TEXT_SIZE,
            FontFace::Regular,
            self.width() - 8.0,
        );
        let bottom_block = self.bottom_block_height(warning_lines.len());
        let footer_top = self.geometry.page_height - self.geometry.page_margin - FOOTER_HEIGHT;
        let table_limit = footer_top - bottom_block;

        cursor = self.draw_coverages(canvas, &record.coverages, cursor, table_limit, &mut report);

        cursor = self.draw_validity(canvas, record, issued_on, cursor + SECTION_GAP, &mut report);
        cursor = self.draw_warning(canvas, &warning_lines, cursor + SECTION_GAP, &mut report);
        let reference = report.reference.clone();
        self.draw_signature(canvas, issued_on, &reference, cursor + SECTION_GAP, &mut report);
        self.draw_footer(canvas, generated_at, footer_top, &mut report);

        debug!(
            reference = %report.reference,
            rows = report.coverage_rows,
            capacity = report.coverage_capacity,
            hidden = report.hidden_coverages,
            "Page laid out"
        );
        report
    }

    // -- Sections ---------------------------------------------------------------

    fn draw_header(&self, canvas: &mut PageCanvas, report: &mut LayoutReport) {
        let band = RectMm::new(self.left(), self.geometry.page_margin, self.width(), HEADER_HEIGHT);
        canvas.rect(band, Some(palette::INSTITUTION_GREEN), None);
        canvas.rect(
            RectMm::new(band.x, band.bottom(), band.width, 1.0),
            Some(palette::GOLD),
            None,
        );

        let centre = band.center().x;
        let max = band.width - 8.0;
        canvas.text(
            TextRun::new(
                fit_text(&self.config.country.to_uppercase(), 9.0, FontFace::Bold, max),
                centre,
                band.y + 6.5,
                9.0,
                FontFace::Bold,
            )
            .color(palette::WHITE)
            .align(Align::Center),
        );
        canvas.text(
            TextRun::new(
                fit_text(&self.config.institution, 8.0, FontFace::Bold, max),
                centre,
                band.y + 11.5,
                8.0,
                FontFace::Bold,
            )
            .color(palette::WHITE)
            .align(Align::Center),
        );
        canvas.text(
            TextRun::new(
                fit_text(&self.config.institution_short, 7.0, FontFace::Regular, max),
                centre,
                band.y + 15.5,
                7.0,
                FontFace::Regular,
            )
            .color(palette::WHITE)
            .align(Align::Center),
        );

        report.sections.push(Section {
            name: "header",
            rect: RectMm::new(band.x, band.y, band.width, HEADER_HEIGHT + 1.0),
        });
    }

    fn draw_title(&self, canvas: &mut PageCanvas, report: &mut LayoutReport) {
        let band = RectMm::new(self.left(), TITLE_TOP, self.width(), TITLE_HEIGHT);
        canvas.rect(band, Some(palette::PALE_GREEN), None);
        canvas.rect(
            RectMm::new(band.x, band.y, 2.0, band.height),
            Some(palette::INSTITUTION_GREEN),
            None,
        );

        canvas.text(
            TextRun::new("ATTESTATION DE DROITS", band.x + 5.0, band.y + 7.5, 14.0, FontFace::Bold)
                .color(palette::INSTITUTION_GREEN),
        );
        canvas.text(
            TextRun::new(
                "Assurance Maladie Obligatoire",
                band.x + 5.0,
                band.y + 12.0,
                7.5,
                FontFace::Italic,
            )
            .color(palette::MUTED),
        );
        canvas.text(
            TextRun::new(
                format!("Réf. : {}", report.reference),
                band.right() - 3.0,
                band.y + 7.5,
                8.0,
                FontFace::MonoBold,
            )
            .align(Align::Right),
        );

        report.sections.push(Section { name: "title", rect: band });
    }

    /// Identity grid in the column left of the card.
    fn draw_identity(
        &self,
        canvas: &mut PageCanvas,
        record: &DocumentRecord,
        top: f32,
        report: &mut LayoutReport,
    ) -> f32 {
        let x = self.left();
        let width = self.geometry.card_x() - 5.0 - x;
        let mut y = titled_band(canvas, x, top, width, "Identité de l'assuré") + GUTTER;

        let column = (width - GUTTER) / 2.0;
        let age_sex = age_and_sex(record);
        let rows: [[(&str, &str); 2]; 4] = [
            [
                ("N° d'assuré", record.insured_number.as_str()),
                ("Statut", record.status_or_default()),
            ],
            [
                ("Nom", record.last_name.as_str()),
                ("Prénoms", record.first_names.as_str()),
            ],
            [
                ("Date de naissance", record.birth_date.as_str()),
                ("Âge / Sexe", age_sex.as_str()),
            ],
            [
                ("Régime", record.regime.as_str()),
                ("Qualité", record.title.as_deref().unwrap_or("Assuré principal")),
            ],
        ];

        for row in rows {
            for (i, (label, value)) in row.into_iter().enumerate() {
                let rect = RectMm::new(x + i as f32 * (column + GUTTER), y, column, BOX_HEIGHT);
                label_value_box(canvas, rect, label, value);
            }
            y += BOX_HEIGHT + GUTTER;
        }

        let bottom = y - GUTTER;
        report.sections.push(Section {
            name: "identity",
            rect: RectMm::new(x, top, width, bottom - top),
        });
        bottom + SECTION_GAP
    }

    /// Coverage table. Rows never pass `limit`; extra entries collapse into a
    /// final "… et N autres prestations" row.
    fn draw_coverages(
        &self,
        canvas: &mut PageCanvas,
        entries: &[CoverageEntry],
        top: f32,
        limit: f32,
        report: &mut LayoutReport,
    ) -> f32 {
        let (x, width) = (self.left(), self.width());
        let header_top = titled_band(canvas, x, top, width, "Taux de couverture") + GUTTER;

        let columns = column_bounds(x, width);
        let header = RectMm::new(x, header_top, width, TABLE_HEADER_HEIGHT);
        canvas.rect(header, Some(palette::INSTITUTION_GREEN), None);
        for ((cx, cw), title) in columns.iter().zip(["Prestation", "Taux", "Ticket modérateur"]) {
            canvas.text(
                TextRun::new(
                    fit_text(title, 7.5, FontFace::Bold, cw - 4.0),
                    cx + 2.0,
                    header.y + 4.7,
                    7.5,
                    FontFace::Bold,
                )
                .color(palette::WHITE),
            );
        }

        let rows_top = header.bottom();
        let capacity = (((limit - rows_top) / ROW_HEIGHT).floor().max(1.0)) as usize;
        report.coverage_capacity = capacity;

        let (shown, hidden) = if entries.len() > capacity {
            (&entries[..capacity - 1], entries.len() - (capacity - 1))
        } else {
            (entries, 0)
        };
        if hidden > 0 {
            warn!(
                total = entries.len(),
                capacity,
                hidden,
                "Coverage list exceeds the page, truncating"
            );
        }

        let mut y = rows_top;
        for (index, entry) in shown.iter().enumerate() {
            let row = RectMm::new(x, y, width, ROW_HEIGHT);
            self.table_row(canvas, row, index);
            let cells = [&entry.benefit_type, &entry.coverage_rate, &entry.copayment];
            for (column, ((cx, cw), value)) in columns.iter().zip(cells).enumerate() {
                // The rate column is emphasised.
                let face = if column == 1 {
                    FontFace::Bold
                } else {
                    FontFace::Regular
                };
                canvas.text(TextRun::new(
                    fit_text(display_or_dash(value), 8.0, face, cw - 4.0),
                    cx + 2.0,
                    row.y + 4.4,
                    8.0,
                    face,
                ));
            }
            report.row_rects.push(row);
            y = row.bottom();
        }
        report.coverage_rows = shown.len();
        report.hidden_coverages = hidden;

        if hidden > 0 {
            let row = RectMm::new(x, y, width, ROW_HEIGHT);
            self.table_row(canvas, row, shown.len());
            canvas.text(
                TextRun::new(
                    format!("… et {hidden} autres prestations"),
                    x + 2.0,
                    row.y + 4.4,
                    8.0,
                    FontFace::Italic,
                )
                .color(palette::MUTED),
            );
            report.row_rects.push(row);
            y = row.bottom();
        } else if entries.is_empty() {
            // A note under the header, not a table row.
            canvas.text(
                TextRun::new("Aucune prestation renseignée", x + 2.0, y + 4.4, 8.0, FontFace::Italic)
                    .color(palette::MUTED),
            );
            y += ROW_HEIGHT;
        }

        report.sections.push(Section {
            name: "coverage",
            rect: RectMm::new(x, top, width, y - top),
        });
        y
    }

    fn table_row(&self, canvas: &mut PageCanvas, row: RectMm, index: usize) {
        let fill: Option<Rgb8> = (index % 2 == 1).then_some(palette::BOX_FILL);
        canvas.rect(row, fill, None);
        canvas.line(
            PointMm::new(row.x, row.bottom()),
            PointMm::new(row.right(), row.bottom()),
            Stroke::new(palette::BOX_BORDER, 0.2),
        );
    }

    fn draw_validity(
        &self,
        canvas: &mut PageCanvas,
        record: &DocumentRecord,
        issued_on: NaiveDate,
        top: f32,
        report: &mut LayoutReport,
    ) -> f32 {
        let (x, width) = (self.left(), self.width());
        let y = titled_band(canvas, x, top, width, "Période de validité") + GUTTER;

        let (start, end) = record.validity_window(issued_on);
        let issued = issued_on.format(DATE_FORMAT).to_string();
        let boxes = [
            ("Début de validité", start.as_str()),
            ("Fin de validité", end.as_str()),
            ("Date d'émission", issued.as_str()),
            ("Employeur", record.employer.as_str()),
        ];
        let box_width = (width - 3.0 * GUTTER) / 4.0;
        for (i, (label, value)) in boxes.into_iter().enumerate() {
            let rect = RectMm::new(x + i as f32 * (box_width + GUTTER), y, box_width, BOX_HEIGHT);
            label_value_box(canvas, rect, label, value);
        }

        let bottom = y + BOX_HEIGHT;
        report.sections.push(Section {
            name: "validity",
            rect: RectMm::new(x, top, width, bottom - top),
        });
        bottom
    }

    fn draw_warning(
        &self,
        canvas: &mut PageCanvas,
        lines: &[String],
        top: f32,
        report: &mut LayoutReport,
    ) -> f32 {
        let rect = RectMm::new(self.left(), top, self.width(), warning_height(lines.len()));
        canvas.rounded_rect(
            rect,
            1.5,
            Some(palette::WARNING_FILL),
            Some(Stroke::new(palette::WARNING_BORDER, 0.3)),
        );
        canvas.text(
            TextRun::new("IMPORTANT", rect.x + 4.0, rect.y + 4.5, 8.0, FontFace::Bold)
                .color(palette::WARNING_BORDER),
        );
        for (i, line) in lines.iter().enumerate() {
            canvas.text(TextRun::new(
                line.clone(),
                rect.x + 4.0,
                rect.y + 8.5 + i as f32 * WARNING_LINE_HEIGHT,
                WARNING_TEXT_SIZE,
                FontFace::Regular,
            ));
        }

        report.sections.push(Section { name: "warning", rect });
        rect.bottom()
    }

    fn draw_signature(
        &self,
        canvas: &mut PageCanvas,
        issued_on: NaiveDate,
        reference: &str,
        top: f32,
        report: &mut LayoutReport,
    ) {
        let rect = RectMm::new(self.left(), top, self.width(), SIGNATURE_HEIGHT);
        let column_x = self.right() - 70.0;

        canvas.text(
            TextRun::new(
                format!("Attestation N° {reference}"),
                rect.x,
                rect.y + 4.5,
                7.5,
                FontFace::Regular,
            )
            .color(palette::MUTED),
        );
        canvas.text(TextRun::new(
            format!(
                "Fait à {}, le {}",
                self.config.issuing_city,
                issued_on.format(DATE_FORMAT)
            ),
            column_x,
            rect.y + 4.5,
            8.5,
            FontFace::Regular,
        ));
        canvas.text(TextRun::new(
            self.config.signatory.clone(),
            column_x,
            rect.y + 9.0,
            8.5,
            FontFace::Bold,
        ));
        canvas.line(
            PointMm::new(column_x, rect.bottom() - 1.5),
            PointMm::new(self.right(), rect.bottom() - 1.5),
            Stroke::new(palette::MUTED, 0.2),
        );

        report.sections.push(Section { name: "signature", rect });
    }

    fn draw_footer(
        &self,
        canvas: &mut PageCanvas,
        generated_at: NaiveDateTime,
        top: f32,
        report: &mut LayoutReport,
    ) {
        let rect = RectMm::new(self.left(), top, self.width(), FOOTER_HEIGHT);
        canvas.line(
            PointMm::new(rect.x, rect.y),
            PointMm::new(rect.right(), rect.y),
            Stroke::new(palette::INSTITUTION_GREEN, 0.4),
        );
        let centre = rect.center().x;
        canvas.text(
            TextRun::new(
                fit_text(&self.config.footer_contact, 7.0, FontFace::Regular, rect.width),
                centre,
                rect.y + 4.5,
                7.0,
                FontFace::Regular,
            )
            .color(palette::MUTED)
            .align(Align::Center),
        );
        canvas.text(
            TextRun::new(
                format!(
                    "Document généré le {} à {}",
                    generated_at.format(DATE_FORMAT),
                    generated_at.format("%H:%M")
                ),
                centre,
                rect.y + 8.5,
                6.5,
                FontFace::Italic,
            )
            .color(palette::MUTED)
            .align(Align::Center)
            .timestamp(),
        );

        report.sections.push(Section { name: "footer", rect });
    }

    /// Height of validity + warning + signature, with the gaps before each.
    fn bottom_block_height(&self, warning_lines: usize) -> f32 {
        let validity = BAND_HEIGHT + GUTTER + BOX_HEIGHT;
        SECTION_GAP + validity + SECTION_GAP + warning_height(warning_lines) + SECTION_GAP + SIGNATURE_HEIGHT
    }
}

fn warning_height(lines: usize) -> f32 {
    7.0 + lines as f32 * WARNING_LINE_HEIGHT
}

fn column_bounds(x: f32, width: f32) -> [(f32, f32); 3] {
    let mut bounds = [(0.0, 0.0); 3];
    let mut left = x;
    for (bound, share) in bounds.iter_mut().zip(COLUMN_SHARES) {
        *bound = (left, width * share);
        left += width * share;
    }
    bounds
}

fn age_and_sex(record: &DocumentRecord) -> String {
    let age = record.age.as_deref().map(str::trim).filter(|a| !a.is_empty());
    let sex = record.sex.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (age, sex) {
        (None, None) => EMPTY_FIELD.to_string(),
        (age, sex) => format!("{} / {}", age.unwrap_or(EMPTY_FIELD), sex.unwrap_or(EMPTY_FIELD)),
    }
}

/// Millimetre grid over the whole page: light lines every 5 mm, darker
/// labelled lines every 10 mm. Drawn above everything else.
pub fn draw_debug_grid(canvas: &mut PageCanvas) {
    let (width, height) = (canvas.geometry().page_width, canvas.geometry().page_height);
    let previous = canvas.z();
    canvas.set_z(ZOrder::DebugGrid);

    let light = Stroke::new(Rgb8::gray(220), 0.05);
    let dark = Stroke::new(Rgb8::gray(160), 0.1);

    let mut mm = 0u32;
    while mm as f32 <= width {
        let x = mm as f32;
        let major = mm % 10 == 0;
        canvas.line(PointMm::new(x, 0.0), PointMm::new(x, height), if major { dark } else { light });
        if major && mm > 0 {
            canvas.text(
                TextRun::new(mm.to_string(), x + 0.4, 2.5, 4.0, FontFace::Regular).color(Rgb8::gray(120)),
            );
        }
        mm += 5;
    }

    let mut mm = 0u32;
    while mm as f32 <= height {
        let y = mm as f32;
        let major = mm % 10 == 0;
        canvas.line(PointMm::new(0.0, y), PointMm::new(width, y), if major { dark } else { light });
        if major && mm > 0 {
            canvas.text(
                TextRun::new(mm.to_string(), 0.6, y - 0.4, 4.0, FontFace::Regular).color(Rgb8::gray(120)),
            );
        }
        mm += 5;
    }

    canvas.set_z(previous);
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::pdf::canvas::Shape;

    fn issued() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn generated() -> NaiveDateTime {
        issued().and_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap())
    }

    fn record_with(coverages: usize) -> DocumentRecord {
        DocumentRecord {
            insured_number: "001-012-198-2".into(),
            last_name: "PELLEN-LAKOUMBA".into(),
            first_names: "GUEYLORD ASTED".into(),
            birth_date: "01/12/1982".into(),
            regime: "Secteur Privé".into(),
            employer: "ORGANÉUS GABON".into(),
            coverages: (0..coverages)
                .map(|i| CoverageEntry::new(format!("Prestation {i}"), "80%", "20% à charge"))
                .collect(),
            ..DocumentRecord::default()
        }
    }

    fn lay_out(record: &DocumentRecord) -> (PageCanvas, LayoutReport) {
        let geometry = Geometry::ID1_ON_A4;
        let config = RenderConfig::default();
        let mut canvas = PageCanvas::new(geometry);
        let report = PageLayout::new(&geometry, &config).draw(&mut canvas, record, issued(), generated());
        (canvas, report)
    }

    fn assert_rows_disjoint(rows: &[RectMm]) {
        for pair in rows.windows(2) {
            assert!(pair[0].bottom() <= pair[1].y + 1e-4, "rows overlap: {pair:?}");
        }
    }

    #[test]
    fn row_count_matches_input_length() {
        for n in [0usize, 1, 6, 8] {
            let (canvas, report) = lay_out(&record_with(n));
            assert_eq!(report.coverage_rows, n);
            assert_eq!(report.row_rects.len(), n);
            assert_eq!(report.hidden_coverages, 0);
            assert_rows_disjoint(&report.row_rects);
            for i in 0..n {
                assert!(canvas.has_text(&format!("Prestation {i}")));
            }
        }
    }

    #[test]
    fn empty_list_shows_a_note_but_no_rows() {
        let (canvas, report) = lay_out(&record_with(0));
        assert!(canvas.has_text("Aucune prestation renseignée"));
        assert!(report.row_rects.is_empty());
        assert_eq!(report.coverage_rows, 0);
    }

    #[test]
    fn overflow_collapses_into_trailing_row() {
        let (canvas, report) = lay_out(&record_with(40));
        let capacity = report.coverage_capacity;
        assert!(capacity > 5);
        assert_eq!(report.coverage_rows, capacity - 1);
        assert_eq!(report.hidden_coverages, 40 - (capacity - 1));
        assert_eq!(report.row_rects.len(), capacity);
        assert!(canvas.has_text(&format!("… et {} autres prestations", report.hidden_coverages)));
        assert_rows_disjoint(&report.row_rects);

        // The bottom block still fits above the footer.
        let signature = report.section("signature").unwrap().rect;
        let footer = report.section("footer").unwrap().rect;
        assert!(signature.bottom() <= footer.y + 1e-3);
    }

    #[test]
    fn sections_avoid_the_card_and_each_other() {
        let geometry = Geometry::ID1_ON_A4;
        let card = geometry.card_rect();
        let content = geometry.content_rect();
        let (_, report) = lay_out(&record_with(12));

        for section in &report.sections {
            assert!(content.contains(&section.rect), "{} leaves the margins", section.name);
            assert!(!section.rect.intersects(&card), "{} overlaps the card", section.name);
        }
        for (i, a) in report.sections.iter().enumerate() {
            for b in &report.sections[i + 1..] {
                assert!(!a.rect.intersects(&b.rect), "{} overlaps {}", a.name, b.name);
            }
        }

        let coverage = report.section("coverage").unwrap().rect;
        assert!(coverage.y >= card.bottom() + CARD_GAP - 1e-3);
    }

    #[test]
    fn prints_title_reference_and_defaults() {
        let (canvas, report) = lay_out(&record_with(1));
        assert!(canvas.has_text("ATTESTATION DE DROITS"));
        assert!(canvas.has_text(&format!("Réf. : {}", report.reference)));
        assert!(canvas.has_text("Actif"));
        assert!(canvas.has_text("14/03/2026"));
        assert!(canvas.has_text("13/03/2027"));
        assert!(canvas.has_text("Fait à Libreville, le 14/03/2026"));
        assert!(canvas.has_text(&RenderConfig::default().footer_contact));
    }

    #[test]
    fn only_the_generation_line_is_timestamped() {
        let (canvas, _) = lay_out(&record_with(1));
        let stamped: Vec<_> = canvas.texts().filter(|run| run.timestamp).collect();
        assert_eq!(stamped.len(), 1);
        assert_eq!(stamped[0].text, "Document généré le 14/03/2026 à 09:30");
    }

    #[test]
    fn age_and_sex_formatting() {
        let mut record = record_with(0);
        assert_eq!(age_and_sex(&record), EMPTY_FIELD);
        record.age = Some("43 ans".into());
        assert_eq!(age_and_sex(&record), "43 ans / —");
        record.sex = Some("M".into());
        assert_eq!(age_and_sex(&record), "43 ans / M");
    }

    #[test]
    fn debug_grid_sits_on_top() {
        let mut canvas = PageCanvas::new(Geometry::ID1_ON_A4);
        draw_debug_grid(&mut canvas);
        assert_eq!(canvas.z(), ZOrder::Page);
        assert!(canvas.elements().iter().all(|e| e.z == ZOrder::DebugGrid));
        // 43 vertical + 60 horizontal lines.
        let lines = canvas
            .elements()
            .iter()
            .filter(|e| matches!(e.shape, Shape::Line { .. }))
            .count();
        assert_eq!(lines, 43 + 60);
        assert!(canvas.has_text("100"));
    }
}
