// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in vector card template, filled from a document record.
//
// Drawn in the 1050 × 650 design space. The overlay placeholders carry the
// ids listed in `HIDDEN_TEMPLATE_NODES` and sit exactly where the compositor
// later places the real emblem, logo, chip and photo.

use vitalcard_core::config::RenderConfig;
use vitalcard_core::geometry::Geometry;
use vitalcard_core::types::{DocumentRecord, EMPTY_FIELD, display_or_dash};

use crate::template::capture::SvgSnapshotSource;

const SANS: &str = "Helvetica, Arial, sans-serif";
const MONO: &str = "Courier New, Courier, monospace";

/// Escape text for inclusion in SVG character data or attribute values.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Builds the card template markup for one record.
#[derive(Debug, Clone)]
pub struct CardTemplate<'a> {
    geometry: &'a Geometry,
    config: &'a RenderConfig,
}

impl<'a> CardTemplate<'a> {
    pub fn new(geometry: &'a Geometry, config: &'a RenderConfig) -> Self {
        Self { geometry, config }
    }

    /// A snapshot source rasterising this template for `record` at card
    /// resolution.
    pub fn snapshot_source(&self, record: &DocumentRecord) -> SvgSnapshotSource {
        SvgSnapshotSource::for_card(self.markup(record), self.geometry, self.config)
    }

    pub fn markup(&self, record: &DocumentRecord) -> String {
        let (w, h) = (self.geometry.design_width, self.geometry.design_height);
        let f = &self.geometry.overlays;
        let band = h * self.geometry.fallback_top_band;
        let radius = self.geometry.card_radius / self.geometry.card_width * w;

        let emblem = (f.emblem_origin.0 * w, f.emblem_origin.1 * h, f.emblem_side * w);
        let logo_w = f.logo_width * w;
        let logo = (f.logo_origin.0 * w, f.logo_origin.1 * h, logo_w, logo_w * f.logo_aspect);
        let chip = (
            f.chip_origin.0 * w,
            f.chip_origin.1 * h,
            f.chip_size.0 * w,
            f.chip_size.1 * h,
        );
        let photo = (
            f.photo_center.0 * w,
            f.photo_center.1 * h,
            f.photo_radii.0 * w,
            f.photo_radii.1 * h,
        );

        let header_x = w * 0.37;
        let col_a = chip.0;
        let col_b = w * 0.36;

        let country = xml_escape(&self.config.country.to_uppercase());
        let short = xml_escape(&self.config.institution_short);
        let regime = xml_escape(&format!("RÉGIME : {}", display_or_dash(&record.regime)).to_uppercase());
        let number = xml_escape(display_or_dash(&record.insured_number));
        let last_name = xml_escape(&display_or_dash(&record.last_name).to_uppercase());
        let first_names = xml_escape(display_or_dash(&record.first_names));
        let birth_date = xml_escape(display_or_dash(&record.birth_date));
        let sex = xml_escape(record.sex.as_deref().map(display_or_dash).unwrap_or(EMPTY_FIELD));

        let mut svg = String::with_capacity(4096);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        ));
        svg.push_str(&format!(
            r##"<rect x="0" y="0" width="{w}" height="{h}" rx="{radius}" fill="#e1f2e6"/>"##
        ));
        svg.push_str(&format!(
            r##"<path d="M0 {radius} A{radius} {radius} 0 0 1 {radius} 0 H{} A{radius} {radius} 0 0 1 {w} {radius} V{band} H0 Z" fill="#ffffff"/>"##,
            w - radius
        ));
        svg.push_str(&format!(
            r##"<rect x="0" y="{}" width="{w}" height="4" fill="#007a3d"/>"##,
            band - 2.0
        ));
        svg.push_str(&format!(
            r##"<rect id="emblem" x="{}" y="{}" width="{}" height="{}" fill="#d9d9d9"/>"##,
            emblem.0, emblem.1, emblem.2, emblem.2
        ));
        svg.push_str(&format!(
            r##"<rect id="org-logo" x="{}" y="{}" width="{}" height="{}" fill="#d9d9d9"/>"##,
            logo.0, logo.1, logo.2, logo.3
        ));

        let text = |x: f32, y: f32, size: u32, weight: &str, anchor: &str, family: &str, fill: &str, body: &str| {
            format!(
                r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" text-anchor="{anchor}" fill="{fill}">{body}</text>"#
            )
        };

        svg.push_str(&text(header_x, h * 0.09, 24, "bold", "middle", SANS, "#212529", &country));
        svg.push_str(&text(header_x, h * 0.15, 34, "bold", "middle", SANS, "#007a3d", &short));
        svg.push_str(&text(header_x, h * 0.21, 20, "normal", "middle", SANS, "#495057", "Assurance Maladie Obligatoire"));
        svg.push_str(&text(w * 0.45, h * 0.31, 30, "bold", "middle", SANS, "#007a3d", "CARTE D&apos;ASSURÉ MALADIE"));
        svg.push_str(&text(w * 0.45, h * 0.37, 22, "normal", "middle", SANS, "#212529", &regime));

        svg.push_str(&format!(
            r##"<g id="chip"><rect x="{}" y="{}" width="{}" height="{}" rx="18" fill="#d6b25c"/></g>"##,
            chip.0, chip.1, chip.2, chip.3
        ));
        svg.push_str(&text(w * 0.27, h * 0.47, 40, "bold", "start", MONO, "#212529", &number));

        for (x, caption_y, caption, value) in [
            (col_a, h * 0.62, "NOM", last_name.as_str()),
            (col_b, h * 0.62, "PRÉNOMS", first_names.as_str()),
            (col_a, h * 0.80, "NÉ(E) LE", birth_date.as_str()),
            (col_b, h * 0.80, "SEXE", sex.as_str()),
        ] {
            svg.push_str(&text(x, caption_y, 17, "normal", "start", SANS, "#6c757d", caption));
            svg.push_str(&text(x, caption_y + 34.0, 27, "bold", "start", SANS, "#212529", value));
        }

        svg.push_str(&format!(
            r##"<ellipse id="photo-placeholder" cx="{}" cy="{}" rx="{}" ry="{}" fill="#c8c8c8"/>"##,
            photo.0, photo.1, photo.2, photo.3
        ));
        svg.push_str("</svg>");
        svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::capture::{HIDDEN_TEMPLATE_NODES, prepare_markup};

    fn record() -> DocumentRecord {
        DocumentRecord {
            insured_number: "GA-2024-001".into(),
            last_name: "Mbadinga & Fils".into(),
            first_names: "<Jean>".into(),
            regime: "Secteur privé".into(),
            ..DocumentRecord::default()
        }
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(xml_escape(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&apos;");
    }

    #[test]
    fn markup_is_well_formed_and_carries_placeholders() {
        let geometry = Geometry::ID1_ON_A4;
        let config = RenderConfig::default();
        let markup = CardTemplate::new(&geometry, &config).markup(&record());

        let doc = roxmltree::Document::parse(&markup).unwrap();
        for id in HIDDEN_TEMPLATE_NODES {
            assert!(
                doc.descendants().any(|n| n.attribute("id") == Some(id)),
                "missing placeholder {id}"
            );
        }
        let texts: Vec<&str> = doc.descendants().filter_map(|n| n.text()).collect();
        assert!(texts.contains(&"MBADINGA & FILS"));
        assert!(texts.contains(&"<Jean>"));
        assert!(prepare_markup(&markup, &HIDDEN_TEMPLATE_NODES, (1050.0, 650.0)).is_ok());
    }

    #[test]
    fn snapshot_source_matches_card_resolution() {
        let geometry = Geometry::ID1_ON_A4;
        let config = RenderConfig {
            upscale: 1.0,
            px_per_mm: 10.0,
            load_system_fonts: false,
            ..RenderConfig::default()
        };
        let source = CardTemplate::new(&geometry, &config).snapshot_source(&record());
        assert_eq!(source.raster_size(), (856, 540));
    }
}
