// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template capture — freeze a vector card template into a high-resolution
// bitmap with the overlay placeholders suppressed.
//
// Embedded bitmaps inside a serialised vector tree rasterise unreliably, so the
// placeholders for the emblem, logo, chip and photo are hidden here and each
// asset is recomposited on its own with its own fit, clip and opacity.

use std::future::Future;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, instrument, warn};
use vitalcard_core::config::RenderConfig;
use vitalcard_core::error::{Result, VitalcardError};
use vitalcard_core::geometry::Geometry;

use crate::asset::loader::{Asset, decode_image};
use crate::template::raster::{self, FontDatabase};

/// Template node ids that are recomposited individually and therefore hidden
/// during capture.
pub const HIDDEN_TEMPLATE_NODES: [&str; 4] = ["emblem", "org-logo", "chip", "photo-placeholder"];

/// Capability: render a vector card template to a bitmap with the given
/// nodes suppressed. Any failure yields `Asset::Absent`.
pub trait VectorSnapshotSource: Send + Sync {
    fn render(&self, hidden_node_ids: &[&str]) -> impl Future<Output = Asset<RgbaImage>> + Send;
}

/// No template available; the card base is always drawn by the vector
/// fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplate;

impl VectorSnapshotSource for NoTemplate {
    async fn render(&self, _hidden_node_ids: &[&str]) -> Asset<RgbaImage> {
        Asset::Absent
    }
}

/// A packaged, pre-rendered reference image of the card without overlays.
#[derive(Debug, Clone)]
pub struct PrerenderedSnapshot {
    bytes: Arc<Vec<u8>>,
}

impl PrerenderedSnapshot {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }
}

impl VectorSnapshotSource for PrerenderedSnapshot {
    async fn render(&self, _hidden_node_ids: &[&str]) -> Asset<RgbaImage> {
        match decode_image(&self.bytes) {
            Ok(image) => Asset::Present(image.to_rgba8()),
            Err(err) => {
                warn!(error = %err, "Pre-rendered card snapshot unusable");
                Asset::Absent
            }
        }
    }
}

/// A live SVG card template rasterised with resvg.
#[derive(Debug, Clone)]
pub struct SvgSnapshotSource {
    markup: Arc<str>,
    width_px: u32,
    height_px: u32,
    design_size: (f32, f32),
    fonts: Option<Arc<FontDatabase>>,
}

impl SvgSnapshotSource {
    /// A source rendering onto exactly `width_px × height_px`, with the
    /// default 1050 × 650 design size.
    pub fn new(markup: impl Into<Arc<str>>, width_px: u32, height_px: u32) -> Self {
        let design = Geometry::ID1_ON_A4;
        Self {
            markup: markup.into(),
            width_px: width_px.max(1),
            height_px: height_px.max(1),
            design_size: (design.design_width, design.design_height),
            fonts: None,
        }
    }

    /// A source sized for the physical card region: `card mm × px_per_mm ×
    /// upscale`.
    pub fn for_card(markup: impl Into<Arc<str>>, geometry: &Geometry, config: &RenderConfig) -> Self {
        let density = config.px_per_mm * config.upscale;
        let width_px = (geometry.card_width * density).round() as u32;
        let height_px = (geometry.card_height * density).round() as u32;
        let mut source = Self::new(markup, width_px, height_px);
        source.design_size = (geometry.design_width, geometry.design_height);
        if config.load_system_fonts {
            source.fonts = Some(raster::system_fonts());
        }
        source
    }

    /// Use an existing font database for text nodes.
    pub fn with_fonts(mut self, fonts: Arc<FontDatabase>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    pub fn raster_size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }
}

impl VectorSnapshotSource for SvgSnapshotSource {
    #[instrument(skip(self), fields(width = self.width_px, height = self.height_px))]
    async fn render(&self, hidden_node_ids: &[&str]) -> Asset<RgbaImage> {
        let prepared = match prepare_markup(&self.markup, hidden_node_ids, self.design_size) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(error = %err, "Card template could not be prepared");
                return Asset::Absent;
            }
        };

        let (width, height) = (self.width_px, self.height_px);
        let fonts = self.fonts.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            raster::rasterize_svg(&prepared, width, height, fonts)
        })
        .await;

        match rendered {
            Ok(Ok(image)) => {
                info!(width, height, "Card template captured");
                Asset::Present(image)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "Card template capture failed");
                Asset::Absent
            }
            Err(err) => {
                warn!(error = %err, "Card template capture task aborted");
                Asset::Absent
            }
        }
    }
}

// -- Markup preparation -----------------------------------------------------------

struct Edit {
    start: usize,
    end: usize,
    /// Closing wrappers sort before opening ones at the same offset.
    rank: u8,
    text: String,
}

/// Produce a copy of `markup` with every element whose id is in `hidden`
/// wrapped in a zero-opacity group, and the root's intrinsic size fixed to
/// `design_size`. The caller's markup is never modified.
pub fn prepare_markup(markup: &str, hidden: &[&str], design_size: (f32, f32)) -> Result<String> {
    let doc = roxmltree::Document::parse(markup)
        .map_err(|e| VitalcardError::TemplateCapture(format!("template is not valid XML: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(VitalcardError::TemplateCapture(format!(
            "template root is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let mut edits: Vec<Edit> = Vec::new();

    let tag_start = root.range().start;
    let tag_end = start_tag_end(markup, tag_start).ok_or_else(|| {
        VitalcardError::TemplateCapture("unterminated <svg> start tag".into())
    })?;
    let mut root_tag = markup[tag_start..tag_end].to_string();
    for attribute in ["width", "height"] {
        root_tag = strip_attribute(&root_tag, attribute);
    }
    if root.attribute("viewBox").is_none() {
        // Without a viewBox the original user space would be rescaled by the
        // new intrinsic size; pin it to the original dimensions.
        let original_w = numeric_length(root.attribute("width")).unwrap_or(design_size.0);
        let original_h = numeric_length(root.attribute("height")).unwrap_or(design_size.1);
        root_tag = insert_after_tag_name(&root_tag, &format!(" viewBox=\"0 0 {original_w} {original_h}\""));
    }
    root_tag = insert_after_tag_name(
        &root_tag,
        &format!(" width=\"{}\" height=\"{}\"", design_size.0, design_size.1),
    );
    edits.push(Edit {
        start: tag_start,
        end: tag_end,
        rank: 2,
        text: root_tag,
    });

    let is_hidden = |node: &roxmltree::Node| {
        node.attribute("id")
            .is_some_and(|id| hidden.contains(&id))
    };

    let mut suppressed = 0usize;
    for node in root.descendants().skip(1).filter(|n| n.is_element()) {
        if !is_hidden(&node) || node.ancestors().skip(1).any(|a| is_hidden(&a)) {
            continue;
        }
        let range = node.range();
        edits.push(Edit {
            start: range.start,
            end: range.start,
            rank: 1,
            text: "<g opacity=\"0\">".into(),
        });
        edits.push(Edit {
            start: range.end,
            end: range.end,
            rank: 0,
            text: "</g>".into(),
        });
        suppressed += 1;
    }

    edits.sort_by_key(|edit| (edit.start, edit.rank));

    let mut out = String::with_capacity(markup.len() + 32 * edits.len());
    let mut cursor = 0usize;
    for edit in &edits {
        out.push_str(&markup[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&markup[cursor..]);

    debug!(suppressed, "Template markup prepared");
    Ok(out)
}

/// Byte offset just past the `>` closing the start tag beginning at `start`.
fn start_tag_end(markup: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, byte) in markup.as_bytes()[start..].iter().enumerate() {
        match (quote, *byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(*byte),
            (None, b'>') => return Some(start + offset + 1),
            _ => {}
        }
    }
    None
}

/// Remove attribute `name` (and its leading whitespace) from a start tag.
fn strip_attribute(tag: &str, name: &str) -> String {
    let bytes = tag.as_bytes();
    let mut out = String::with_capacity(tag.len());
    let mut copied_to = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if let Some(q) = quote {
            if byte == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if byte == b'"' || byte == b'\'' {
            quote = Some(byte);
            i += 1;
            continue;
        }
        if byte.is_ascii_whitespace() && tag[i + 1..].starts_with(name) {
            let mut j = i + 1 + name.len();
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'=' {
                j += 1;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j < bytes.len() && (bytes[j] == b'"' || bytes[j] == b'\'') {
                    let q = bytes[j] as char;
                    if let Some(close) = tag[j + 1..].find(q) {
                        out.push_str(&tag[copied_to..i]);
                        i = j + 1 + close + 1;
                        copied_to = i;
                        continue;
                    }
                }
            }
        }
        i += 1;
    }
    out.push_str(&tag[copied_to..]);
    out
}

fn insert_after_tag_name(tag: &str, text: &str) -> String {
    let name_end = tag[1..]
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .map(|i| i + 1)
        .unwrap_or(tag.len());
    format!("{}{}{}", &tag[..name_end], text, &tag[name_end..])
}

/// Parse a length such as `"85.6"` or `"1050px"`; other units are rejected.
fn numeric_length(value: Option<&str>) -> Option<f32> {
    let value = value?.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    number.parse::<f32>().ok().filter(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="85.6mm" height="53.98mm" viewBox="0 0 1050 650" stroke-width="2">
  <rect x="0" y="0" width="1050" height="650" fill="#00ff00"/>
  <rect id="emblem" x="0" y="0" width="525" height="650" fill="#ff0000"/>
  <g id="chip"><rect id="photo-placeholder" x="600" y="0" width="10" height="10"/></g>
</svg>"##;

    #[test]
    fn hides_listed_nodes_and_fixes_size() {
        let prepared = prepare_markup(TEMPLATE, &HIDDEN_TEMPLATE_NODES, (1050.0, 650.0)).unwrap();
        let doc = roxmltree::Document::parse(&prepared).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("width"), Some("1050"));
        assert_eq!(root.attribute("height"), Some("650"));
        assert_eq!(root.attribute("stroke-width"), Some("2"));

        let emblem = doc
            .descendants()
            .find(|n| n.attribute("id") == Some("emblem"))
            .unwrap();
        assert_eq!(emblem.parent_element().unwrap().attribute("opacity"), Some("0"));

        // Nested hidden nodes are covered by their hidden ancestor only.
        let wrappers = doc
            .descendants()
            .filter(|n| n.attribute("opacity") == Some("0"))
            .count();
        assert_eq!(wrappers, 2);
        // Source markup is untouched.
        assert!(TEMPLATE.contains("width=\"85.6mm\""));
    }

    #[test]
    fn adds_view_box_when_missing() {
        let markup = r#"<svg xmlns="http://www.w3.org/2000/svg" width="210" height="130"><rect width="1" height="1"/></svg>"#;
        let prepared = prepare_markup(markup, &[], (1050.0, 650.0)).unwrap();
        let doc = roxmltree::Document::parse(&prepared).unwrap();
        assert_eq!(doc.root_element().attribute("viewBox"), Some("0 0 210 130"));
        assert_eq!(doc.root_element().attribute("width"), Some("1050"));
    }

    #[test]
    fn rejects_non_svg_roots() {
        assert!(prepare_markup("<html></html>", &[], (1050.0, 650.0)).is_err());
        assert!(prepare_markup("not xml", &[], (1050.0, 650.0)).is_err());
    }

    #[tokio::test]
    async fn captured_bitmap_omits_hidden_nodes() {
        let source = SvgSnapshotSource::new(TEMPLATE, 105, 65);
        let Asset::Present(bitmap) = source.render(&HIDDEN_TEMPLATE_NODES).await else {
            panic!("capture should succeed");
        };
        assert_eq!(bitmap.dimensions(), (105, 65));
        // The red emblem placeholder covered the left half; green shows through.
        assert_eq!(bitmap.get_pixel(10, 30).0, [0, 255, 0, 255]);

        let Asset::Present(unhidden) = source.render(&[]).await else {
            panic!("capture should succeed");
        };
        assert_eq!(unhidden.get_pixel(10, 30).0, [255, 0, 0, 255]);
    }

    #[tokio::test]
    async fn broken_templates_are_absent() {
        let source = SvgSnapshotSource::new("<svg><rect></svg>", 10, 10);
        assert_eq!(source.render(&HIDDEN_TEMPLATE_NODES).await, Asset::Absent);
        assert_eq!(NoTemplate.render(&HIDDEN_TEMPLATE_NODES).await, Asset::Absent);
        assert_eq!(
            PrerenderedSnapshot::new(b"nope".to_vec())
                .render(&HIDDEN_TEMPLATE_NODES)
                .await,
            Asset::Absent
        );
    }
}
