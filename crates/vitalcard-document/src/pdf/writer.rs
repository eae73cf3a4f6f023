// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — serialise a page canvas into a single-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. The canvas works in top-left millimetres; PDF user
// space is bottom-left points, so every y coordinate is flipped here.

use image::RgbaImage;
use printpdf::{
    BuiltinFont, Color, ImageCompression, ImageOptimizationOptions, Line, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage,
    PdfSaveOptions, PdfWarnMsg, Point, Polygon, PolygonRing, Pt, RawImage, RawImageData,
    RawImageFormat, Rgb, TextItem, WindingOrder, XObjectTransform,
};
use tracing::{debug, instrument};
use vitalcard_core::geometry::{Geometry, PointMm, RectMm};

use crate::pdf::canvas::{
    FontFace, Layer, PageCanvas, Rgb8, Shape, Stroke, TextRun, rounded_rect_outline,
};

/// Chords per quarter arc when flattening rounded corners.
const ARC_SEGMENTS: usize = 8;

/// Resolution at which bitmaps are declared; placement is done through the
/// scale factors, so one pixel maps to one point before scaling.
const IMAGE_DPI: f32 = 72.0;

/// Serialises a [`PageCanvas`] to PDF bytes.
pub struct PdfWriter {
    /// Page size and card contract.
    geometry: Geometry,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    /// Create a new writer for the given page geometry.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn page_height_pt(&self) -> f32 {
        Mm(self.geometry.page_height).into_pt().0
    }

    /// Page-space millimetres to PDF points.
    fn point(&self, p: PointMm) -> Point {
        Point {
            x: Mm(p.x).into_pt(),
            y: Pt(self.page_height_pt() - Mm(p.y).into_pt().0),
        }
    }

    // -- Canvas to PDF --------------------------------------------------------

    /// Emit every canvas element, in z-order, onto one page and serialise.
    #[instrument(skip(self, canvas), fields(elements = canvas.elements().len()))]
    pub fn render(&self, canvas: &PageCanvas) -> Vec<u8> {
        let title = self.title.as_deref().unwrap_or("Attestation de droits");
        let mut doc = PdfDocument::new(title);
        let mut ops: Vec<Op> = Vec::new();
        let mut images = 0usize;

        for element in canvas.ordered() {
            match &element.shape {
                Shape::Rect {
                    rect,
                    radius,
                    fill,
                    stroke,
                } => self.push_rect(&mut ops, *rect, *radius, *fill, *stroke),
                Shape::Polygon { points, fill } => {
                    ops.push(Op::SetFillColor { col: color(*fill) });
                    ops.push(Op::DrawPolygon {
                        polygon: self.polygon(points, PaintMode::Fill),
                    });
                }
                Shape::Line { from, to, stroke } => {
                    self.push_stroke_style(&mut ops, *stroke);
                    ops.push(Op::DrawLine {
                        line: Line {
                            points: vec![self.line_point(*from), self.line_point(*to)],
                            is_closed: false,
                        },
                    });
                }
                Shape::Text(run) => self.push_text(&mut ops, run),
                Shape::Image(layer) => {
                    self.push_image(&mut doc, &mut ops, layer);
                    images += 1;
                }
            }
        }

        let page = PdfPage::new(
            Mm(self.geometry.page_width),
            Mm(self.geometry.page_height),
            ops,
        );
        doc.with_pages(vec![page]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&save_options(), &mut warnings);

        debug!(
            images,
            warnings = warnings.len(),
            bytes = output.len(),
            "Page serialised"
        );
        output
    }

    // -- Shapes ---------------------------------------------------------------

    fn line_point(&self, p: PointMm) -> LinePoint {
        LinePoint {
            p: self.point(p),
            bezier: false,
        }
    }

    fn polygon(&self, points: &[PointMm], mode: PaintMode) -> Polygon {
        Polygon {
            rings: vec![PolygonRing {
                points: points.iter().map(|p| self.line_point(*p)).collect(),
            }],
            mode,
            winding_order: WindingOrder::NonZero,
        }
    }

    fn push_stroke_style(&self, ops: &mut Vec<Op>, stroke: Stroke) {
        ops.push(Op::SetOutlineColor {
            col: color(stroke.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Mm(stroke.width_mm).into_pt(),
        });
    }

    fn push_rect(
        &self,
        ops: &mut Vec<Op>,
        rect: RectMm,
        radius: f32,
        fill: Option<Rgb8>,
        stroke: Option<Stroke>,
    ) {
        let outline = rounded_rect_outline(rect, radius, ARC_SEGMENTS);
        let mode = match (fill, stroke) {
            (Some(fill), Some(stroke)) => {
                ops.push(Op::SetFillColor { col: color(fill) });
                self.push_stroke_style(ops, stroke);
                PaintMode::FillStroke
            }
            (Some(fill), None) => {
                ops.push(Op::SetFillColor { col: color(fill) });
                PaintMode::Fill
            }
            (None, Some(stroke)) => {
                self.push_stroke_style(ops, stroke);
                PaintMode::Stroke
            }
            (None, None) => return,
        };
        ops.push(Op::DrawPolygon {
            polygon: self.polygon(&outline, mode),
        });
    }

    // -- Text -----------------------------------------------------------------

    fn push_text(&self, ops: &mut Vec<Op>, run: &TextRun) {
        let font = builtin_font(run.face);
        ops.push(Op::StartTextSection);
        ops.push(Op::SetFillColor {
            col: color(run.color),
        });
        ops.push(Op::SetTextCursor {
            pos: self.point(PointMm::new(run.left_mm(), run.origin.y)),
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(run.size_pt),
            font,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(run.text.clone())],
            font,
        });
        ops.push(Op::EndTextSection);
    }

    // -- Images ---------------------------------------------------------------

    fn push_image(&self, doc: &mut PdfDocument, ops: &mut Vec<Op>, layer: &Layer) {
        let bitmap = layer.bitmap.as_ref();
        let xobject_id = doc.add_image(&raw_image(bitmap));

        let target_w_pt = Mm(layer.rect.width).into_pt().0;
        let target_h_pt = Mm(layer.rect.height).into_pt().0;
        let origin = self.point(PointMm::new(layer.rect.x, layer.rect.bottom()));

        ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(origin.x),
                translate_y: Some(origin.y),
                scale_x: Some(target_w_pt / bitmap.width() as f32),
                scale_y: Some(target_h_pt / bitmap.height() as f32),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        });
    }
}

/// Lossless Flate for every image and no size cap: printpdf's default
/// `max_image_size` would point-sample the upscaled card bitmaps back down.
fn save_options() -> PdfSaveOptions {
    PdfSaveOptions {
        image_optimization: Some(ImageOptimizationOptions {
            quality: None,
            max_image_size: None,
            dither_greyscale: None,
            convert_to_greyscale: Some(false),
            auto_optimize: Some(true),
            format: Some(ImageCompression::Flate),
        }),
        ..PdfSaveOptions::default()
    }
}

/// Convert a bitmap for printpdf, dropping the alpha channel when every pixel
/// is opaque.
fn raw_image(bitmap: &RgbaImage) -> RawImage {
    let width = bitmap.width() as usize;
    let height = bitmap.height() as usize;

    if bitmap.pixels().all(|p| p.0[3] == u8::MAX) {
        let rgb: Vec<u8> = bitmap
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        RawImage {
            pixels: RawImageData::U8(rgb),
            width,
            height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        }
    } else {
        RawImage {
            pixels: RawImageData::U8(bitmap.as_raw().clone()),
            width,
            height,
            data_format: RawImageFormat::RGBA8,
            tag: Vec::new(),
        }
    }
}

fn color(rgb: Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        rgb.0 as f32 / 255.0,
        rgb.1 as f32 / 255.0,
        rgb.2 as f32 / 255.0,
        None,
    ))
}

fn builtin_font(face: FontFace) -> BuiltinFont {
    match face {
        FontFace::Regular => BuiltinFont::Helvetica,
        FontFace::Bold => BuiltinFont::HelveticaBold,
        FontFace::Italic => BuiltinFont::HelveticaOblique,
        FontFace::Mono => BuiltinFont::Courier,
        FontFace::MonoBold => BuiltinFont::CourierBold,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pdf::canvas::{ZOrder, palette};

    fn sample_canvas() -> PageCanvas {
        let mut canvas = PageCanvas::new(Geometry::ID1_ON_A4);
        canvas.rect(
            RectMm::new(15.0, 15.0, 180.0, 18.0),
            Some(palette::INSTITUTION_GREEN),
            None,
        );
        canvas.text(TextRun::new("ATTESTATION DE DROITS", 20.0, 45.0, 14.0, FontFace::Bold));
        canvas.set_z(ZOrder::Overlay);
        let mut bitmap = RgbaImage::from_pixel(4, 4, image::Rgba([200, 10, 10, 255]));
        bitmap.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        canvas.image(RectMm::new(120.0, 70.0, 10.0, 10.0), Arc::new(bitmap));
        canvas
    }

    #[test]
    fn renders_single_page_pdf() {
        let writer = PdfWriter::new(Geometry::ID1_ON_A4);
        let bytes = writer.render(&sample_canvas());
        assert!(bytes.starts_with(b"%PDF"));

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn y_axis_is_flipped() {
        let writer = PdfWriter::new(Geometry::ID1_ON_A4);
        let top = writer.point(PointMm::new(0.0, 0.0));
        let bottom = writer.point(PointMm::new(0.0, 297.0));
        assert!((top.y.0 - Mm(297.0).into_pt().0).abs() < 1e-3);
        assert!(bottom.y.0.abs() < 1e-3);
    }

    #[test]
    fn opaque_bitmaps_drop_alpha() {
        let opaque = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
        assert!(matches!(raw_image(&opaque).data_format, RawImageFormat::RGB8));

        let translucent = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 128]));
        assert!(matches!(raw_image(&translucent).data_format, RawImageFormat::RGBA8));
    }

    #[test]
    fn large_bitmaps_keep_their_pixel_size() {
        // 1600 x 900 RGB is well past the 2 MB printpdf resamples at by default.
        let mut bitmap = RgbaImage::new(1600, 900);
        for (x, y, pixel) in bitmap.enumerate_pixels_mut() {
            *pixel = image::Rgba([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8, 255]);
        }
        let mut canvas = PageCanvas::new(Geometry::ID1_ON_A4);
        canvas.image(RectMm::new(109.4, 61.0, 85.6, 53.98), Arc::new(bitmap));

        let bytes = PdfWriter::new(Geometry::ID1_ON_A4).render(&canvas);
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let widths: Vec<i64> = doc
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|v| v.as_name())
                    .is_ok_and(|name| name == b"Image")
            })
            .filter_map(|stream| stream.dict.get(b"Width").and_then(|v| v.as_i64()).ok())
            .collect();
        assert_eq!(widths, vec![1600]);
    }
}
