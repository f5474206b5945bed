use image::RgbaImage;
use printpdf::lopdf::{self, Object, Stream, dictionary};
use printpdf::{
    ColorBits, ColorSpace, CustomPdfConformance, Image, ImageTransform, ImageXObject, Mm,
    PdfConformance, PdfDocument, Px,
};
use tracing::debug;

use super::raster::Rasterizer;
use super::{Artifact, ExportFormat, capture_scale};
use crate::data::PDF_MIME;
use crate::error::{CardError, Result};
use crate::surface::Surface;

/// Print captures always use this resolution, whatever the raster DPI setting.
pub const PRINT_DPI: u32 = 300;
pub const PAGE_WIDTH_IN: f32 = 3.5;
pub const PAGE_HEIGHT_IN: f32 = 2.0;

/// A single-page landscape PDF holding one full-bleed capture of the card.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintDocument {
    pub capture_scale: f32,
    pub page_width_in: f32,
    pub page_height_in: f32,
    pub image_width: u32,
    pub image_height: u32,
    pub pdf: Vec<u8>,
}

impl Artifact for PrintDocument {
    fn format(&self) -> ExportFormat {
        ExportFormat::Print
    }

    fn file_name(&self) -> String {
        "business-card.pdf".to_string()
    }

    fn mime(&self) -> &'static str {
        PDF_MIME
    }

    fn bytes(&self) -> &[u8] {
        &self.pdf
    }
}

pub fn export_print(surface: &Surface, rasterizer: &Rasterizer) -> Result<PrintDocument> {
    let capture = rasterizer.capture(surface, PRINT_DPI)?;
    let (image_width, image_height) = capture.dimensions();
    let pdf = image_to_pdf(&capture)?;
    debug!(
        "print: {}x{} capture on a {}in x {}in page ({} bytes)",
        image_width,
        image_height,
        PAGE_WIDTH_IN,
        PAGE_HEIGHT_IN,
        pdf.len()
    );
    Ok(PrintDocument {
        capture_scale: capture_scale(PRINT_DPI),
        page_width_in: PAGE_WIDTH_IN,
        page_height_in: PAGE_HEIGHT_IN,
        image_width,
        image_height,
        pdf,
    })
}

/// Splits straight-alpha pixels into DeviceRGB samples and a DeviceGray soft mask.
fn split_alpha(capture: &RgbaImage) -> (Vec<u8>, Vec<u8>) {
    let pixels = capture.as_raw();
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(pixels.len() / 4);
    for pixel in pixels.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
        alpha.push(pixel[3]);
    }
    (rgb, alpha)
}

fn image_to_pdf(capture: &RgbaImage) -> Result<Vec<u8>> {
    let capture_err = |reason: String| CardError::Capture(reason);
    let (width, height) = capture.dimensions();
    let (rgb, alpha) = split_alpha(capture);

    let (doc, page, layer) = PdfDocument::new(
        "Business Card",
        Mm(in_to_mm(PAGE_WIDTH_IN)),
        Mm(in_to_mm(PAGE_HEIGHT_IN)),
        "Layer 1",
    );
    // The default PDF/X-3 profile forbids the soft mask below.
    let doc = doc.with_conformance(PdfConformance::Custom(CustomPdfConformance::default()));
    let current_layer = doc.get_page(page).get_layer(layer);
    // At `dpi`, the image spans width/dpi inches; scale it onto the page exactly.
    let dpi = PRINT_DPI as f32;
    let transform = ImageTransform {
        translate_x: Some(Mm(0.0)),
        translate_y: Some(Mm(0.0)),
        rotate: None,
        scale_x: Some(PAGE_WIDTH_IN * dpi / width as f32),
        scale_y: Some(PAGE_HEIGHT_IN * dpi / height as f32),
        dpi: Some(dpi),
    };
    let xobject = ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: false,
        image_data: rgb,
        image_filter: None,
        clipping_bbox: None,
    };
    Image::from(xobject).add_to_layer(current_layer, transform);

    let pdf = doc
        .save_to_bytes()
        .map_err(|err| capture_err(format!("failed to write pdf: {}", err)))?;
    attach_soft_mask(&pdf, alpha, width, height)
        .map_err(|err| capture_err(format!("failed to attach alpha mask: {}", err)))
}

/// printpdf has no soft mask support, so the alpha channel is added to the
/// saved document as an `/SMask` on the capture image.
fn attach_soft_mask(
    pdf: &[u8],
    alpha: Vec<u8>,
    width: u32,
    height: u32,
) -> std::result::Result<Vec<u8>, lopdf::Error> {
    let mut doc = lopdf::Document::load_mem(pdf)?;
    // soft masks need PDF 1.4
    doc.version = "1.4".to_string();
    let images: Vec<_> = doc
        .objects
        .iter()
        .filter_map(|(id, object)| {
            let stream = object.as_stream().ok()?;
            let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name).ok()?;
            (subtype == b"Image" && !stream.dict.has(b"SMask")).then_some(*id)
        })
        .collect();
    if images.is_empty() {
        return Err(lopdf::Error::ObjectNotFound);
    }

    let mut mask = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8
        },
        alpha,
    );
    mask.compress()?;
    let mask_id = doc.add_object(mask);
    for id in images {
        doc.get_object_mut(id)?
            .as_stream_mut()?
            .dict
            .set("SMask", Object::Reference(mask_id));
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn in_to_mm(inches: f32) -> f32 {
    inches * 25.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutInput, layout};
    use crate::model::{StyleSettings, TemplateId};
    use crate::test_util::sample_card;
    use std::collections::BTreeMap;

    fn surface() -> Surface {
        let data = sample_card();
        let style = StyleSettings::default();
        let document = layout(&LayoutInput {
            data: &data,
            style: &style,
            logo: None,
            qr: None,
            template: TemplateId::Modern,
        });
        Surface::new(document, BTreeMap::new())
    }

    #[test]
    fn captures_at_print_resolution_on_a_business_card_page() {
        let doc = export_print(&surface(), &Rasterizer::default()).expect("print");
        assert_eq!(doc.capture_scale, 300.0 / 96.0);
        assert_eq!((doc.image_width, doc.image_height), (1093, 625));
        assert_eq!((doc.page_width_in, doc.page_height_in), (3.5, 2.0));
        assert!(doc.pdf.starts_with(b"%PDF"));
        assert_eq!(doc.file_name(), "business-card.pdf");
    }

    fn floats(objects: &[Object]) -> Vec<f32> {
        objects
            .iter()
            .map(|object| object.as_float().expect("number"))
            .collect()
    }

    fn approx(actual: &[f32], expected: &[f32]) -> bool {
        actual.len() == expected.len()
            && actual.iter().zip(expected).all(|(a, b)| (a - b).abs() < 0.01)
    }

    #[test]
    fn page_holds_one_rgb_image_with_an_alpha_mask() {
        let print = export_print(&surface(), &Rasterizer::default()).expect("print");
        let pdf = lopdf::Document::load_mem(&print.pdf).expect("parse pdf");

        assert_eq!(pdf.version, "1.4");
        let pages = pdf.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = pages[&1];
        let media_box = pdf
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"MediaBox"))
            .and_then(Object::as_array)
            .expect("media box");
        assert!(approx(&floats(media_box), &[0.0, 0.0, 252.0, 144.0]));

        let images: Vec<&Stream> = pdf
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| {
                stream.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..])
            })
            .collect();
        // the capture plus its mask
        assert_eq!(images.len(), 2);
        let capture = images
            .iter()
            .copied()
            .find(|stream| stream.dict.has(b"SMask"))
            .expect("capture image");
        let name = |stream: &Stream, key: &[u8]| {
            stream
                .dict
                .get(key)
                .and_then(Object::as_name_str)
                .map(str::to_string)
                .expect("name")
        };
        let int = |stream: &Stream, key: &[u8]| {
            stream.dict.get(key).and_then(Object::as_i64).expect("integer")
        };
        assert_eq!(name(capture, b"ColorSpace"), "DeviceRGB");
        assert_eq!(int(capture, b"BitsPerComponent"), 8);
        assert_eq!((int(capture, b"Width"), int(capture, b"Height")), (1093, 625));

        let mask_id = capture
            .dict
            .get(b"SMask")
            .and_then(Object::as_reference)
            .expect("mask reference");
        let mask = pdf
            .get_object(mask_id)
            .and_then(Object::as_stream)
            .expect("mask stream");
        assert_eq!(name(mask, b"ColorSpace"), "DeviceGray");
        assert_eq!(int(mask, b"BitsPerComponent"), 8);
        assert_eq!((int(mask, b"Width"), int(mask, b"Height")), (1093, 625));

        let content = pdf
            .get_and_decode_page_content(page_id)
            .expect("page content");
        let placements: Vec<Vec<f32>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "cm")
            .map(|op| floats(&op.operands))
            .collect();
        assert!(
            placements
                .iter()
                .any(|matrix| approx(matrix, &[252.0, 0.0, 0.0, 144.0, 0.0, 0.0])),
            "{placements:?}"
        );
        assert!(content.operations.iter().any(|op| op.operator == "Do"));
    }

    #[test]
    fn alpha_is_split_from_color_samples() {
        let capture =
            RgbaImage::from_raw(2, 1, vec![10, 20, 30, 0, 40, 50, 60, 255]).expect("pixels");
        let (rgb, alpha) = split_alpha(&capture);
        assert_eq!(rgb, [10, 20, 30, 40, 50, 60]);
        assert_eq!(alpha, [0, 255]);
    }

    #[test]
    fn inch_conversion() {
        assert!((in_to_mm(3.5) - 88.9).abs() < 1e-4);
        assert!((in_to_mm(2.0) - 50.8).abs() < 1e-4);
    }
}
