//! Serializes a mounted surface as a standalone SVG document.
//!
//! The same markup feeds both the vector exporter and the rasterizer, so the
//! two outputs never drift apart.

use tracing::warn;

use crate::color::Rgba;
use crate::error::{CardError, Result};
use crate::layout::{
    Background, CardDocument, ImageFit, ImagePlacement, Primitive, RuleShape, TextAnchor, TextRun,
};
use crate::surface::{ImageState, Surface};

/// What to do with an image the surface failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingImage {
    /// Leave it out, like a browser showing a broken image.
    Skip,
    Abort,
}

const CLIP_ID: &str = "card-clip";
const GRADIENT_ID: &str = "card-bg";

pub(crate) fn render_svg(surface: &Surface, missing: MissingImage) -> Result<String> {
    let doc = surface.document();
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{family}">"#,
        w = num(doc.width),
        h = num(doc.height),
        family = escape_xml(&doc.font_family),
    ));
    svg.push_str(&defs(doc)?);
    svg.push_str(&format!(r#"<g clip-path="url(#{})">"#, CLIP_ID));
    svg.push_str(&background_rect(doc)?);

    for element in &doc.elements {
        match &element.primitive {
            Primitive::Text(run) => svg.push_str(&text(run)?),
            Primitive::Rule(rule) => svg.push_str(&rule_rect(rule)?),
            Primitive::Image(image) => {
                if let Some(markup) = image_tag(surface, image, missing)? {
                    svg.push_str(&markup);
                }
            }
        }
    }

    svg.push_str("</g></svg>");
    Ok(svg)
}

fn defs(doc: &CardDocument) -> Result<String> {
    let mut out = String::from("<defs>");
    out.push_str(&format!(
        r#"<clipPath id="{id}"><rect x="0" y="0" width="{w}" height="{h}" rx="{r}" ry="{r}"/></clipPath>"#,
        id = CLIP_ID,
        w = num(doc.width),
        h = num(doc.height),
        r = num(doc.corner_radius),
    ));
    if let Background::LinearGradient {
        from,
        to,
        direction,
    } = &doc.background
    {
        let ((x1, y1), (x2, y2)) = direction.axis();
        out.push_str(&format!(
            r#"<linearGradient id="{id}" x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}">"#,
            id = GRADIENT_ID,
            x1 = num(x1),
            y1 = num(y1),
            x2 = num(x2),
            y2 = num(y2),
        ));
        out.push_str(&format!(
            r#"<stop offset="0"{}/>"#,
            paint("stop-color", "stop-opacity", from)?
        ));
        out.push_str(&format!(
            r#"<stop offset="1"{}/>"#,
            paint("stop-color", "stop-opacity", to)?
        ));
        out.push_str("</linearGradient>");
    }
    out.push_str("</defs>");
    Ok(out)
}

fn background_rect(doc: &CardDocument) -> Result<String> {
    let fill = match &doc.background {
        Background::Solid { color } => paint("fill", "fill-opacity", color)?,
        Background::LinearGradient { .. } => format!(r#" fill="url(#{})""#, GRADIENT_ID),
    };
    Ok(format!(
        r#"<rect x="0" y="0" width="{w}" height="{h}"{fill}/>"#,
        w = num(doc.width),
        h = num(doc.height),
    ))
}

fn text(run: &TextRun) -> Result<String> {
    let anchor = match run.anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    };
    let mut out = format!(
        r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="{weight}" text-anchor="{anchor}""#,
        x = num(run.x),
        y = num(run.y),
        size = num(run.font_size),
        weight = run.font_weight,
    );
    if run.letter_spacing != 0.0 {
        out.push_str(&format!(r#" letter-spacing="{}""#, num(run.letter_spacing)));
    }
    out.push_str(&paint("fill", "fill-opacity", &run.color)?);
    out.push('>');
    for (idx, line) in run.lines.iter().enumerate() {
        let escaped = escape_xml(line);
        if idx == 0 {
            out.push_str(&escaped);
        } else {
            out.push_str(&format!(
                r#"<tspan x="{x}" dy="{dy}">{text}</tspan>"#,
                x = num(run.x),
                dy = num(run.line_height),
                text = escaped
            ));
        }
    }
    out.push_str("</text>");
    Ok(out)
}

fn rule_rect(rule: &RuleShape) -> Result<String> {
    Ok(format!(
        r#"<rect x="{x}" y="{y}" width="{w}" height="{h}"{fill}/>"#,
        x = num(rule.x),
        y = num(rule.y),
        w = num(rule.width),
        h = num(rule.height),
        fill = paint("fill", "fill-opacity", &rule.color)?,
    ))
}

fn image_tag(surface: &Surface, image: &ImagePlacement, missing: MissingImage) -> Result<Option<String>> {
    let data = match surface.image(&image.source) {
        Some(ImageState::Loaded(data)) => data,
        state => {
            let reason = match state {
                Some(ImageState::Failed(reason)) => reason.clone(),
                _ => "image was not loaded".to_string(),
            };
            return match missing {
                MissingImage::Skip => {
                    warn!("svg: skipping image {}: {}", image.source.location(), reason);
                    Ok(None)
                }
                MissingImage::Abort => Err(CardError::ImageLoad {
                    location: image.source.location(),
                    reason,
                }),
            };
        }
    };
    let aspect = match image.fit {
        ImageFit::TopLeft => "xMinYMin meet",
        ImageFit::BottomLeft => "xMinYMax meet",
        ImageFit::Center => "xMidYMid meet",
    };
    let uri = data.data_uri();
    Ok(Some(format!(
        r#"<image x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="{aspect}" href="{uri}" xlink:href="{uri}"/>"#,
        x = num(image.x),
        y = num(image.y),
        w = num(image.width),
        h = num(image.height),
    )))
}

/// ` attr="#rrggbb"` plus an opacity attribute when the color is translucent.
fn paint(color_attr: &str, opacity_attr: &str, value: &str) -> Result<String> {
    let color = Rgba::parse_hex(value)?;
    let mut out = format!(r#" {}="{}""#, color_attr, color.to_hex_rgb());
    if !color.is_opaque() {
        out.push_str(&format!(r#" {}="{}""#, opacity_attr, num(color.opacity())));
    }
    Ok(out)
}

/// Fixed two-decimal output with trailing zeros trimmed.
fn num(value: f32) -> String {
    let mut text = format!("{:.2}", value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ImageData, ImageRef, PNG_MIME};
    use crate::layout::{LayoutInput, Role, layout};
    use crate::model::{CardData, GradientDirection, StyleSettings, TemplateId};
    use crate::test_util::{sample_card, tiny_png};
    use std::collections::BTreeMap;

    fn surface_for(
        data: &CardData,
        style: &StyleSettings,
        logo: Option<&ImageRef>,
        template: TemplateId,
        images: BTreeMap<ImageRef, ImageState>,
    ) -> Surface {
        let document = layout(&LayoutInput {
            data,
            style,
            logo,
            qr: None,
            template,
        });
        Surface::new(document, images)
    }

    #[test]
    fn empty_card_markup() {
        let surface = surface_for(
            &CardData::default(),
            &StyleSettings::default(),
            None,
            TemplateId::Classic,
            BTreeMap::new(),
        );
        let svg = render_svg(&surface, MissingImage::Abort).expect("svg");
        insta::assert_snapshot!(svg, @r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="350" height="200" viewBox="0 0 350 200" font-family="Arial, sans-serif"><defs><clipPath id="card-clip"><rect x="0" y="0" width="350" height="200" rx="12" ry="12"/></clipPath></defs><g clip-path="url(#card-clip)"><rect x="0" y="0" width="350" height="200" fill="#ffffff"/></g></svg>"##);
    }

    #[test]
    fn gradient_background_follows_direction() {
        let style = StyleSettings {
            use_gradient: true,
            gradient_direction: GradientDirection::ToRight,
            ..StyleSettings::default()
        };
        let surface = surface_for(
            &CardData::default(),
            &style,
            None,
            TemplateId::Modern,
            BTreeMap::new(),
        );
        let svg = render_svg(&surface, MissingImage::Abort).expect("svg");
        assert!(svg.contains(r#"<linearGradient id="card-bg" x1="0" y1="0" x2="1" y2="0">"#));
        assert!(svg.contains(r##"<stop offset="0" stop-color="#ffffff"/>"##));
        assert!(svg.contains(r##"<stop offset="1" stop-color="#93c5fd"/>"##));
        assert!(svg.contains(r#"fill="url(#card-bg)""#));
    }

    #[test]
    fn text_is_escaped_and_wrapped_into_tspans() {
        let data = CardData {
            name: "Jane <Doe> & Co".to_string(),
            address: "123 Innovation Drive, Tech City, Some Very Long Province".to_string(),
            ..CardData::default()
        };
        let surface = surface_for(
            &data,
            &StyleSettings::default(),
            None,
            TemplateId::Classic,
            BTreeMap::new(),
        );
        let svg = render_svg(&surface, MissingImage::Abort).expect("svg");
        assert!(svg.contains("Jane &lt;Doe&gt; &amp; Co"));
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(r#"<tspan x="326" dy="16">"#));
    }

    #[test]
    fn translucent_colors_get_opacity() {
        let style = StyleSettings {
            text_color: "#1f293780".to_string(),
            ..StyleSettings::default()
        };
        let surface = surface_for(&sample_card(), &style, None, TemplateId::Classic, BTreeMap::new());
        let svg = render_svg(&surface, MissingImage::Abort).expect("svg");
        assert!(svg.contains(r##"fill="#1f2937" fill-opacity="0.5""##));
    }

    #[test]
    fn malformed_color_is_rejected() {
        let style = StyleSettings {
            accent_color: "blue".to_string(),
            ..StyleSettings::default()
        };
        let surface = surface_for(&sample_card(), &style, None, TemplateId::Modern, BTreeMap::new());
        let err = render_svg(&surface, MissingImage::Skip).expect_err("bad color");
        assert!(matches!(err, CardError::InvalidColor(_)));
    }

    #[test]
    fn loaded_images_are_embedded_as_data_uris() {
        let logo = ImageRef::Remote("https://example.com/logo.png".to_string());
        let images = BTreeMap::from([(
            logo.clone(),
            ImageState::Loaded(ImageData {
                mime: PNG_MIME.to_string(),
                bytes: tiny_png(),
            }),
        )]);
        let surface = surface_for(
            &sample_card(),
            &StyleSettings::default(),
            Some(&logo),
            TemplateId::Classic,
            images,
        );
        assert!(surface.document().has(Role::Logo));
        let svg = render_svg(&surface, MissingImage::Abort).expect("svg");
        assert!(svg.contains(r#"preserveAspectRatio="xMinYMin meet" href="data:image/png;base64,"#));
        assert!(!svg.contains("https://example.com/logo.png"));
    }

    #[test]
    fn failed_images_skip_or_abort() {
        let logo = ImageRef::Remote("https://unreachable.invalid/logo.png".to_string());
        let images = BTreeMap::from([(logo.clone(), ImageState::Failed("unreachable".to_string()))]);
        let surface = surface_for(
            &sample_card(),
            &StyleSettings::default(),
            Some(&logo),
            TemplateId::Minimalist,
            images,
        );
        let skipped = render_svg(&surface, MissingImage::Skip).expect("skip");
        assert!(!skipped.contains("<image"));
        let err = render_svg(&surface, MissingImage::Abort).expect_err("abort");
        assert!(matches!(err, CardError::ImageLoad { .. }));
    }

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(num(350.0), "350");
        assert_eq!(num(201.3333), "201.33");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(-0.001), "0");
    }
}
