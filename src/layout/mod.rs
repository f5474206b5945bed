//! Template layout engine.
//!
//! [`layout`] is a pure function of its inputs: it rebuilds the whole
//! [`CardDocument`] every time and never consults fonts, files or the network.

use serde::Serialize;

use crate::data::ImageRef;
use crate::model::{CardData, GradientDirection, StyleSettings, TemplateId};
use crate::qr::Bitmap;

mod classic;
mod minimalist;
mod modern;
pub(crate) mod text;

use text::{baseline_offset, wrap_text};

pub const CARD_WIDTH: f32 = 350.0;
pub const CARD_HEIGHT: f32 = 200.0;
pub const CARD_CORNER_RADIUS: f32 = 12.0;
pub(crate) const PADDING: f32 = 24.0;

/// The abstract visual document every exporter renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDocument {
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub font_family: String,
    pub background: Background,
    pub elements: Vec<Element>,
}

impl CardDocument {
    pub fn elements_with(&self, role: Role) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |element| element.role == role)
    }

    pub fn has(&self, role: Role) -> bool {
        self.elements_with(role).next().is_some()
    }

    /// Every image the document places, in paint order.
    pub fn images(&self) -> impl Iterator<Item = &ImageRef> {
        self.elements.iter().filter_map(|element| match &element.primitive {
            Primitive::Image(image) => Some(&image.source),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    Solid {
        color: String,
    },
    LinearGradient {
        from: String,
        to: String,
        direction: GradientDirection,
    },
}

impl Background {
    pub fn from_style(style: &StyleSettings) -> Self {
        if style.use_gradient {
            Background::LinearGradient {
                from: style.background_color.clone(),
                to: style.gradient_color.clone(),
                direction: style.gradient_direction,
            }
        } else {
            Background::Solid {
                color: style.background_color.clone(),
            }
        }
    }
}

/// The semantic slot a primitive renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Logo,
    Name,
    Title,
    Company,
    Phone,
    Email,
    Website,
    Address,
    /// Minimalist `phone | email` line.
    ContactLine,
    Divider,
    QrCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub role: Role,
    pub primitive: Primitive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Text(TextRun),
    Image(ImagePlacement),
    Rule(RuleShape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// One or more lines of text; `y` is the first baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub font_weight: u16,
    pub letter_spacing: f32,
    pub color: String,
    pub anchor: TextAnchor,
    pub lines: Vec<String>,
}

/// Where an image sits inside its box when scaled to fit (object-contain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    TopLeft,
    BottomLeft,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fit: ImageFit,
    pub source: ImageRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleShape {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
}

/// Everything a template arrangement reads.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInput<'a> {
    pub data: &'a CardData,
    pub style: &'a StyleSettings,
    pub logo: Option<&'a ImageRef>,
    pub qr: Option<&'a Bitmap>,
    pub template: TemplateId,
}

type Arrange = fn(&LayoutInput<'_>) -> Vec<Element>;

fn arrangement(template: TemplateId) -> Arrange {
    match template {
        TemplateId::Classic => classic::arrange,
        TemplateId::Modern => modern::arrange,
        TemplateId::Minimalist => minimalist::arrange,
    }
}

pub fn layout(input: &LayoutInput<'_>) -> CardDocument {
    let elements = arrangement(input.template)(input);
    CardDocument {
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
        corner_radius: CARD_CORNER_RADIUS,
        font_family: input.style.font_family.clone(),
        background: Background::from_style(input.style),
        elements,
    }
}

/// A freshly uploaded preview wins over the persisted logo reference.
pub fn resolve_logo(preview: Option<&str>, persisted: Option<&str>) -> Option<ImageRef> {
    preview
        .and_then(ImageRef::parse)
        .or_else(|| persisted.and_then(ImageRef::parse))
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TextStyle {
    pub font_size: f32,
    pub line_height: f32,
    pub weight: u16,
    pub letter_spacing: f32,
}

impl TextStyle {
    pub const fn new(font_size: f32, line_height: f32, weight: u16) -> Self {
        Self {
            font_size,
            line_height,
            weight,
            letter_spacing: 0.0,
        }
    }

    pub const fn tracking(mut self, em: f32) -> Self {
        self.letter_spacing = self.font_size * em;
        self
    }
}

pub(crate) const CONTACT_TEXT: TextStyle = TextStyle::new(12.0, 16.0, 400);
pub(crate) const CONTACT_ROW_GAP: f32 = 4.0;

/// Wraps `text` into a block whose line boxes start at `top`.
/// Returns `None` for blank text so the slot is omitted.
#[allow(clippy::too_many_arguments)]
pub(crate) fn text_block(
    role: Role,
    text: &str,
    style: TextStyle,
    color: &str,
    x: f32,
    top: f32,
    anchor: TextAnchor,
    max_width: f32,
) -> Option<(Element, f32)> {
    let lines = wrap_text(text, style.font_size, style.letter_spacing, max_width);
    if lines.is_empty() {
        return None;
    }
    let height = lines.len() as f32 * style.line_height;
    let run = TextRun {
        x,
        y: top + baseline_offset(style.line_height, style.font_size),
        font_size: style.font_size,
        line_height: style.line_height,
        font_weight: style.weight,
        letter_spacing: style.letter_spacing,
        color: color.to_string(),
        anchor,
        lines,
    };
    Some((
        Element {
            role,
            primitive: Primitive::Text(run),
        },
        height,
    ))
}

/// Height of a block without placing it, for bottom-aligned or centered stacks.
pub(crate) fn block_height(text: &str, style: TextStyle, max_width: f32) -> f32 {
    wrap_text(text, style.font_size, style.letter_spacing, max_width).len() as f32
        * style.line_height
}

/// Phone, email, website and address stacked so the last row ends at `bottom`.
pub(crate) fn contact_block(
    data: &CardData,
    color: &str,
    x: f32,
    bottom: f32,
    anchor: TextAnchor,
    max_width: f32,
) -> Vec<Element> {
    let rows: Vec<(Role, &str)> = [
        (Role::Phone, data.phone.as_str()),
        (Role::Email, data.email.as_str()),
        (Role::Website, data.website.as_str()),
        (Role::Address, data.address.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .collect();

    let heights: Vec<f32> = rows
        .iter()
        .map(|(_, value)| block_height(value, CONTACT_TEXT, max_width))
        .collect();
    let total = heights.iter().sum::<f32>() + CONTACT_ROW_GAP * rows.len().saturating_sub(1) as f32;

    let mut top = bottom - total;
    let mut elements = Vec::with_capacity(rows.len());
    for (role, value) in rows {
        if let Some((element, height)) =
            text_block(role, value, CONTACT_TEXT, color, x, top, anchor, max_width)
        {
            top += height + CONTACT_ROW_GAP;
            elements.push(element);
        }
    }
    elements
}

pub(crate) fn image_element(
    role: Role,
    source: ImageRef,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    fit: ImageFit,
) -> Element {
    Element {
        role,
        primitive: Primitive::Image(ImagePlacement {
            x,
            y,
            width,
            height,
            fit,
            source,
        }),
    }
}

pub(crate) fn qr_element(qr: &Bitmap, x: f32, y: f32, size: f32) -> Option<Element> {
    if qr.is_empty() {
        return None;
    }
    Some(image_element(
        Role::QrCode,
        qr.to_image_ref(),
        x,
        y,
        size,
        size,
        ImageFit::Center,
    ))
}

pub(crate) fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}
