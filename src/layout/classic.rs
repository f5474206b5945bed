//! Two columns: identity on the left, contact details bottom-right.

use super::{
    CARD_HEIGHT, CARD_WIDTH, Element, ImageFit, LayoutInput, PADDING, Role, TextAnchor, TextStyle,
    contact_block, image_element, qr_element, text_block,
};

const LOGO_HEIGHT: f32 = 48.0;
const LOGO_GAP: f32 = 16.0;
const NAME: TextStyle = TextStyle::new(24.0, 32.0, 600);
const TITLE: TextStyle = TextStyle::new(16.0, 24.0, 400);
const COMPANY: TextStyle = TextStyle::new(14.0, 20.0, 500);
const COMPANY_GAP: f32 = 4.0;
const QR_SIZE: f32 = 64.0;
const QR_INSET: f32 = 16.0;

pub(super) fn arrange(input: &LayoutInput<'_>) -> Vec<Element> {
    let data = input.data;
    let style = input.style;
    let inner_width = CARD_WIDTH - PADDING * 2.0;
    let left_width = inner_width * 2.0 / 3.0;
    let right_width = inner_width - left_width;
    let mut elements = Vec::new();

    let mut cursor = PADDING;
    if let Some(logo) = input.logo {
        elements.push(image_element(
            Role::Logo,
            logo.clone(),
            PADDING,
            cursor,
            left_width,
            LOGO_HEIGHT,
            ImageFit::TopLeft,
        ));
        cursor += LOGO_HEIGHT + LOGO_GAP;
    }

    let identity = [
        (Role::Name, data.name.as_str(), NAME, style.text_color.as_str(), 0.0),
        (Role::Title, data.title.as_str(), TITLE, style.accent_color.as_str(), 0.0),
        (
            Role::Company,
            data.company.as_str(),
            COMPANY,
            style.text_color.as_str(),
            COMPANY_GAP,
        ),
    ];
    for (role, value, text_style, color, gap) in identity {
        if let Some((element, height)) = text_block(
            role,
            value,
            text_style,
            color,
            PADDING,
            cursor + gap,
            TextAnchor::Start,
            left_width,
        ) {
            cursor += gap + height;
            elements.push(element);
        }
    }

    if let Some(qr) = input.qr.and_then(|qr| {
        qr_element(qr, QR_INSET, CARD_HEIGHT - QR_INSET - QR_SIZE, QR_SIZE)
    }) {
        elements.push(qr);
    }

    elements.extend(contact_block(
        data,
        &style.text_color,
        CARD_WIDTH - PADDING,
        CARD_HEIGHT - PADDING,
        TextAnchor::End,
        right_width,
    ));
    elements
}
