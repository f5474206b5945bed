//! Centered column with upper-cased, tracked name and title.

use super::{
    CARD_HEIGHT, CARD_WIDTH, Element, ImageFit, LayoutInput, PADDING, Primitive, Role, RuleShape,
    TextAnchor, TextStyle, block_height, image_element, is_present, qr_element, text_block,
};

const LOGO_HEIGHT: f32 = 48.0;
const LOGO_GAP: f32 = 12.0;
const NAME: TextStyle = TextStyle::new(24.0, 32.0, 300).tracking(0.05);
const TITLE: TextStyle = TextStyle::new(14.0, 20.0, 600).tracking(0.1);
const SMALL: TextStyle = TextStyle::new(12.0, 16.0, 400);
const DIVIDER_WIDTH: f32 = 64.0;
const DIVIDER_MARGIN: f32 = 12.0;
const CONTACT_GAP: f32 = 8.0;
const QR_SIZE: f32 = 48.0;
const QR_INSET: f32 = 8.0;

enum Slot {
    Logo,
    Text {
        role: Role,
        text: String,
        style: TextStyle,
        color: String,
        gap: f32,
    },
    Divider,
}

fn contact_line(phone: &str, email: &str) -> String {
    [phone, email]
        .into_iter()
        .filter(|value| is_present(value))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn push_text(slots: &mut Vec<Slot>, role: Role, text: String, style: TextStyle, color: &str, gap: f32) {
    if is_present(&text) {
        slots.push(Slot::Text {
            role,
            text,
            style,
            color: color.to_string(),
            gap,
        });
    }
}

pub(super) fn arrange(input: &LayoutInput<'_>) -> Vec<Element> {
    let data = input.data;
    let style = input.style;
    let inner_width = CARD_WIDTH - PADDING * 2.0;
    let center = CARD_WIDTH / 2.0;

    let mut slots = Vec::new();
    if input.logo.is_some() {
        slots.push(Slot::Logo);
    }
    push_text(&mut slots, Role::Name, data.name.to_uppercase(), NAME, &style.text_color, 0.0);
    push_text(
        &mut slots,
        Role::Title,
        data.title.to_uppercase(),
        TITLE,
        &style.accent_color,
        0.0,
    );
    slots.push(Slot::Divider);
    push_text(&mut slots, Role::Company, data.company.clone(), SMALL, &style.text_color, 0.0);
    push_text(
        &mut slots,
        Role::ContactLine,
        contact_line(&data.phone, &data.email),
        SMALL,
        &style.text_color,
        CONTACT_GAP,
    );

    let total: f32 = slots
        .iter()
        .map(|slot| match slot {
            Slot::Logo => LOGO_HEIGHT + LOGO_GAP,
            Slot::Text {
                text, style, gap, ..
            } => gap + block_height(text, *style, inner_width),
            Slot::Divider => DIVIDER_MARGIN * 2.0 + 1.0,
        })
        .sum();
    let mut cursor = PADDING + (CARD_HEIGHT - PADDING * 2.0 - total) / 2.0;

    let mut elements = Vec::new();
    for slot in slots {
        match slot {
            Slot::Logo => {
                if let Some(logo) = input.logo {
                    elements.push(image_element(
                        Role::Logo,
                        logo.clone(),
                        PADDING,
                        cursor,
                        inner_width,
                        LOGO_HEIGHT,
                        ImageFit::Center,
                    ));
                }
                cursor += LOGO_HEIGHT + LOGO_GAP;
            }
            Slot::Text {
                role,
                text,
                style: text_style,
                color,
                gap,
            } => {
                cursor += gap;
                if let Some((element, height)) = text_block(
                    role,
                    &text,
                    text_style,
                    &color,
                    center,
                    cursor,
                    TextAnchor::Middle,
                    inner_width,
                ) {
                    cursor += height;
                    elements.push(element);
                }
            }
            Slot::Divider => {
                cursor += DIVIDER_MARGIN;
                elements.push(Element {
                    role: Role::Divider,
                    primitive: Primitive::Rule(RuleShape {
                        x: center - DIVIDER_WIDTH / 2.0,
                        y: cursor,
                        width: DIVIDER_WIDTH,
                        height: 1.0,
                        color: style.accent_color.clone(),
                    }),
                });
                cursor += 1.0 + DIVIDER_MARGIN;
            }
        }
    }

    if let Some(qr) = input.qr.and_then(|qr| {
        qr_element(
            qr,
            CARD_WIDTH - QR_INSET - QR_SIZE,
            CARD_HEIGHT - QR_INSET - QR_SIZE,
            QR_SIZE,
        )
    }) {
        elements.push(qr);
    }
    elements
}
