//! Single column: identity and rule on top, contacts bottom-right, logo and QR
//! pinned to the bottom corners.
//!
//! The QR code may overlap the contact block when both are present; the
//! arrangement is fixed and does not reflow around it.

use super::{
    CARD_HEIGHT, CARD_WIDTH, Element, ImageFit, LayoutInput, PADDING, Primitive, Role, RuleShape,
    TextAnchor, TextStyle, contact_block, image_element, qr_element, text_block,
};

const NAME: TextStyle = TextStyle::new(24.0, 32.0, 700);
const TITLE: TextStyle = TextStyle::new(16.0, 24.0, 400);
const COMPANY: TextStyle = TextStyle::new(18.0, 28.0, 600);
const RULE_MARGIN: f32 = 8.0;
const RULE_THICKNESS: f32 = 1.0;
const LOGO_WIDTH: f32 = 80.0;
const LOGO_HEIGHT: f32 = 48.0;
const CORNER_INSET: f32 = 16.0;
const QR_SIZE: f32 = 64.0;

pub(super) fn arrange(input: &LayoutInput<'_>) -> Vec<Element> {
    let data = input.data;
    let style = input.style;
    let inner_width = CARD_WIDTH - PADDING * 2.0;
    let mut elements = Vec::new();
    let mut cursor = PADDING;

    for (role, value, text_style, color) in [
        (Role::Name, data.name.as_str(), NAME, style.text_color.as_str()),
        (Role::Title, data.title.as_str(), TITLE, style.accent_color.as_str()),
    ] {
        if let Some((element, height)) = text_block(
            role,
            value,
            text_style,
            color,
            PADDING,
            cursor,
            TextAnchor::Start,
            inner_width,
        ) {
            cursor += height;
            elements.push(element);
        }
    }

    cursor += RULE_MARGIN;
    elements.push(Element {
        role: Role::Divider,
        primitive: Primitive::Rule(RuleShape {
            x: PADDING,
            y: cursor,
            width: inner_width,
            height: RULE_THICKNESS,
            color: style.accent_color.clone(),
        }),
    });
    cursor += RULE_THICKNESS + RULE_MARGIN;

    if let Some((element, _)) = text_block(
        Role::Company,
        &data.company,
        COMPANY,
        &style.text_color,
        PADDING,
        cursor,
        TextAnchor::Start,
        inner_width,
    ) {
        elements.push(element);
    }

    elements.extend(contact_block(
        data,
        &style.text_color,
        CARD_WIDTH - PADDING,
        CARD_HEIGHT - PADDING,
        TextAnchor::End,
        inner_width,
    ));

    if let Some(logo) = input.logo {
        elements.push(image_element(
            Role::Logo,
            logo.clone(),
            CORNER_INSET,
            CARD_HEIGHT - CORNER_INSET - LOGO_HEIGHT,
            LOGO_WIDTH,
            LOGO_HEIGHT,
            ImageFit::BottomLeft,
        ));
    }

    if let Some(qr) = input.qr.and_then(|qr| {
        qr_element(
            qr,
            CARD_WIDTH - CORNER_INSET - QR_SIZE,
            CARD_HEIGHT - CORNER_INSET - QR_SIZE,
            QR_SIZE,
        )
    }) {
        elements.push(qr);
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ImageRef;
    use crate::layout::{ImagePlacement, layout};
    use crate::model::{StyleSettings, TemplateId};
    use crate::test_util::{sample_card, sample_qr};

    fn image(doc: &crate::layout::CardDocument, role: Role) -> ImagePlacement {
        match &doc.elements_with(role).next().expect("image").primitive {
            Primitive::Image(image) => image.clone(),
            _ => panic!("{role:?} is not an image"),
        }
    }

    #[test]
    fn corners_hold_logo_and_qr() {
        let data = sample_card();
        let style = StyleSettings::default();
        let logo = ImageRef::Remote("https://example.com/logo.png".to_string());
        let qr = sample_qr();
        let doc = layout(&LayoutInput {
            data: &data,
            style: &style,
            logo: Some(&logo),
            qr: Some(&qr),
            template: TemplateId::Modern,
        });
        let logo = image(&doc, Role::Logo);
        assert_eq!((logo.x, logo.y, logo.width, logo.height), (16.0, 136.0, 80.0, 48.0));
        assert_eq!(logo.fit, ImageFit::BottomLeft);
        let qr = image(&doc, Role::QrCode);
        assert_eq!((qr.x, qr.y, qr.width, qr.height), (270.0, 120.0, 64.0, 64.0));
    }

    #[test]
    fn rule_sits_between_title_and_company() {
        let data = sample_card();
        let style = StyleSettings::default();
        let doc = layout(&LayoutInput {
            data: &data,
            style: &style,
            logo: None,
            qr: None,
            template: TemplateId::Modern,
        });
        let Primitive::Rule(rule) = &doc.elements_with(Role::Divider).next().expect("rule").primitive
        else {
            panic!("divider is a rule");
        };
        assert_eq!(rule.color, style.accent_color);
        assert_eq!(rule.width, 302.0);
        let Primitive::Text(company) = &doc.elements_with(Role::Company).next().expect("company").primitive
        else {
            panic!("company is text");
        };
        assert!(company.y > rule.y + rule.height);
    }

    #[test]
    fn qr_overlapping_contacts_is_kept() {
        let data = sample_card();
        let style = StyleSettings::default();
        let qr = sample_qr();
        let doc = layout(&LayoutInput {
            data: &data,
            style: &style,
            logo: None,
            qr: Some(&qr),
            template: TemplateId::Modern,
        });
        assert!(doc.has(Role::QrCode));
        assert!(doc.has(Role::Address));
    }
}
