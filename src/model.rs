use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::color::is_hex_color;

/// Contact fields shown on the card. Empty fields are left off the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardData {
    pub name: String,
    pub title: String,
    pub company: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    /// Remote URL, `data:` URL or local file path.
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradientDirection {
    #[serde(rename = "to-t")]
    ToTop,
    #[serde(rename = "to-tr")]
    ToTopRight,
    #[serde(rename = "to-r")]
    ToRight,
    #[default]
    #[serde(rename = "to-br")]
    ToBottomRight,
    #[serde(rename = "to-b")]
    ToBottom,
    #[serde(rename = "to-bl")]
    ToBottomLeft,
    #[serde(rename = "to-l")]
    ToLeft,
    #[serde(rename = "to-tl")]
    ToTopLeft,
}

impl GradientDirection {
    pub const ALL: [GradientDirection; 8] = [
        GradientDirection::ToTop,
        GradientDirection::ToTopRight,
        GradientDirection::ToRight,
        GradientDirection::ToBottomRight,
        GradientDirection::ToBottom,
        GradientDirection::ToBottomLeft,
        GradientDirection::ToLeft,
        GradientDirection::ToTopLeft,
    ];

    pub fn id(self) -> &'static str {
        match self {
            GradientDirection::ToTop => "to-t",
            GradientDirection::ToTopRight => "to-tr",
            GradientDirection::ToRight => "to-r",
            GradientDirection::ToBottomRight => "to-br",
            GradientDirection::ToBottom => "to-b",
            GradientDirection::ToBottomLeft => "to-bl",
            GradientDirection::ToLeft => "to-l",
            GradientDirection::ToTopLeft => "to-tl",
        }
    }

    /// Start and end points of the gradient axis in bounding-box units.
    ///
    /// Diagonals run corner to corner, which matches CSS `to bottom right`
    /// style keywords on any aspect ratio.
    pub fn axis(self) -> ((f32, f32), (f32, f32)) {
        match self {
            GradientDirection::ToTop => ((0.0, 1.0), (0.0, 0.0)),
            GradientDirection::ToTopRight => ((0.0, 1.0), (1.0, 0.0)),
            GradientDirection::ToRight => ((0.0, 0.0), (1.0, 0.0)),
            GradientDirection::ToBottomRight => ((0.0, 0.0), (1.0, 1.0)),
            GradientDirection::ToBottom => ((0.0, 0.0), (0.0, 1.0)),
            GradientDirection::ToBottomLeft => ((1.0, 0.0), (0.0, 1.0)),
            GradientDirection::ToLeft => ((1.0, 0.0), (0.0, 0.0)),
            GradientDirection::ToTopLeft => ((1.0, 1.0), (0.0, 0.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleSettings {
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
    pub use_gradient: bool,
    pub gradient_color: String,
    pub gradient_direction: GradientDirection,
    pub font_family: String,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            text_color: "#1f2937".to_string(),
            accent_color: "#3b82f6".to_string(),
            use_gradient: false,
            gradient_color: "#93c5fd".to_string(),
            gradient_direction: GradientDirection::ToBottomRight,
            font_family: FONT_PRESETS[0].1.to_string(),
        }
    }
}

impl StyleSettings {
    /// Writes a color suggestion back verbatim.
    pub fn apply_suggestion(&mut self, suggestion: &ColorSuggestion) {
        self.background_color = suggestion.background_color.clone();
        self.text_color = suggestion.text_color.clone();
        self.accent_color = suggestion.accent_color.clone();
    }
}

/// A background/text/accent triple produced by the color-suggestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSuggestion {
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
}

impl ColorSuggestion {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw.trim()).with_context(|| "failed to parse color suggestion")
    }

    pub fn is_well_formed(&self) -> bool {
        [&self.background_color, &self.text_color, &self.accent_color]
            .iter()
            .all(|value| is_hex_color(value))
    }
}

/// QR error-correction level, lowest to highest redundancy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ErrorCorrectionLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl ErrorCorrectionLevel {
    pub const ALL: [ErrorCorrectionLevel; 4] = [
        ErrorCorrectionLevel::L,
        ErrorCorrectionLevel::M,
        ErrorCorrectionLevel::Q,
        ErrorCorrectionLevel::H,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ErrorCorrectionLevel::L => "Low",
            ErrorCorrectionLevel::M => "Medium",
            ErrorCorrectionLevel::Q => "Quartile",
            ErrorCorrectionLevel::H => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QrCodeSettings {
    pub enabled: bool,
    pub text: String,
    pub color: String,
    pub error_correction_level: ErrorCorrectionLevel,
}

impl Default for QrCodeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            text: "https://www.example.com".to_string(),
            color: "#000000".to_string(),
            error_correction_level: ErrorCorrectionLevel::M,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Classic,
    Modern,
    Minimalist,
}

impl TemplateId {
    pub const ALL: [TemplateId; 3] = [
        TemplateId::Classic,
        TemplateId::Modern,
        TemplateId::Minimalist,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TemplateId::Classic => "classic",
            TemplateId::Modern => "modern",
            TemplateId::Minimalist => "minimalist",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TemplateId::Classic => "Classic",
            TemplateId::Modern => "Modern",
            TemplateId::Minimalist => "Minimalist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|template| template.id().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Font presets offered to the form layer: (display name, font stack).
pub const FONT_PRESETS: [(&str, &str); 7] = [
    ("Arial", "Arial, sans-serif"),
    ("Times New Roman", "'Times New Roman', serif"),
    ("Verdana", "Verdana, sans-serif"),
    ("Georgia", "Georgia, serif"),
    ("Courier New", "'Courier New', monospace"),
    ("Trebuchet MS", "'Trebuchet MS', sans-serif"),
    (
        "Lucida Sans",
        "'Lucida Sans', 'Lucida Sans Regular', 'Lucida Grande', 'Lucida Sans Unicode', Geneva, Verdana, sans-serif",
    ),
];

/// Raster resolution presets: (dpi, label, description).
pub const DPI_PRESETS: [(u32, &str, &str); 3] = [
    (96, "Standard", "For Web"),
    (150, "Medium", "Good Quality"),
    (300, "High", "For Print"),
];

/// Tab-separated listing of every choice a card description can name.
pub fn preset_catalog() -> Vec<String> {
    let mut lines = Vec::new();
    for template in TemplateId::ALL {
        lines.push(format!("template\t{}\t{}", template.id(), template.display_name()));
    }
    for (name, stack) in FONT_PRESETS {
        lines.push(format!("font\t{}\t{}", name, stack));
    }
    for (dpi, label, description) in DPI_PRESETS {
        lines.push(format!("dpi\t{}\t{} ({})", dpi, label, description));
    }
    for level in ErrorCorrectionLevel::ALL {
        lines.push(format!("qr-level\t{:?}\t{}", level, level.label()));
    }
    for direction in GradientDirection::ALL {
        lines.push(format!("gradient\t{}", direction.id()));
    }
    lines
}

/// Everything the form layer hands to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardSpec {
    pub card: CardData,
    pub style: StyleSettings,
    pub qr_code: QrCodeSettings,
    pub template: TemplateId,
    /// Freshly uploaded logo; wins over `card.logo`.
    pub logo_preview: Option<String>,
}

impl CardSpec {
    /// Loads a card description from `.json` or `.toml`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read card description: {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse card description: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("failed to parse card description: {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_fields_from_json() {
        let raw = r##"{
            "card": { "name": "Jane Doe", "title": "Engineer" },
            "style": { "useGradient": true, "gradientDirection": "to-tl" },
            "qrCode": { "enabled": true, "errorCorrectionLevel": "H" },
            "template": "minimalist"
        }"##;
        let spec: CardSpec = serde_json::from_str(raw).expect("parse");
        assert_eq!(spec.card.name, "Jane Doe");
        assert!(spec.card.company.is_empty());
        assert!(spec.style.use_gradient);
        assert_eq!(spec.style.gradient_direction, GradientDirection::ToTopLeft);
        assert_eq!(spec.style.background_color, "#ffffff");
        assert_eq!(spec.qr_code.error_correction_level, ErrorCorrectionLevel::H);
        assert_eq!(spec.qr_code.text, "https://www.example.com");
        assert_eq!(spec.template, TemplateId::Minimalist);
    }

    #[test]
    fn loads_toml_description_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("card.toml");
        std::fs::write(
            &path,
            "template = \"modern\"\n[card]\nname = \"Ada\"\n[style]\ntextColor = \"#000\"\n",
        )
        .expect("write");
        let spec = CardSpec::load(&path).expect("load");
        assert_eq!(spec.template, TemplateId::Modern);
        assert_eq!(spec.card.name, "Ada");
        assert_eq!(spec.style.text_color, "#000");
    }

    #[test]
    fn suggestion_is_written_back_verbatim() {
        let suggestion = ColorSuggestion::from_json(
            r##"{"backgroundColor":"#0f172a","textColor":"#f8fafc","accentColor":"not-a-color"}"##,
        )
        .expect("suggestion");
        assert!(!suggestion.is_well_formed());
        let mut style = StyleSettings {
            use_gradient: true,
            ..StyleSettings::default()
        };
        style.apply_suggestion(&suggestion);
        assert_eq!(style.background_color, "#0f172a");
        assert_eq!(style.text_color, "#f8fafc");
        assert_eq!(style.accent_color, "not-a-color");
        assert!(style.use_gradient);
    }

    #[test]
    fn gradient_ids_match_serialized_names() {
        for direction in GradientDirection::ALL {
            let serialized = serde_json::to_string(&direction).expect("serialize");
            assert_eq!(serialized, format!("\"{}\"", direction.id()));
            let ((x1, y1), (x2, y2)) = direction.axis();
            assert!([x1, y1, x2, y2].iter().all(|v| (0.0..=1.0).contains(v)));
            assert_ne!((x1, y1), (x2, y2));
        }
    }

    #[test]
    fn catalog_lists_every_preset() {
        let catalog = preset_catalog();
        assert_eq!(catalog.len(), 3 + 7 + 3 + 4 + 8);
        assert!(catalog.contains(&"dpi\t300\tHigh (For Print)".to_string()));
        assert!(catalog.contains(&"qr-level\tQ\tQuartile".to_string()));
        assert!(catalog.contains(&"gradient\tto-br".to_string()));
        assert!(catalog.contains(&"template\tminimalist\tMinimalist".to_string()));
    }

    #[test]
    fn template_ids_round_trip_through_parse() {
        for template in TemplateId::ALL {
            assert_eq!(TemplateId::parse(template.id()), Some(template));
        }
        assert_eq!(TemplateId::parse("Modern"), Some(TemplateId::Modern));
        assert_eq!(TemplateId::parse("gothic"), None);
    }
}
