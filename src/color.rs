use crate::error::{CardError, Result};

/// An 8-bit RGBA color parsed from a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn parse_hex(value: &str) -> Result<Self> {
        let raw = value.trim();
        let hex = raw.strip_prefix('#').unwrap_or(raw);
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(CardError::InvalidColor(value.to_string()));
        }
        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|ch| [ch, ch]).collect(),
            6 | 8 => hex.to_string(),
            _ => return Err(CardError::InvalidColor(value.to_string())),
        };
        let channel = |idx: usize| -> Result<u8> {
            u8::from_str_radix(&expanded[idx * 2..idx * 2 + 2], 16)
                .map_err(|_| CardError::InvalidColor(value.to_string()))
        };
        let a = if expanded.len() == 8 { channel(3)? } else { 255 };
        Ok(Self {
            r: channel(0)?,
            g: channel(1)?,
            b: channel(2)?,
            a,
        })
    }

    pub fn to_hex_rgb(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

pub fn is_hex_color(value: &str) -> bool {
    Rgba::parse_hex(value).is_ok()
}
