//! Deterministic text metrics.
//!
//! Layout must not depend on which fonts happen to be installed, so widths are
//! estimated from per-character em units rather than measured from a face.

fn estimate_char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.28
    } else if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
        0.64
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF | 0xAC00..=0xD7AF
    ) {
        1.0
    } else {
        0.9
    }
}

pub(crate) fn estimate_text_width(text: &str, font_size: f32, letter_spacing: f32) -> f32 {
    let count = text.chars().count() as f32;
    let units: f32 = text.chars().map(estimate_char_units).sum();
    units * font_size + letter_spacing * count
}

/// Greedy word wrap. Words wider than `max_width` stay on their own line
/// rather than being broken.
pub(crate) fn wrap_text(text: &str, font_size: f32, letter_spacing: f32, max_width: f32) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if estimate_text_width(&candidate, font_size, letter_spacing) > max_width {
            result.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// Baseline offset of a single line inside a CSS-style line box.
pub(crate) fn baseline_offset(line_height: f32, font_size: f32) -> f32 {
    (line_height + font_size * 0.7) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("123 Innovation Drive, Tech City", 12.0, 0.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "123 Innovation Drive, Tech City");
        for line in &lines {
            let single_word = !line.contains(' ');
            assert!(single_word || estimate_text_width(line, 12.0, 0.0) <= 100.0);
        }
    }

    #[test]
    fn long_words_are_not_split() {
        let lines = wrap_text("jane.doe@example.com", 12.0, 0.0, 40.0);
        assert_eq!(lines, vec!["jane.doe@example.com".to_string()]);
    }

    #[test]
    fn whitespace_only_text_produces_no_lines() {
        assert!(wrap_text("   ", 12.0, 0.0, 100.0).is_empty());
    }

    #[test]
    fn letter_spacing_widens_text() {
        let plain = estimate_text_width("JANE DOE", 24.0, 0.0);
        let spaced = estimate_text_width("JANE DOE", 24.0, 1.2);
        assert!((spaced - plain - 8.0 * 1.2).abs() < 1e-3);
    }
}
