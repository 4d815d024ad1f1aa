use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Advance width of a single line of text, or `None` when no usable font is installed.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

pub fn average_char_width(font_family: &str, font_size: f32) -> Option<f32> {
    if font_size <= 0.0 {
        return None;
    }
    let sample = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let width = measure_text_width(sample, font_size, font_family)?;
    Some(width / sample.chars().count() as f32)
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontMetrics>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_string();
        if !self.faces.contains_key(&key) {
            let metrics = self.load_metrics(font_family);
            if metrics.is_none() {
                tracing::debug!(family = font_family, "no font face found, using estimates");
            }
            self.faces.insert(key.clone(), metrics);
        }
        let metrics = self.faces.get(&key)?.as_ref()?;
        Some(metrics.width(&text.replace('\t', "    "), font_size))
    }

    fn load_metrics(&mut self, font_family: &str) -> Option<FontMetrics> {
        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                _ => Family::Name(name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| {
                Face::parse(data, index).ok().map(|face| FontMetrics::from_face(&face))
            })
            .flatten()
    }
}

/// Horizontal advances extracted once per face so the font bytes need not be kept.
struct FontMetrics {
    units_per_em: f32,
    advances: HashMap<char, u16>,
    fallback_advance: u16,
}

impl FontMetrics {
    fn from_face(face: &Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let mut advances = HashMap::new();
        let mut sample_chars: Vec<char> = (32u8..127).map(char::from).collect();
        sample_chars.extend("äöüßéèàçñ–—…“”‘’".chars());
        for ch in sample_chars {
            if let Some(advance) = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
            {
                advances.insert(ch, advance);
            }
        }
        let fallback_advance = advances
            .get(&'n')
            .copied()
            .unwrap_or(units_per_em / 2);
        Self {
            units_per_em: units_per_em as f32,
            advances,
            fallback_advance,
        }
    }

    fn width(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em;
        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                self.advances
                    .get(&ch)
                    .copied()
                    .unwrap_or(self.fallback_advance) as f32
                    * scale
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(measure_text_width("", 14.0, "sans-serif"), Some(0.0));
        assert_eq!(measure_text_width("abc", 0.0, "sans-serif"), Some(0.0));
    }

    #[test]
    fn measured_width_grows_with_text_when_fonts_exist() {
        let Some(short) = measure_text_width("ab", 14.0, "sans-serif") else {
            return;
        };
        let long = measure_text_width("abababab", 14.0, "sans-serif").unwrap_or(0.0);
        assert!(long > short);
    }
}
