use crate::config::LayoutConfig;
use crate::text_metrics;
use crate::theme::Theme;

use super::TextBlock;

/// Lay out connector label text into wrapped lines and measure the block.
pub(crate) fn measure_label(text: &str, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    let font_size = theme.font_size;
    let font_family = theme.font_family.as_str();
    let fast_metrics = config.fast_text_metrics;
    if text.trim().is_empty() {
        return TextBlock {
            lines: Vec::new(),
            width: 0.0,
            height: 0.0,
        };
    }

    let max_width_px = config.max_label_width_chars.max(1) as f32
        * average_char_width(font_family, font_size, fast_metrics);
    let mut lines = Vec::new();
    for line in split_lines(text) {
        lines.extend(wrap_line(&line, max_width_px, font_size, font_family, fast_metrics));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    let width = lines
        .iter()
        .map(|line| text_width(line, font_size, font_family, fast_metrics))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font_size * config.label_line_height;

    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' | 'i' | 'j' | 'l' | 'I' => 0.28,
        '(' | ')' | '[' | ']' | '{' | '}' | 'f' | 't' | 'r' => 0.36,
        'm' | 'w' => 0.85,
        'M' | 'W' => 0.9,
        'A'..='Z' => 0.66,
        '0'..='9' => 0.58,
        '@' | '#' | '%' | '&' => 0.946,
        c if !c.is_ascii() => 0.95,
        _ => 0.55,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    text.replace("\\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

pub(super) fn wrap_line(
    line: &str,
    max_width: f32,
    font_size: f32,
    font_family: &str,
    fast_metrics: bool,
) -> Vec<String> {
    if text_width(line, font_size, font_family, fast_metrics) <= max_width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font_size, font_family, fast_metrics) > max_width
            && !current.is_empty()
        {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub(super) fn text_width(text: &str, font_size: f32, font_family: &str, fast_metrics: bool) -> f32 {
    if fast_metrics {
        return fallback_text_width(text, font_size);
    }
    text_metrics::measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| fallback_text_width(text, font_size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

fn average_char_width(font_family: &str, font_size: f32, fast_metrics: bool) -> f32 {
    if fast_metrics {
        return font_size * 0.56;
    }
    text_metrics::average_char_width(font_family, font_size).unwrap_or(font_size * 0.56)
}
