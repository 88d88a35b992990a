//! Font-free text measurement.
//!
//! Layout must run without a font backend, so widths come from a per-character advance table
//! expressed in em. The proportions follow common sans-serif faces closely enough that labels are
//! not clipped by the shapes sized around them.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub bold: bool,
    /// Fixed-width run, used for class and entity member rows.
    pub monospace: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            bold: false,
            monospace: false,
        }
    }
}

impl TextStyle {
    pub fn proportional(font_size: f64) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }

    pub fn monospace(font_size: f64) -> Self {
        Self {
            font_size,
            monospace: true,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

const MONOSPACE_ADVANCE_EM: f64 = 0.6;
const BOLD_FACTOR: f64 = 1.06;

#[derive(Debug, Clone)]
pub struct HeuristicTextMeasurer {
    pub line_height_factor: f64,
}

impl Default for HeuristicTextMeasurer {
    fn default() -> Self {
        Self {
            line_height_factor: 1.2,
        }
    }
}

impl HeuristicTextMeasurer {
    /// Splits on newlines and `<br>` variants. Always yields at least one line.
    pub fn lines(text: &str) -> Vec<String> {
        let t = text
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
            .replace("<br>", "\n");
        t.split('\n').map(str::to_string).collect()
    }

    pub fn line_width(line: &str, style: &TextStyle) -> f64 {
        let em: f64 = line
            .chars()
            .map(|c| char_advance_em(c, style.monospace))
            .sum();
        let bold = if style.bold { BOLD_FACTOR } else { 1.0 };
        em * style.font_size * bold
    }
}

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let lines = Self::lines(text);
        let width = lines
            .iter()
            .map(|l| Self::line_width(l, style))
            .fold(0.0_f64, f64::max);
        let font_size = style.font_size.max(1.0);
        TextMetrics {
            width,
            height: lines.len() as f64 * font_size * self.line_height_factor,
            line_count: lines.len(),
        }
    }
}

/// Advance width of `c` in em.
pub fn char_advance_em(c: char, monospace: bool) -> f64 {
    if c == '\t' {
        return if monospace { 2.0 * MONOSPACE_ADVANCE_EM } else { 0.66 };
    }
    let cells = c.width().unwrap_or(0);
    if monospace {
        return MONOSPACE_ADVANCE_EM * cells as f64;
    }
    if cells == 0 {
        return 0.0;
    }
    if cells >= 2 {
        return 1.0;
    }
    match c {
        ' ' | '_' | '-' => 0.33,
        '.' | ',' | ':' | ';' => 0.28,
        '(' | ')' | '[' | ']' | '{' | '}' | '/' => 0.33,
        '+' | '*' | '=' | '\\' | '^' | '|' | '~' => 0.45,
        '0'..='9' => 0.56,
        'I' => 0.30,
        'W' => 0.85,
        'A'..='Z' => 0.60,
        'i' | 'l' => 0.28,
        'm' | 'w' => 0.78,
        'k' | 'y' => 0.55,
        'a'..='z' => 0.43,
        _ => 0.60,
    }
}
