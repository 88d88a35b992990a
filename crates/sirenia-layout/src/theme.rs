//! Color contract shared with renderers.
//!
//! A theme names two required colors; every optional color left out is derived from them, so a
//! renderer always receives a complete palette.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThemeError {
    #[error("invalid color `{value}` for `{field}`: expected #rgb or #rrggbb")]
    InvalidColor { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub background: String,
    pub foreground: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
}

/// An sRGB color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `self` moved toward `other` by `t` (0 keeps `self`, 1 yields `other`).
    pub fn mix(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Color::rgb(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }

    fn to_hsl(self) -> Hsl {
        let (r, g, b) = (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        );
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if max == min {
            return Hsl {
                h_deg: 0.0,
                s: 0.0,
                l,
            };
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Hsl {
            h_deg: h * 60.0,
            s,
            l,
        }
    }

    fn from_hsl(hsl: Hsl) -> Color {
        let h = hsl.h_deg.rem_euclid(360.0) / 360.0;
        let s = hsl.s.clamp(0.0, 1.0);
        let l = hsl.l.clamp(0.0, 1.0);
        let channel = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        if s == 0.0 {
            let v = channel(l);
            return Color::rgb(v, v, v);
        }

        fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 1.0 / 2.0 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        }

        let q = if l < 0.5 {
            l * (1.0 + s)
        } else {
            l + s - l * s
        };
        let p = 2.0 * l - q;
        Color::rgb(
            channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            channel(hue_to_rgb(p, q, h)),
            channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Hsl {
    h_deg: f64,
    s: f64,
    l: f64,
}

impl FromStr for Color {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').ok_or(())?;
        if !hex.is_ascii() {
            return Err(());
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| ());
        match hex.len() {
            3 => Ok(Color::rgb(
                byte(&hex[0..1].repeat(2))?,
                byte(&hex[1..2].repeat(2))?,
                byte(&hex[2..3].repeat(2))?,
            )),
            6 => Ok(Color::rgb(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
            )),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every color a renderer may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTheme {
    pub background: Color,
    pub foreground: Color,
    pub line: Color,
    pub accent: Color,
    pub muted: Color,
    pub surface: Color,
    pub border: Color,
}

const LINE_MIX: f64 = 0.75;
const ACCENT_MIX: f64 = 0.75;
const MUTED_MIX: f64 = 0.55;
const SURFACE_MIX: f64 = 0.06;
const BORDER_MIX: f64 = 0.35;
const ACCENT_HUE_SHIFT: f64 = 210.0;

impl Theme {
    pub fn new(background: impl Into<String>, foreground: impl Into<String>) -> Self {
        Self {
            background: background.into(),
            foreground: foreground.into(),
            ..Default::default()
        }
    }

    pub fn resolve(&self) -> Result<ResolvedTheme, ThemeError> {
        let parse = |field: &'static str, value: &str| {
            value.parse::<Color>().map_err(|()| ThemeError::InvalidColor {
                field,
                value: value.to_string(),
            })
        };
        let optional = |field: &'static str, value: &Option<String>, derived: Color| {
            value
                .as_deref()
                .map_or(Ok(derived), |v| parse(field, v))
        };

        let bg = parse("background", &self.background)?;
        let fg = parse("foreground", &self.foreground)?;
        Ok(ResolvedTheme {
            background: bg,
            foreground: fg,
            line: optional("line", &self.line, bg.mix(fg, LINE_MIX))?,
            accent: optional("accent", &self.accent, bg.mix(accent_base(fg), ACCENT_MIX))?,
            muted: optional("muted", &self.muted, bg.mix(fg, MUTED_MIX))?,
            surface: optional("surface", &self.surface, bg.mix(fg, SURFACE_MIX))?,
            border: optional("border", &self.border, bg.mix(fg, BORDER_MIX))?,
        })
    }
}

/// The foreground rotated on the color wheel. Grays get enough saturation to read as a hue.
fn accent_base(fg: Color) -> Color {
    let mut hsl = fg.to_hsl();
    hsl.h_deg += ACCENT_HUE_SHIFT;
    hsl.s = hsl.s.max(0.6);
    hsl.l = hsl.l.clamp(0.35, 0.65);
    Color::from_hsl(hsl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!("#fff".parse::<Color>(), Ok(Color::rgb(255, 255, 255)));
        assert_eq!("#1e90FF".parse::<Color>(), Ok(Color::rgb(0x1e, 0x90, 0xff)));
        assert!("1e90ff".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#ggg".parse::<Color>().is_err());
    }

    #[test]
    fn missing_colors_are_mixed_from_the_required_pair() {
        let resolved = Theme::new("#ffffff", "#000000").resolve().unwrap();
        assert_eq!(resolved.line, Color::rgb(64, 64, 64));
        assert_eq!(resolved.muted, Color::rgb(115, 115, 115));
        assert_eq!(resolved.surface, Color::rgb(240, 240, 240));
        assert_eq!(resolved.border, Color::rgb(166, 166, 166));
    }

    #[test]
    fn explicit_colors_win_over_derivation() {
        let theme = Theme {
            line: Some("#ff0000".to_string()),
            ..Theme::new("#ffffff", "#000000")
        };
        let resolved = theme.resolve().unwrap();
        assert_eq!(resolved.line, Color::rgb(255, 0, 0));
        assert_eq!(resolved.border, Color::rgb(166, 166, 166));
    }

    #[test]
    fn accent_is_a_hue_distinct_from_the_foreground() {
        let resolved = Theme::new("#000000", "#cccccc").resolve().unwrap();
        let a = resolved.accent;
        assert!(a.r != a.g || a.g != a.b, "accent should not be gray: {a}");
        assert_eq!(resolved, Theme::new("#000000", "#cccccc").resolve().unwrap());
    }

    #[test]
    fn invalid_colors_name_their_field() {
        let err = Theme {
            muted: Some("teal".to_string()),
            ..Theme::new("#fff", "#000")
        }
        .resolve()
        .unwrap_err();
        assert_eq!(
            err,
            ThemeError::InvalidColor {
                field: "muted",
                value: "teal".to_string()
            }
        );
    }

    #[test]
    fn resolved_theme_serializes_as_hex() {
        let resolved = Theme::new("#fff", "#000").resolve().unwrap();
        let json = serde_json::to_value(resolved).unwrap();
        assert_eq!(json["background"], "#ffffff");
        assert_eq!(json["line"], "#404040");
    }
}
