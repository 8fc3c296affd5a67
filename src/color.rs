//! Color values, CSS-style color string parsing and the theme variable
//! table.
//!
//! Supported formats:
//! - hex: `#f00`, `#ff0000`
//! - RGB: `rgb(255, 0, 0)`, `rgba(255, 0, 0, 0.5)`
//! - HSL: `hsl(60, 100%, 50%)`, `hsl(60 100% 50%)`, `hsla(30 60% 90% / 0.8)`
//! - HSV: same grammar as HSL
//! - theme variables: `--accent`, resolved through a [`Theme`] loaded once
//!   from stylesheet text
//!
//! Parsed channels are always normalized to 0..1.

use crate::error::{Error, Result};

/// An RGBA color with 0..1 channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// String-keyed variable table for indirect color lookup.
///
/// Populated once at startup from stylesheet text; passed explicitly into
/// [`parse_color`] instead of living in process-wide state. Keys keep their
/// leading `--`.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    variables: std::collections::HashMap<String, String>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `--name: value;` declarations out of the first `:root { ... }`
    /// block in CSS-like stylesheet text.
    pub fn from_stylesheet(text: &str) -> Self {
        let mut variables = std::collections::HashMap::new();

        if let Some(start) = text.find(":root") {
            let rest = &text[start..];
            if let Some(open) = rest.find('{') {
                let body = &rest[open + 1..];
                let body = match body.find('}') {
                    Some(close) => &body[..close],
                    None => body,
                };

                for declaration in body.split(';') {
                    let Some((name, value)) = declaration.split_once(':') else {
                        continue;
                    };
                    let name = name.trim();
                    if name.starts_with("--") {
                        variables.insert(name.to_string(), value.trim().to_string());
                    }
                }
            }
        }

        log::debug!("loaded {} theme variables", variables.len());
        Self { variables }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let a = s * l.min(1.0 - l);
    let f = |n: f32| {
        let k = (n + h / 30.0) % 12.0;
        l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0)
    };

    [f(0.0), f(8.0), f(4.0)]
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let f = |n: f32| {
        let k = (n + h / 60.0) % 6.0;
        v - v * s * k.min(4.0 - k).min(1.0).max(0.0)
    };

    [f(5.0), f(3.0), f(1.0)]
}

fn unsupported(color: &str) -> Error {
    Error::unsupported_format(format!("unsupported color: {color}"))
}

fn parse_number(part: &str, color: &str) -> Result<f32> {
    part.trim().parse::<f32>().map_err(|_| unsupported(color))
}

fn parse_percentage(part: &str, color: &str) -> Result<f32> {
    let trimmed = part.trim();
    let digits = trimmed.strip_suffix('%').ok_or_else(|| unsupported(color))?;
    Ok(parse_number(digits, color)? / 100.0)
}

fn parse_hex_digit(byte: u8, color: &str) -> Result<f32> {
    match (byte as char).to_digit(16) {
        Some(v) => Ok(v as f32),
        None => Err(unsupported(color)),
    }
}

fn parse_hex_pair(pair: &str, color: &str) -> Result<f32> {
    u8::from_str_radix(pair, 16)
        .map(|v| v as f32 / 255.0)
        .map_err(|_| unsupported(color))
}

/// Splits the inside of `hsl[a](...)` / `hsv[a](...)`, honoring both comma
/// and space separation plus the `/ alpha` form.
fn split_channels(body: &str) -> Vec<&str> {
    let mut channels: Vec<&str> = if body.contains(',') {
        body.split(',').map(str::trim).collect()
    } else {
        body.split_whitespace().collect()
    };

    if let Some(slash) = channels.iter().position(|c| *c == "/") {
        if slash + 1 < channels.len() {
            channels[slash] = channels[slash + 1];
        }
        channels.truncate(slash + 1);
    }

    channels
}

/// Parses a color string into normalized RGBA, resolving `--variable` names
/// through the theme. Unknown formats and unknown variables are fatal.
pub fn parse_color(color: &str, theme: &Theme) -> Result<Color> {
    if let Some(hex) = color.strip_prefix('#') {
        return match hex.len() {
            6 => Ok(Color::rgba(
                parse_hex_pair(&hex[0..2], color)?,
                parse_hex_pair(&hex[2..4], color)?,
                parse_hex_pair(&hex[4..6], color)?,
                1.0,
            )),
            3 => {
                let bytes = hex.as_bytes();
                Ok(Color::rgba(
                    parse_hex_digit(bytes[0], color)? / 15.0,
                    parse_hex_digit(bytes[1], color)? / 15.0,
                    parse_hex_digit(bytes[2], color)? / 15.0,
                    1.0,
                ))
            }
            _ => Err(unsupported(color)),
        };
    }

    if color.starts_with("rgb") {
        let has_alpha = color.as_bytes().get(3) == Some(&b'a');
        let open = if has_alpha { 5 } else { 4 };
        let body = color
            .get(open..color.len().saturating_sub(1))
            .ok_or_else(|| unsupported(color))?;
        let channels: Vec<&str> = body.split(',').collect();

        if channels.len() < if has_alpha { 4 } else { 3 } {
            return Err(unsupported(color));
        }

        return Ok(Color::rgba(
            parse_number(channels[0], color)? / 255.0,
            parse_number(channels[1], color)? / 255.0,
            parse_number(channels[2], color)? / 255.0,
            if has_alpha {
                parse_number(channels[3], color)?
            } else {
                1.0
            },
        ));
    }

    if color.starts_with("hsl") || color.starts_with("hsv") {
        let has_alpha = color.as_bytes().get(3) == Some(&b'a');
        let open = if has_alpha { 5 } else { 4 };
        let body = color
            .get(open..color.len().saturating_sub(1))
            .ok_or_else(|| unsupported(color))?;
        let channels = split_channels(body);

        if channels.len() < 3 {
            return Err(unsupported(color));
        }

        let alpha = if has_alpha {
            let part = channels.get(3).ok_or_else(|| unsupported(color))?;
            parse_number(part, color)?
        } else {
            1.0
        };

        let h = parse_number(channels[0], color)?;
        let s = parse_percentage(channels[1], color)?;
        let third = parse_percentage(channels[2], color)?;

        let converted = if color.starts_with("hsl") {
            hsl_to_rgb(h, s, third)
        } else {
            hsv_to_rgb(h, s, third)
        };

        return Ok(Color::rgba(converted[0], converted[1], converted[2], alpha));
    }

    if let Some(value) = theme.get(color) {
        return parse_color(value.trim(), theme);
    }

    Err(unsupported(color))
}
