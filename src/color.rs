//! CSS color values used for particles, connections and the wave fill.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};

/// An sRGB color with straight alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)` or `transparent`.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let invalid = || FieldError::InvalidColor(input.to_string());

        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }

        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex).ok_or_else(invalid);
        }

        let lower = s.to_ascii_lowercase();
        let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid());
        };
        let body = body.strip_suffix(')').ok_or_else(invalid)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();

        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid());
        }

        let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if has_alpha {
            let a = parts[3].parse::<f64>().map_err(|_| invalid())?;
            if !(0.0..=1.0).contains(&a) {
                return Err(invalid());
            }
            a
        } else {
            1.0
        };

        Ok(Self::new(r, g, b, a))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
                Some(Self::opaque(digit(0)?, digit(1)?, digit(2)?))
            }
            6 => {
                let value = u32::from_str_radix(hex, 16).ok()?;
                Some(Self::opaque(
                    ((value >> 16) & 0xff) as u8,
                    ((value >> 8) & 0xff) as u8,
                    (value & 0xff) as u8,
                ))
            }
            _ => None,
        }
    }

    /// Same channels with a replaced alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Same channels with alpha multiplied by `factor`.
    pub fn scale_alpha(self, factor: f64) -> Self {
        self.with_alpha(self.a * factor)
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// CSS representation accepted by canvas fill and stroke styles.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl TryFrom<String> for Rgba {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_css()
    }
}
