use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse risk category derived from a span color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Red,
    Green,
    Black,
    Neutral,
}

impl ColorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorCategory::Red => "red",
            ColorCategory::Green => "green",
            ColorCategory::Black => "black",
            ColorCategory::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ColorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Unpack a 0xRRGGBB integer as emitted by span color metadata.
    pub fn from_packed(c: u32) -> Rgb {
        Rgb {
            r: ((c >> 16) & 0xff) as u8,
            g: ((c >> 8) & 0xff) as u8,
            b: (c & 0xff) as u8,
        }
    }

    /// Parse a 6-hex-digit string with optional leading `#`.
    ///
    /// Any other shape means "no color metadata", not an error.
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let h = s.trim().trim_start_matches('#');
        if h.len() != 6 || !h.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&h[0..2], 16).ok()?;
        let g = u8::from_str_radix(&h[2..4], 16).ok()?;
        let b = u8::from_str_radix(&h[4..6], 16).ok()?;
        Some(Rgb { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Map this color to a coarse category.
    ///
    /// Red requires red dominance but a low green component, so amber and
    /// orange hues fall through to neutral. Dark greys count as black.
    pub fn category(self) -> ColorCategory {
        let (r, g, b) = (self.r as i32, self.g as i32, self.b as i32);
        if r > g + 40 && r > b + 40 && r > 100 && g < 120 {
            ColorCategory::Red
        } else if g > r + 40 && g > b + 40 && g > 100 {
            ColorCategory::Green
        } else if r < 80 && g < 80 && b < 80 {
            ColorCategory::Black
        } else {
            ColorCategory::Neutral
        }
    }
}
