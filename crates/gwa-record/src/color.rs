use serde::{Deserialize, Serialize};

use crate::{RecordError, Result};

/// Sentinel written for entities without a colour.
pub const NO_COLOR: &str = "NO_RGB";

const NAMED: &[(&str, u32)] = &[
    ("BLACK", 0x000000),
    ("WHITE", 0xFFFFFF),
    ("RED", 0xFF0000),
    ("GREEN", 0x00FF00),
    ("BLUE", 0x0000FF),
    ("YELLOW", 0xFFFF00),
    ("CYAN", 0x00FFFF),
    ("MAGENTA", 0xFF00FF),
    ("GREY", 0x808080),
    ("DARK_RED", 0x800000),
    ("DARK_GREEN", 0x008000),
    ("DARK_BLUE", 0x000080),
    ("ORANGE", 0xFFA500),
    ("PURPLE", 0x800080),
    ("BROWN", 0xA52A2A),
    ("PINK", 0xFFC0CB),
];

/// Packed `0xRRGGBB` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn components(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    /// Decodes `NO_RGB`, `RGB(r,g,b)`, a packed `0xRRGGBB` value or a named
    /// colour token.
    pub fn decode(token: &str) -> Result<Option<Color>> {
        let token = token.trim();
        let upper = token.to_ascii_uppercase();
        if upper.is_empty() || upper == NO_COLOR {
            return Ok(None);
        }

        if let Some(body) = upper
            .strip_prefix("RGB(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = body.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(RecordError::Color(token.to_string()));
            }
            let mut rgb = [0u8; 3];
            for (slot, part) in rgb.iter_mut().zip(&parts) {
                *slot = part
                    .parse::<u8>()
                    .map_err(|_| RecordError::Color(token.to_string()))?;
            }
            return Ok(Some(Color::rgb(rgb[0], rgb[1], rgb[2])));
        }

        if let Some(hex) = upper.strip_prefix("0X") {
            let packed = u32::from_str_radix(hex, 16)
                .map_err(|_| RecordError::Color(token.to_string()))?;
            if packed > 0xFFFFFF {
                return Err(RecordError::Color(token.to_string()));
            }
            return Ok(Some(Color(packed)));
        }

        NAMED
            .iter()
            .find(|(name, _)| *name == upper)
            .map(|(_, packed)| Some(Color(*packed)))
            .ok_or_else(|| RecordError::Color(token.to_string()))
    }

    /// Named colours come back as `RGB(...)`, not as their original token.
    pub fn encode(color: Option<Color>) -> String {
        match color {
            None => NO_COLOR.to_string(),
            Some(color) => {
                let (r, g, b) = color.components();
                format!("RGB({r},{g},{b})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_and_rgb_are_exact_inverses() {
        for token in ["NO_RGB", "RGB(12,0,255)", "RGB(0,0,0)"] {
            let decoded = Color::decode(token).expect("decode");
            assert_eq!(Color::encode(decoded), token);
        }
    }

    #[test]
    fn decodes_named_and_packed_forms() {
        assert_eq!(Color::decode("red").unwrap(), Some(Color(0xFF0000)));
        assert_eq!(Color::decode("0x00ff00").unwrap(), Some(Color(0x00FF00)));
        assert_eq!(Color::encode(Color::decode("BLUE").unwrap()), "RGB(0,0,255)");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Color::decode("RGB(1,2)").is_err());
        assert!(Color::decode("RGB(300,0,0)").is_err());
        assert!(Color::decode("CHARTREUSE").is_err());
        assert!(Color::decode("0x1000000").is_err());
    }
}
