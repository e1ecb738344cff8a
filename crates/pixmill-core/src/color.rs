//! Color expression parsing
//!
//! Accepts three forms:
//! - channel lists: `r,g,b` or `r,g,b,a` (each 0-255, alpha defaults to 255)
//! - hex: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` (the `#` is optional)
//! - CSS named colors and `transparent`
//!
//! Matching is case-insensitive and surrounding whitespace is ignored.

use serde::Serialize;

/// An 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("`{0}` is not a recognized color")]
    Unrecognized(String),

    #[error("expected 3 or 4 channels, got {0}")]
    ChannelCount(usize),

    #[error("channel {channel} value `{value}` is not within 0-255")]
    ChannelOutOfRange { channel: &'static str, value: String },
}

/// Parse a color expression into RGBA.
pub fn parse_color(input: &str) -> Result<Rgba, ColorError> {
    let trimmed = input.trim();

    if trimmed.contains(',') {
        return parse_channel_list(trimmed);
    }

    let lower = trimmed.to_ascii_lowercase();
    let bare = lower.strip_prefix('#').unwrap_or(&lower);
    // bare hex digits are read as hex even without the `#`
    let parsed = if !bare.is_empty() && bare.bytes().all(|b| b.is_ascii_hexdigit()) {
        format!("#{}", bare).parse::<csscolorparser::Color>()
    } else {
        lower.parse::<csscolorparser::Color>()
    };

    parsed
        .map(|color| {
            let [r, g, b, a] = color.to_rgba8();
            Rgba::new(r, g, b, a)
        })
        .map_err(|_| ColorError::Unrecognized(input.to_string()))
}

fn parse_channel_list(input: &str) -> Result<Rgba, ColorError> {
    const NAMES: [&str; 4] = ["r", "g", "b", "a"];

    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ColorError::ChannelCount(parts.len()));
    }

    let mut channels = [0u8, 0, 0, 255];
    for (i, part) in parts.iter().enumerate() {
        channels[i] = part
            .parse::<u8>()
            .map_err(|_| ColorError::ChannelOutOfRange {
                channel: NAMES[i],
                value: part.to_string(),
            })?;
    }

    Ok(Rgba::new(channels[0], channels[1], channels[2], channels[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(parse_color("black").unwrap(), Rgba::BLACK);
        assert_eq!(parse_color("Red").unwrap(), Rgba::opaque(255, 0, 0));
        assert_eq!(
            parse_color("  rebeccapurple ").unwrap(),
            Rgba::opaque(0x66, 0x33, 0x99)
        );
        assert_eq!(parse_color("transparent").unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_color("#fff").unwrap(), Rgba::opaque(255, 255, 255));
        assert_eq!(parse_color("f00").unwrap(), Rgba::opaque(255, 0, 0));
        assert_eq!(parse_color("#f008").unwrap(), Rgba::new(255, 0, 0, 0x88));
        assert_eq!(parse_color("#1A2b3C").unwrap(), Rgba::opaque(0x1a, 0x2b, 0x3c));
        assert_eq!(
            parse_color("#11223344").unwrap(),
            Rgba::new(0x11, 0x22, 0x33, 0x44)
        );
    }

    #[test]
    fn test_parse_channel_list() {
        assert_eq!(parse_color("10,20,30").unwrap(), Rgba::opaque(10, 20, 30));
        assert_eq!(
            parse_color("10, 20, 30, 40").unwrap(),
            Rgba::new(10, 20, 30, 40)
        );
    }

    #[test]
    fn test_channel_list_errors() {
        assert_eq!(
            parse_color("10,20").unwrap_err(),
            ColorError::ChannelCount(2)
        );
        assert!(matches!(
            parse_color("10,256,0").unwrap_err(),
            ColorError::ChannelOutOfRange { channel: "g", .. }
        ));
        assert!(matches!(
            parse_color("-1,0,0").unwrap_err(),
            ColorError::ChannelOutOfRange { channel: "r", .. }
        ));
    }

    #[test]
    fn test_unrecognized_colors() {
        assert!(matches!(
            parse_color("notacolor"),
            Err(ColorError::Unrecognized(_))
        ));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#ggg").is_err());
        assert!(parse_color("#").is_err());
        assert!(parse_color("").is_err());
    }
}
