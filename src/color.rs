//! Foreground/background color resolution.
//!
//! Raw colors coming from a form or a command line are normalized permissively: a missing `#` is
//! added, and anything that is not a 3- or 6-digit hex color silently falls back to a default.
//! Named style presets then override whatever custom colors were supplied.

use std::fmt;
use std::str::FromStr;

use image::Rgba;

/// Default foreground used when a raw value is malformed.
pub const DEFAULT_FG: &str = "#000000";

/// Default background used when a raw value is malformed.
pub const DEFAULT_BG: &str = "#ffffff";

/// A normalized `#RGB` or `#RRGGBB` color.
///
/// The string form is kept exactly as supplied (case included) so that resolved colors can be
/// compared against the preset table verbatim.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HexColor(String);

impl HexColor {
    /// Validates `raw` and returns it with a leading `#`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let value = if trimmed.starts_with('#') {
            trimmed.to_string()
        } else {
            format!("#{trimmed}")
        };
        let digits = &value[1..];
        let well_formed = matches!(value.len(), 4 | 7) && digits.chars().all(|c| c.is_ascii_hexdigit());
        well_formed.then_some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green and blue channels. Short `#RGB` digits are doubled (`#abc` == `#aabbcc`).
    pub fn rgb(&self) -> [u8; 3] {
        let digits = self.0[1..].as_bytes();
        let nibble = |b: u8| (b as char).to_digit(16).unwrap_or(0) as u8;
        if digits.len() == 3 {
            [0, 1, 2].map(|i| nibble(digits[i]) * 17)
        } else {
            [0, 2, 4].map(|i| nibble(digits[i]) * 16 + nibble(digits[i + 1]))
        }
    }

    /// Fully opaque pixel of this color.
    pub fn rgba(&self) -> Rgba<u8> {
        let [r, g, b] = self.rgb();
        Rgba([r, g, b, 255])
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for HexColor {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Outcome of normalizing one raw color, so callers can tell a fallback from a value used as given.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ColorChoice {
    Given(HexColor),
    FellBack(HexColor),
}

impl ColorChoice {
    pub fn into_color(self) -> HexColor {
        match self {
            ColorChoice::Given(c) | ColorChoice::FellBack(c) => c,
        }
    }

    pub fn fell_back(&self) -> bool {
        matches!(self, ColorChoice::FellBack(_))
    }
}

/// Normalizes `raw`, reporting whether `default` had to be substituted.
///
/// `default` itself is trusted; if it is malformed too, black is used.
pub fn normalize_hex(raw: &str, default: &str) -> ColorChoice {
    match HexColor::parse(raw) {
        Some(color) => ColorChoice::Given(color),
        None => {
            tracing::debug!(raw, default, "malformed color, using default");
            let fallback = HexColor::parse(default).unwrap_or_else(|| HexColor(DEFAULT_FG.to_string()));
            ColorChoice::FellBack(fallback)
        }
    }
}

/// Normalizes `raw` or silently returns `default`.
pub fn hex_or_default(raw: &str, default: &str) -> HexColor {
    normalize_hex(raw, default).into_color()
}

/// Named color themes. A preset replaces any custom colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum StylePreset {
    #[default]
    Custom,
    Gold,
    Silver,
    WeddingIvory,
    Birthday,
    MinimalTech,
    CraftBeer,
}

impl StylePreset {
    pub const ALL: [StylePreset; 7] = [
        StylePreset::Custom,
        StylePreset::Gold,
        StylePreset::Silver,
        StylePreset::WeddingIvory,
        StylePreset::Birthday,
        StylePreset::MinimalTech,
        StylePreset::CraftBeer,
    ];

    /// Maps a preset name to a preset. Unknown names mean [`StylePreset::Custom`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "gold" => StylePreset::Gold,
            "silver" => StylePreset::Silver,
            "wedding_ivory" => StylePreset::WeddingIvory,
            "birthday" => StylePreset::Birthday,
            "minimal_tech" => StylePreset::MinimalTech,
            "craft_beer" => StylePreset::CraftBeer,
            _ => StylePreset::Custom,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StylePreset::Custom => "custom",
            StylePreset::Gold => "gold",
            StylePreset::Silver => "silver",
            StylePreset::WeddingIvory => "wedding_ivory",
            StylePreset::Birthday => "birthday",
            StylePreset::MinimalTech => "minimal_tech",
            StylePreset::CraftBeer => "craft_beer",
        }
    }

    /// Fixed `(fg, bg)` pair for this preset, or `None` for custom colors.
    pub fn colors(self) -> Option<(&'static str, &'static str)> {
        match self {
            StylePreset::Custom => None,
            StylePreset::Gold => Some(("#b38b1b", "#faf5e6")),
            StylePreset::Silver => Some(("#6f7c89", "#f5f5f7")),
            StylePreset::WeddingIvory => Some(("#C6A667", "#FBF7F2")),
            StylePreset::Birthday => Some(("#E63946", "#F8EDFF")),
            StylePreset::MinimalTech => Some(("#000000", "#FFFFFF")),
            StylePreset::CraftBeer => Some(("#8B4513", "#FFF8DC")),
        }
    }
}

impl FromStr for StylePreset {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StylePreset::from_name(s))
    }
}

/// Resolved foreground and background.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ColorPair {
    pub fg: HexColor,
    pub bg: HexColor,
}

/// Normalizes the raw colors and applies the preset override.
pub fn resolve(fg_raw: &str, bg_raw: &str, preset: StylePreset) -> ColorPair {
    if let Some((fg, bg)) = preset.colors() {
        return ColorPair {
            fg: HexColor(fg.to_string()),
            bg: HexColor(bg.to_string()),
        };
    }
    ColorPair {
        fg: hex_or_default(fg_raw, DEFAULT_FG),
        bg: hex_or_default(bg_raw, DEFAULT_BG),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_or_default_fallbacks() {
        assert_eq!(hex_or_default("abcd123", "#000000"), "#000000");
        assert_eq!(hex_or_default("", "#ffffff"), "#ffffff");
        assert_eq!(hex_or_default("#abc", "#000000"), "#abc");
    }

    #[test]
    fn test_missing_hash_is_added() {
        assert_eq!(hex_or_default("ff8800", "#000000"), "#ff8800");
        assert_eq!(hex_or_default("  0a0 ", "#000000"), "#0a0");
    }

    #[test]
    fn test_non_hex_digits_fall_back() {
        assert_eq!(hex_or_default("#zzzzzz", "#ffffff"), "#ffffff");
    }

    #[test]
    fn test_normalize_reports_fallback() {
        assert!(normalize_hex("nope", DEFAULT_FG).fell_back());
        assert!(!normalize_hex("#123456", DEFAULT_FG).fell_back());
    }

    #[test]
    fn test_short_form_expands() {
        assert_eq!(HexColor::parse("#abc").unwrap().rgb(), [0xaa, 0xbb, 0xcc]);
        assert_eq!(HexColor::parse("#C6A667").unwrap().rgb(), [0xc6, 0xa6, 0x67]);
    }

    #[test]
    fn test_presets_override_custom_colors() {
        let table = [
            (StylePreset::Gold, "#b38b1b", "#faf5e6"),
            (StylePreset::Silver, "#6f7c89", "#f5f5f7"),
            (StylePreset::WeddingIvory, "#C6A667", "#FBF7F2"),
            (StylePreset::Birthday, "#E63946", "#F8EDFF"),
            (StylePreset::MinimalTech, "#000000", "#FFFFFF"),
            (StylePreset::CraftBeer, "#8B4513", "#FFF8DC"),
        ];
        for (preset, fg, bg) in table {
            for (fg_raw, bg_raw) in [("#123456", "#654321"), ("garbage", ""), ("#fff", "#000")] {
                let pair = resolve(fg_raw, bg_raw, preset);
                assert_eq!(pair.fg, fg, "{preset:?}");
                assert_eq!(pair.bg, bg, "{preset:?}");
            }
        }
    }

    #[test]
    fn test_custom_and_unknown_presets_pass_through() {
        let pair = resolve("123456", "#abc", StylePreset::from_name("neon"));
        assert_eq!(pair.fg, "#123456");
        assert_eq!(pair.bg, "#abc");
        // "bad" is three hex digits and stays as #bad.
        assert_eq!(resolve("bad", "#fff", StylePreset::Custom).fg, "#bad");
        let fallback = resolve("nothex", "worse", StylePreset::Custom);
        assert_eq!(fallback.fg, DEFAULT_FG);
        assert_eq!(fallback.bg, DEFAULT_BG);
        assert_eq!(resolve("#12", "#12345", StylePreset::Custom), fallback);
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in StylePreset::ALL {
            assert_eq!(StylePreset::from_name(preset.name()), preset);
        }
    }
}
