//! Font resolution and text drawing.
//!
//! Fonts are looked up through an ordered [`FontChain`]: named system fonts, then the font bundled
//! with the crate, then a built-in 5x7 bitmap face. The first source that loads wins, and the bitmap
//! face is always available, so text rendering never fails for lack of a font.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use crate::effects::blend_pixel;

/// Environment variable overriding the bundled font location.
pub const BUNDLED_FONT_ENV: &str = "QIRUST_STUDIO_FONT";

/// A font that can measure and draw text.
#[derive(Clone)]
pub enum Typeface {
    Outline(Font<'static>),
    Bitmap,
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typeface::Outline(_) => f.write_str("Typeface::Outline"),
            Typeface::Bitmap => f.write_str("Typeface::Bitmap"),
        }
    }
}

impl Typeface {
    pub fn is_bitmap(&self) -> bool {
        matches!(self, Typeface::Bitmap)
    }

    /// Width and height, in pixels, of `text` set at `px` pixels.
    pub fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        match self {
            Typeface::Outline(font) => {
                let scale = Scale::uniform(px);
                let v_metrics = font.v_metrics(scale);
                let width = font
                    .layout(text, scale, point(0.0, v_metrics.ascent))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0);
                (width.ceil().max(0.0) as u32, (v_metrics.ascent - v_metrics.descent).ceil() as u32)
            }
            Typeface::Bitmap => {
                let cell = bitmap_cell(px);
                let count = text.chars().count() as u32;
                let width = (count * BITMAP_ADVANCE).saturating_sub(1) * cell;
                (width, BITMAP_ROWS * cell)
            }
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`, blending over what is already there.
    pub fn draw(&self, img: &mut RgbaImage, text: &str, px: f32, x: i64, y: i64, color: Rgba<u8>) {
        match self {
            Typeface::Outline(font) => {
                let scale = Scale::uniform(px);
                let v_metrics = font.v_metrics(scale);
                let origin = point(x as f32, y as f32 + v_metrics.ascent);
                for glyph in font.layout(text, scale, origin) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        let alpha = (f32::from(color.0[3]) * coverage).round() as u8;
                        if alpha == 0 {
                            return;
                        }
                        let [r, g, b, _] = color.0;
                        blend_pixel(
                            img,
                            i64::from(bb.min.x) + i64::from(gx),
                            i64::from(bb.min.y) + i64::from(gy),
                            Rgba([r, g, b, alpha]),
                        );
                    });
                }
            }
            Typeface::Bitmap => {
                let cell = i64::from(bitmap_cell(px));
                for (i, ch) in text.chars().enumerate() {
                    let rows = bitmap_glyph(ch);
                    let left = x + i as i64 * i64::from(BITMAP_ADVANCE) * cell;
                    for (row, bits) in rows.iter().enumerate() {
                        for col in 0..5i64 {
                            if bits & (0x10 >> col) == 0 {
                                continue;
                            }
                            for dy in 0..cell {
                                for dx in 0..cell {
                                    blend_pixel(img, left + col * cell + dx, y + row as i64 * cell + dy, color);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Draws `text` thickened by overstriking it a few pixels to the right and down.
    pub fn draw_bold(&self, img: &mut RgbaImage, text: &str, px: f32, x: i64, y: i64, color: Rgba<u8>) {
        if self.is_bitmap() {
            self.draw(img, text, px, x, y, color);
            return;
        }
        let weight = ((px / 24.0).round() as i64).max(1);
        for offset in 0..=weight {
            self.draw(img, text, px, x + offset, y, color);
        }
    }
}

/// Somewhere a font may be loaded from.
pub trait FontSource: fmt::Debug + Send + Sync {
    /// Tries to load the font; `None` when it is not available here.
    fn load(&self) -> Option<Typeface>;
}

fn load_font_file(path: &Path) -> Option<Typeface> {
    let bytes = std::fs::read(path).ok()?;
    Font::try_from_vec(bytes).map(Typeface::Outline)
}

/// A named font installed on the host, looked up at its usual install paths.
#[derive(Clone, Debug)]
pub struct SystemFont {
    pub name: String,
    pub paths: Vec<PathBuf>,
}

impl SystemFont {
    pub fn new(name: impl Into<String>, paths: &[&str]) -> Self {
        Self {
            name: name.into(),
            paths: paths.iter().map(PathBuf::from).collect(),
        }
    }
}

impl FontSource for SystemFont {
    fn load(&self) -> Option<Typeface> {
        let found = self.paths.iter().find_map(|path| load_font_file(path));
        if found.is_none() {
            tracing::debug!(font = %self.name, "system font not found");
        }
        found
    }
}

/// A font file shipped next to the crate (or wherever [`BUNDLED_FONT_ENV`] points).
#[derive(Clone, Debug)]
pub struct BundledFont {
    pub path: PathBuf,
}

impl BundledFont {
    pub fn from_env() -> Self {
        let path = std::env::var_os(BUNDLED_FONT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/DejaVuSans-Bold.ttf")));
        Self { path }
    }
}

impl FontSource for BundledFont {
    fn load(&self) -> Option<Typeface> {
        let found = load_font_file(&self.path);
        if found.is_none() {
            tracing::debug!(path = %self.path.display(), "bundled font not available");
        }
        found
    }
}

/// The built-in bitmap face.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinFont;

impl FontSource for BuiltinFont {
    fn load(&self) -> Option<Typeface> {
        Some(Typeface::Bitmap)
    }
}

/// Ordered list of font sources; the first one that loads is used.
#[derive(Debug)]
pub struct FontChain {
    sources: Vec<Box<dyn FontSource>>,
}

impl FontChain {
    pub fn new(sources: Vec<Box<dyn FontSource>>) -> Self {
        Self { sources }
    }

    /// A chain that goes straight to the built-in bitmap face.
    pub fn builtin() -> Self {
        Self::new(vec![Box::new(BuiltinFont)])
    }

    /// Loads the first available font, falling back to the bitmap face.
    pub fn resolve(&self) -> Typeface {
        for source in &self.sources {
            if let Some(typeface) = source.load() {
                if typeface.is_bitmap() {
                    tracing::warn!("no outline font available, using built-in bitmap font");
                }
                return typeface;
            }
        }
        tracing::warn!("font chain exhausted, using built-in bitmap font");
        Typeface::Bitmap
    }
}

impl Default for FontChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SystemFont::new(
                "DejaVu Sans Bold",
                &[
                    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
                    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
                    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
                ],
            )),
            Box::new(SystemFont::new(
                "Liberation Sans Bold",
                &[
                    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
                    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
                ],
            )),
            Box::new(SystemFont::new(
                "Arial Bold",
                &[
                    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
                    "/Library/Fonts/Arial Bold.ttf",
                    "C:\\Windows\\Fonts\\arialbd.ttf",
                ],
            )),
            Box::new(BundledFont::from_env()),
            Box::new(BuiltinFont),
        ])
    }
}

const BITMAP_ROWS: u32 = 7;
const BITMAP_ADVANCE: u32 = 6;

fn bitmap_cell(px: f32) -> u32 {
    ((px / (BITMAP_ROWS + 1) as f32).round() as u32).max(1)
}

// 5x7 glyphs, one byte per row, most significant of the low five bits is the leftmost column.
fn bitmap_glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '@' => [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const INK: Rgba<u8> = Rgba([10, 10, 10, 255]);

    #[derive(Debug)]
    struct Missing;

    impl FontSource for Missing {
        fn load(&self) -> Option<Typeface> {
            None
        }
    }

    #[test]
    fn test_chain_falls_through_to_bitmap() {
        let chain = FontChain::new(vec![
            Box::new(Missing),
            Box::new(SystemFont::new("Nope", &["/definitely/not/here.ttf"])),
            Box::new(BundledFont {
                path: PathBuf::from("/definitely/not/bundled.ttf"),
            }),
        ]);
        assert!(chain.resolve().is_bitmap());
        assert!(FontChain::new(Vec::new()).resolve().is_bitmap());
    }

    #[test]
    fn test_chain_stops_at_first_available() {
        let chain = FontChain::new(vec![Box::new(BuiltinFont), Box::new(Missing)]);
        assert!(chain.resolve().is_bitmap());
    }

    #[test]
    fn test_default_chain_always_resolves() {
        // Whatever the host has installed, resolution terminates with some font.
        let typeface = FontChain::default().resolve();
        let (w, h) = typeface.measure("AB", 32.0);
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn test_bitmap_measure() {
        // 16px text uses 2px cells: 7 rows tall, 6 columns per glyph minus trailing spacing.
        assert_eq!(Typeface::Bitmap.measure("AB", 16.0), (22, 14));
        assert_eq!(Typeface::Bitmap.measure("", 16.0), (0, 14));
        assert_eq!(Typeface::Bitmap.measure("I", 2.0), (5, 7));
    }

    #[test]
    fn test_bitmap_draw_stays_in_box() {
        let mut img = RgbaImage::from_pixel(40, 20, WHITE);
        Typeface::Bitmap.draw(&mut img, "HI", 8.0, 2, 3, INK);
        let (w, h) = Typeface::Bitmap.measure("HI", 8.0);
        let mut inked = 0;
        for (x, y, p) in img.enumerate_pixels() {
            if *p == INK {
                inked += 1;
                assert!((2..2 + w).contains(&x) && (3..3 + h).contains(&y));
            }
        }
        assert!(inked > 0);
        // Top-left of 'H' is set.
        assert_eq!(*img.get_pixel(2, 3), INK);
    }

    #[test]
    fn test_unknown_glyph_is_drawn() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        Typeface::Bitmap.draw(&mut img, "~", 8.0, 0, 0, INK);
        assert!(img.pixels().any(|p| *p == INK));
    }
}
