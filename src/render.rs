//! Raster and SVG rendering of a module grid.

use image::{Rgba, RgbaImage};

use crate::color::ColorPair;
use crate::error::{StudioError, StudioResult};
use crate::matrix::ModuleGrid;

/// Largest raster buffer the renderer will allocate, in bytes (RGBA8).
pub const MAX_RASTER_BYTES: u64 = 512 * 1024 * 1024;

/// Output encoding requested by the caller.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Raster,
    Vector,
}

/// Placement of the symbol inside a rendered raster.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SymbolGeometry {
    /// Symbol width in modules, quiet zone excluded.
    pub dimension: u32,
    /// Pixels per module.
    pub module_size: u32,
    /// Quiet zone width in modules.
    pub border_modules: u32,
}

impl SymbolGeometry {
    /// Fails when the full image side does not fit in a `u32`.
    pub fn new(grid: &ModuleGrid, module_size: u32, border_modules: u32) -> StudioResult<Self> {
        let geometry = Self {
            dimension: u32::try_from(grid.dimension()).map_err(|_| too_large())?,
            module_size,
            border_modules,
        };
        side_px(geometry.dimension, geometry.border_modules, geometry.module_size)?;
        Ok(geometry)
    }

    /// Side of the full image in pixels, quiet zone included.
    pub fn image_side(&self) -> u32 {
        side_px(self.dimension, self.border_modules, self.module_size).unwrap_or(u32::MAX)
    }

    /// Quiet zone width in pixels.
    pub fn border_px(&self) -> u32 {
        self.border_modules.saturating_mul(self.module_size)
    }

    /// Side of the symbol area in pixels.
    pub fn symbol_px(&self) -> u32 {
        self.dimension.saturating_mul(self.module_size)
    }
}

fn too_large() -> StudioError {
    StudioError::render("image too large")
}

/// `(dimension + 2 * border) * module_size`, or an error on overflow.
fn side_px(dimension: u32, border_modules: u32, module_size: u32) -> StudioResult<u32> {
    border_modules
        .checked_mul(2)
        .and_then(|quiet| quiet.checked_add(dimension))
        .and_then(|modules| modules.checked_mul(module_size))
        .ok_or_else(too_large)
}

/// Result of the render stage.
#[derive(Clone, Debug)]
pub enum Rendered {
    Raster(RgbaImage, SymbolGeometry),
    Vector(String),
}

/// Renders `grid` in the requested format.
///
/// `transparent` only affects the vector path; raster transparency is a separate stage.
///
/// # Errors
///
/// Fails with [`StudioError::Render`] when the output size overflows, or when a raster would need
/// more than [`MAX_RASTER_BYTES`].
pub fn render(
    grid: &ModuleGrid,
    module_size: u32,
    border_modules: u32,
    colors: &ColorPair,
    format: OutputFormat,
    transparent: bool,
) -> StudioResult<Rendered> {
    match format {
        OutputFormat::Raster => {
            let geometry = SymbolGeometry::new(grid, module_size, border_modules)?;
            let side = u64::from(geometry.image_side());
            if side * side > MAX_RASTER_BYTES / 4 {
                return Err(too_large());
            }
            Ok(Rendered::Raster(to_raster(grid, &geometry, colors), geometry))
        }
        OutputFormat::Vector => {
            let svg = to_svg_string(grid, module_size, border_modules, colors, transparent)?;
            Ok(Rendered::Vector(svg))
        }
    }
}

/// Paints every module as a `module_size` square of `fg` or `bg`.
pub fn to_raster(grid: &ModuleGrid, geometry: &SymbolGeometry, colors: &ColorPair) -> RgbaImage {
    let size = geometry.image_side();
    let module = i64::from(geometry.module_size.max(1));
    let border = i64::from(geometry.border_modules);
    let fg: Rgba<u8> = colors.fg.rgba();
    let bg: Rgba<u8> = colors.bg.rgba();
    let mut img = RgbaImage::new(size, size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let qr_x = i64::from(x) / module - border;
        let qr_y = i64::from(y) / module - border;
        *pixel = if grid.is_dark(qr_x, qr_y) { fg } else { bg };
    }
    img
}

// Returns a string of SVG code for an image depicting the grid, with the given number of
// border modules. The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(
    grid: &ModuleGrid,
    module_size: u32,
    border_modules: u32,
    colors: &ColorPair,
    transparent: bool,
) -> StudioResult<String> {
    let symbol = u32::try_from(grid.dimension()).map_err(|_| too_large())?;
    let pixels = side_px(symbol, border_modules, module_size)?;
    let dimension = symbol + 2 * border_modules;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" ";
    result += "\"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{pixels}\" height=\"{pixels}\" \
         viewBox=\"0 0 {dimension} {dimension}\" stroke=\"none\">\n"
    );
    if !transparent {
        result += &format!("\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n", colors.bg);
    }
    result += "\t<path d=\"";
    let mut first = true;
    let size = grid.dimension() as i64;
    for y in 0..size {
        for x in 0..size {
            if grid.is_dark(x, y) {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + i64::from(border_modules), y + i64::from(border_modules));
            }
        }
    }
    result += &format!("\" fill=\"{}\"/>\n", colors.fg);
    result += "</svg>\n";
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{resolve, StylePreset};
    use crate::matrix::encode;

    fn colors() -> ColorPair {
        resolve("#112233", "#ddeeff", StylePreset::Custom)
    }

    #[test]
    fn test_raster_dimensions() {
        let grid = encode("Hello, world!").unwrap();
        let img = match render(&grid, 10, 4, &colors(), OutputFormat::Raster, false).unwrap() {
            Rendered::Raster(img, _) => img,
            Rendered::Vector(_) => panic!("expected raster"),
        };
        let side = (grid.dimension() as u32 + 8) * 10;
        assert_eq!(img.dimensions(), (side, side));
    }

    #[test]
    fn test_raster_paints_modules_and_quiet_zone() {
        let grid = encode("HELLO").unwrap();
        let geometry = SymbolGeometry::new(&grid, 3, 2).unwrap();
        let img = to_raster(&grid, &geometry, &colors());
        assert_eq!(*img.get_pixel(0, 0), Rgba([0xdd, 0xee, 0xff, 255]));
        // Top-left finder corner starts right after the quiet zone.
        assert_eq!(*img.get_pixel(6, 6), Rgba([0x11, 0x22, 0x33, 255]));
        assert_eq!(*img.get_pixel(8, 8), Rgba([0x11, 0x22, 0x33, 255]));
    }

    #[test]
    fn test_zero_border() {
        let grid = encode("HELLO").unwrap();
        let geometry = SymbolGeometry::new(&grid, 1, 0).unwrap();
        let img = to_raster(&grid, &geometry, &colors());
        assert_eq!(img.width(), grid.dimension() as u32);
        assert_eq!(geometry.border_px(), 0);
    }

    #[test]
    fn test_svg_background_fill() {
        let grid = encode("HELLO WORLD").unwrap();
        let svg = to_svg_string(&grid, 10, 4, &colors(), false).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("fill=\"#ddeeff\""));
        assert!(svg.contains("fill=\"#112233\""));
        let side = (grid.dimension() + 8) * 10;
        assert!(svg.contains(&format!("width=\"{side}\"")));
    }

    #[test]
    fn test_svg_transparent_has_no_background() {
        let grid = encode("HELLO WORLD").unwrap();
        let svg = to_svg_string(&grid, 10, 4, &colors(), true).unwrap();
        assert!(!svg.contains("<rect"));
        assert!(!svg.contains("#ddeeff"));
    }

    #[test]
    fn test_svg_is_deterministic() {
        let grid = encode("HELLO WORLD").unwrap();
        assert_eq!(
            to_svg_string(&grid, 10, 4, &colors(), false).unwrap(),
            to_svg_string(&grid, 10, 4, &colors(), false).unwrap()
        );
    }

    #[test]
    fn test_oversized_output_is_an_error() {
        let grid = encode("https://example.com").unwrap();
        for format in [OutputFormat::Vector, OutputFormat::Raster] {
            let err = render(&grid, 200_000_000, 4, &colors(), format, false).unwrap_err();
            assert!(matches!(err, StudioError::Render(_)), "{format:?}");
        }
        assert!(SymbolGeometry::new(&grid, 10, u32::MAX / 2).is_err());
    }

    #[test]
    fn test_raster_allocation_is_capped() {
        // 37 modules at 700px is a 25900px side, past the buffer cap but far from overflowing.
        let grid = encode("https://example.com").unwrap();
        assert!(SymbolGeometry::new(&grid, 700, 4).is_ok());
        assert!(render(&grid, 700, 4, &colors(), OutputFormat::Raster, false).is_err());
    }

    #[test]
    fn test_svg_size_uses_full_width() {
        let grid = encode("https://example.com").unwrap();
        let svg = to_svg_string(&grid, 100_000_000, 4, &colors(), false).unwrap();
        assert!(svg.contains("width=\"3700000000\""));
    }
}
