//! QR module grid encoding.
//!
//! Encoding is delegated to the `qrcode` crate (QR Code Model 2, ISO/IEC 18004), always at error
//! correction level H. The smallest version that holds the data is chosen automatically, along with
//! the optimal segment modes and the lowest-penalty mask.

use qrcode::{Color, EcLevel, QrCode, Version};

use crate::error::{StudioError, StudioResult};

/// Fraction of damaged codewords that level H can recover.
pub const EC_TOLERANCE: f32 = 0.30;

/// Square grid of dark and light modules.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModuleGrid {
    dimension: usize,
    version: i16,
    modules: Vec<bool>,
}

impl ModuleGrid {
    /// Builds a grid from row-major module values (`true` = dark).
    pub fn from_modules(dimension: usize, version: i16, modules: Vec<bool>) -> StudioResult<Self> {
        if modules.len() != dimension * dimension {
            return Err(StudioError::render(format!(
                "module count {} does not match a {dimension}x{dimension} grid",
                modules.len()
            )));
        }
        Ok(Self {
            dimension,
            version,
            modules,
        })
    }

    /// Width and height of the symbol in modules, between 21 and 177.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Symbol version, between 1 and 40.
    pub fn version(&self) -> i16 {
        self.version
    }

    /// Returns `true` for a dark module. Coordinates outside the symbol read as light.
    pub fn is_dark(&self, x: i64, y: i64) -> bool {
        let range = 0..self.dimension as i64;
        range.contains(&x) && range.contains(&y) && self.modules[y as usize * self.dimension + x as usize]
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&dark| dark).count()
    }
}

/// Encodes `data` at error correction level H.
pub fn encode(data: &str) -> StudioResult<ModuleGrid> {
    if data.is_empty() {
        return Err(StudioError::EmptyInput);
    }
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;
    let version = match code.version() {
        Version::Normal(v) | Version::Micro(v) => v,
    };
    let modules = code
        .to_colors()
        .into_iter()
        .map(|c| c == Color::Dark)
        .collect();
    let grid = ModuleGrid::from_modules(code.width(), version, modules)?;
    tracing::debug!(version, dimension = grid.dimension(), "encoded module grid");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(encode(""), Err(StudioError::EmptyInput)));
    }

    #[test]
    fn test_minimal_version_at_level_h() {
        // Version 1-H holds 7 bytes, version 2-H holds 14, version 3-H holds 24.
        assert_eq!(encode("1234567").unwrap().version(), 1);
        assert_eq!(encode("hello!!").unwrap().version(), 1);
        assert_eq!(encode("https://example.com").unwrap().version(), 3);
        assert_eq!(encode("https://example.com").unwrap().dimension(), 29);
    }

    #[test]
    fn test_dimension_follows_version() {
        let grid = encode("Hello, world!").unwrap();
        assert_eq!(grid.dimension(), grid.version() as usize * 4 + 17);
    }

    #[test]
    fn test_finder_pattern_corners_are_dark() {
        let grid = encode("HELLO WORLD").unwrap();
        let last = grid.dimension() as i64 - 1;
        assert!(grid.is_dark(0, 0));
        assert!(grid.is_dark(last, 0));
        assert!(grid.is_dark(0, last));
        assert!(!grid.is_dark(-1, 0));
        assert!(!grid.is_dark(0, last + 1));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(encode("same input").unwrap(), encode("same input").unwrap());
    }

    #[test]
    fn test_too_long_data_fails() {
        let data = "x".repeat(1300);
        assert!(matches!(encode(&data), Err(StudioError::Encode(_))));
    }

    #[test]
    fn test_from_modules_checks_length() {
        assert!(ModuleGrid::from_modules(21, 1, vec![false; 20]).is_err());
    }
}
