//! Request and result types exchanged with the caller.
//!
//! The caller (web form, CLI) does the defaulting and type coercion and hands a finished
//! [`QrRequest`] to [`make_qr`](crate::pipeline::make_qr).

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;

use crate::color::StylePreset;
use crate::error::{StudioError, StudioResult};
use crate::render::OutputFormat;

/// How auxiliary content is placed relative to the symbol.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PersonalizationMode {
    #[default]
    None,
    Minimal,
    Focal,
    EasterEgg,
}

/// Kind of auxiliary content.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ContentType {
    #[default]
    Text,
    Logo,
    Image,
}

/// Auxiliary content supplied with a request.
#[derive(Clone, Debug, Default)]
pub enum Content {
    #[default]
    Absent,
    Text(String),
    Image(DynamicImage),
}

impl Content {
    /// Decodes an uploaded image.
    pub fn from_image_bytes(bytes: &[u8]) -> StudioResult<Self> {
        Ok(Content::Image(image::load_from_memory(bytes)?))
    }
}

/// One render request.
#[derive(Clone, Debug)]
pub struct QrRequest {
    pub data: String,
    pub module_size: u32,
    pub border_modules: u32,
    pub fg_color: String,
    pub bg_color: String,
    pub transparent_background: bool,
    pub output_format: OutputFormat,
    pub style_preset: StylePreset,
    pub add_frame: bool,
    pub personalization_mode: PersonalizationMode,
    pub content_type: ContentType,
    pub content: Content,
}

impl QrRequest {
    /// A plain black-on-white raster request for `data` with 10px modules and a 4-module border.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            module_size: 10,
            border_modules: 4,
            fg_color: crate::color::DEFAULT_FG.to_string(),
            bg_color: crate::color::DEFAULT_BG.to_string(),
            transparent_background: false,
            output_format: OutputFormat::Raster,
            style_preset: StylePreset::Custom,
            add_frame: false,
            personalization_mode: PersonalizationMode::None,
            content_type: ContentType::Text,
            content: Content::Absent,
        }
    }
}

/// Finished output, ready to be saved or embedded by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct QrResult {
    pub encoded_bytes: Vec<u8>,
    pub suggested_filename: &'static str,
    pub mime_type: &'static str,
}

impl fmt::Debug for QrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrResult")
            .field("encoded_bytes", &format_args!("[{} bytes]", self.encoded_bytes.len()))
            .field("suggested_filename", &self.suggested_filename)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

fn unknown(kind: &str, value: &str) -> StudioError {
    StudioError::unsupported(format!("unknown {kind} '{value}'"))
}

impl FromStr for OutputFormat {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raster" | "png" => Ok(OutputFormat::Raster),
            "vector" | "svg" => Ok(OutputFormat::Vector),
            other => Err(unknown("output format", other)),
        }
    }
}

impl FromStr for PersonalizationMode {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(PersonalizationMode::None),
            "minimal" => Ok(PersonalizationMode::Minimal),
            "focal" => Ok(PersonalizationMode::Focal),
            "easter_egg" => Ok(PersonalizationMode::EasterEgg),
            other => Err(unknown("personalization mode", other)),
        }
    }
}

impl FromStr for ContentType {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ContentType::Text),
            "logo" => Ok(ContentType::Logo),
            "image" => Ok(ContentType::Image),
            other => Err(unknown("content type", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = QrRequest::new("https://example.com");
        assert_eq!(req.module_size, 10);
        assert_eq!(req.border_modules, 4);
        assert_eq!(req.fg_color, "#000000");
        assert_eq!(req.bg_color, "#ffffff");
        assert_eq!(req.output_format, OutputFormat::Raster);
        assert_eq!(req.personalization_mode, PersonalizationMode::None);
        assert!(matches!(req.content, Content::Absent));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("svg".parse::<OutputFormat>().unwrap(), OutputFormat::Vector);
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Raster);
        assert_eq!(
            "easter_egg".parse::<PersonalizationMode>().unwrap(),
            PersonalizationMode::EasterEgg
        );
        assert_eq!("logo".parse::<ContentType>().unwrap(), ContentType::Logo);
        assert!("gif".parse::<OutputFormat>().is_err());
        assert!("loud".parse::<PersonalizationMode>().is_err());
        assert_eq!("gold".parse::<StylePreset>().unwrap(), StylePreset::Gold);
        assert_eq!("unknown".parse::<StylePreset>().unwrap(), StylePreset::Custom);
    }

    #[test]
    fn test_unreadable_image_bytes() {
        let err = Content::from_image_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, StudioError::Image(_)));
    }

    #[test]
    fn test_image_bytes_decode() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        match Content::from_image_bytes(&bytes).unwrap() {
            Content::Image(decoded) => assert_eq!((decoded.width(), decoded.height()), (3, 2)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
