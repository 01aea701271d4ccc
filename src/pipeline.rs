//! The request-to-bytes pipeline behind [`make_qr`].

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::color::{self, ColorPair};
use crate::effects::{add_frame, make_transparent};
use crate::error::{StudioError, StudioResult};
use crate::font::FontChain;
use crate::matrix;
use crate::personalize::{personalize, Palette, Personalization};
use crate::render::{render, Rendered};
use crate::request::{QrRequest, QrResult};

pub const PNG_FILENAME: &str = "qr-code.png";
pub const SVG_FILENAME: &str = "qr-code.svg";
pub const PNG_MIME: &str = "image/png";
pub const SVG_MIME: &str = "image/svg+xml";

/// Renders `request` into encoded image bytes, using the default font chain for any text.
///
/// # Errors
///
/// Fails with [`StudioError::EmptyInput`] when `request.data` is empty, and with the stage's error
/// when encoding or rendering fails. No partial output is ever returned.
///
/// # Example
///
/// ```no_run
/// use qirust_studio::{make_qr, QrRequest};
///
/// let result = make_qr(QrRequest::new("https://example.com")).unwrap();
/// std::fs::write(result.suggested_filename, &result.encoded_bytes).unwrap();
/// ```
pub fn make_qr(request: QrRequest) -> StudioResult<QrResult> {
    make_qr_with_fonts(request, &FontChain::default())
}

/// [`make_qr`] with an explicit font chain.
#[tracing::instrument(
    skip_all,
    fields(
        format = ?request.output_format,
        preset = request.style_preset.name(),
        mode = ?request.personalization_mode,
    )
)]
pub fn make_qr_with_fonts(request: QrRequest, fonts: &FontChain) -> StudioResult<QrResult> {
    if request.data.is_empty() {
        return Err(StudioError::EmptyInput);
    }

    let colors: ColorPair = color::resolve(&request.fg_color, &request.bg_color, request.style_preset);
    tracing::debug!(fg = %colors.fg, bg = %colors.bg, "resolved colors");

    let grid = matrix::encode(&request.data)?;
    let module_size = request.module_size.max(1);

    let (mut img, geometry) = match render(
        &grid,
        module_size,
        request.border_modules,
        &colors,
        request.output_format,
        request.transparent_background,
    )? {
        Rendered::Vector(svg) => {
            tracing::debug!(bytes = svg.len(), "rendered vector");
            return Ok(QrResult {
                encoded_bytes: svg.into_bytes(),
                suggested_filename: SVG_FILENAME,
                mime_type: SVG_MIME,
            });
        }
        Rendered::Raster(img, geometry) => (img, geometry),
    };
    tracing::debug!(width = img.width(), height = img.height(), "rendered raster");

    if request.transparent_background {
        make_transparent(&mut img);
    }
    if request.add_frame {
        add_frame(&mut img, colors.fg.rgba(), Some(&geometry));
    }
    if let Some(strategy) = Personalization::for_mode(request.personalization_mode) {
        let palette = Palette::new(&colors, request.transparent_background);
        img = personalize(
            img,
            &geometry,
            &strategy,
            request.content_type,
            &request.content,
            &palette,
            fonts,
        );
    }

    let mut encoded_bytes = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut encoded_bytes), ImageFormat::Png)?;
    tracing::debug!(bytes = encoded_bytes.len(), "encoded png");
    Ok(QrResult {
        encoded_bytes,
        suggested_filename: PNG_FILENAME,
        mime_type: PNG_MIME,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::OutputFormat;
    use crate::request::{Content, ContentType, PersonalizationMode};

    #[test]
    fn test_empty_data_fails() {
        let err = make_qr_with_fonts(QrRequest::new(""), &FontChain::builtin()).unwrap_err();
        assert!(matches!(err, StudioError::EmptyInput));
    }

    #[test]
    fn test_raster_result_metadata() {
        let result = make_qr_with_fonts(QrRequest::new("hello"), &FontChain::builtin()).unwrap();
        assert_eq!(result.suggested_filename, "qr-code.png");
        assert_eq!(result.mime_type, "image/png");
        assert!(result.encoded_bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_vector_ignores_decorations() {
        let mut request = QrRequest::new("hello");
        request.output_format = OutputFormat::Vector;
        request.add_frame = true;
        request.personalization_mode = PersonalizationMode::Focal;
        request.content_type = ContentType::Text;
        request.content = Content::Text("AB".into());
        let result = make_qr_with_fonts(request.clone(), &FontChain::builtin()).unwrap();
        assert_eq!(result.suggested_filename, "qr-code.svg");
        assert_eq!(result.mime_type, "image/svg+xml");

        request.add_frame = false;
        request.personalization_mode = PersonalizationMode::None;
        let plain = make_qr_with_fonts(request, &FontChain::builtin()).unwrap();
        assert_eq!(result, plain);
    }

    #[test]
    fn test_oversized_vector_fails_cleanly() {
        let mut request = QrRequest::new("https://example.com");
        request.output_format = OutputFormat::Vector;
        request.module_size = 200_000_000;
        let err = make_qr_with_fonts(request, &FontChain::builtin()).unwrap_err();
        assert!(matches!(err, StudioError::Render(_)));
        assert_eq!(err.to_string(), "render error: image too large");
    }

    #[test]
    fn test_zero_module_size_is_clamped() {
        let mut request = QrRequest::new("hello");
        request.module_size = 0;
        request.border_modules = 0;
        let result = make_qr_with_fonts(request, &FontChain::builtin()).unwrap();
        let img = image::load_from_memory(&result.encoded_bytes).unwrap();
        assert_eq!(img.width(), 21);
    }
}
