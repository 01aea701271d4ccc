//! Error type shared by every stage of the rendering pipeline.

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    /// The request carried no payload to encode.
    #[error("No data provided to encode in QR code.")]
    EmptyInput,

    /// Personalization content is missing or does not match the requested content type.
    #[error("unsupported content: {0}")]
    UnsupportedContent(String),

    /// The data does not fit in a version 40 symbol at level H.
    #[error("encoding error: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("render error: {0}")]
    Render(String),
}

impl StudioError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedContent(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(StudioError::EmptyInput.to_string().contains("No data provided"));
        assert!(StudioError::unsupported("x")
            .to_string()
            .contains("unsupported content:"));
        assert!(StudioError::render("x").to_string().contains("render error:"));
    }

    #[test]
    fn encode_errors_convert() {
        let err: StudioError = qrcode::types::QrError::DataTooLong.into();
        assert!(matches!(err, StudioError::Encode(_)));
        assert!(err.to_string().starts_with("encoding error:"));
    }
}
