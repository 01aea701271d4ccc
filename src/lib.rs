//! # qirust-studio
//!
//! A Rust library for rendering styled, personalized QR codes that stay scannable.
//!
//! `qirust-studio` encodes text at the highest error correction level (H, ~30% damage tolerance),
//! renders it to PNG or SVG with custom or preset colors, and can decorate the raster with a
//! transparent background, a rounded frame, and initials, a logo or a photo placed so the symbol
//! keeps decoding.
//!
//! ## Features
//!
//! - Automatic minimal version selection at error correction level H.
//! - Permissive color handling: malformed hex colors fall back to black/white.
//! - Style presets (`gold`, `silver`, `wedding_ivory`, `birthday`, `minimal_tech`, `craft_beer`).
//! - Raster (PNG) or vector (SVG) output.
//! - Background transparency and an inset rounded frame.
//! - Three personalization strategies: `minimal` (caption band below the code), `focal` (badge in
//!   the center) and `easter_egg` (faint stamps and watermarks).
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qirust-studio = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Generate a gold QR code with initials in the center:
//!
//! ```rust,no_run
//! use qirust_studio::{make_qr, Content, ContentType, PersonalizationMode, QrRequest, StylePreset};
//!
//! let mut request = QrRequest::new("https://example.com");
//! request.style_preset = StylePreset::Gold;
//! request.add_frame = true;
//! request.personalization_mode = PersonalizationMode::Focal;
//! request.content_type = ContentType::Text;
//! request.content = Content::Text("jd".into());
//!
//! let result = make_qr(request).expect("failed to render QR code");
//! std::fs::write(result.suggested_filename, &result.encoded_bytes).expect("failed to save");
//! ```
//!
//! ## Modules
//!
//! - [`color`]: Color normalization and style presets.
//! - [`matrix`]: QR module grid encoding.
//! - [`render`]: Raster and SVG rendering.
//! - [`effects`]: Transparency, frame and circular mask.
//! - [`personalize`]: Placement of initials, logos and photos.
//! - [`font`]: Font fallback chain and text drawing.
//! - [`request`]: Request and result types.
//! - [`pipeline`]: The request-to-bytes pipeline.
//! - [`error`]: The shared error type.

#![forbid(unsafe_code)]

pub mod color;
pub mod effects;
pub mod error;
pub mod font;
pub mod matrix;
pub mod personalize;
pub mod pipeline;
pub mod render;
pub mod request;

pub use color::{ColorPair, HexColor, StylePreset};
pub use error::{StudioError, StudioResult};
pub use font::FontChain;
pub use pipeline::{make_qr, make_qr_with_fonts};
pub use render::OutputFormat;
pub use request::{Content, ContentType, PersonalizationMode, QrRequest, QrResult};
