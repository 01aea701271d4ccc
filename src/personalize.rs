//! Compositing of initials, logos and photos onto a rendered symbol.
//!
//! Every strategy is bounded by what level H error correction can absorb:
//!
//! - [`Personalization::Minimal`] draws below the symbol and never touches it.
//! - [`Personalization::Focal`] covers the center, with a radius capped so the covered modules stay
//!   within [`FOCAL_OCCLUSION_BUDGET`] of the symbol area, well under [`EC_TOLERANCE`].
//! - [`Personalization::EasterEgg`] stamps text inside the quiet zone and keeps watermarks at an
//!   opacity whose per-channel shift is bounded by [`EASTER_EGG_IMAGE_OPACITY`].
//!
//! Missing or mismatched content is not an error for the request: the image is returned untouched.
//!
//! [`EC_TOLERANCE`]: crate::matrix::EC_TOLERANCE

use std::f32::consts::PI;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::color::ColorPair;
use crate::effects::{center_square, fill_circle, overlay, scale_alpha, stroke_circle, to_circular};
use crate::error::{StudioError, StudioResult};
use crate::font::FontChain;
use crate::render::SymbolGeometry;
use crate::request::{Content, ContentType, PersonalizationMode};

/// Height of the caption band added below the symbol in minimal mode.
pub const MINIMAL_BAND_PX: u32 = 100;
/// Nominal focal badge radius as a fraction of the smaller image side.
pub const FOCAL_RADIUS_RATIO: f32 = 0.15;
/// Largest share of the symbol's area the focal badge may cover.
pub const FOCAL_OCCLUSION_BUDGET: f32 = 0.20;
/// Alpha of the text stamps in easter-egg mode.
pub const EASTER_EGG_TEXT_ALPHA: u8 = 80;
/// Opacity of the easter-egg watermark.
pub const EASTER_EGG_IMAGE_OPACITY: f32 = 0.15;
/// Watermark size as a fraction of the smaller image side.
pub const EASTER_EGG_IMAGE_RATIO: f32 = 0.40;

const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 100]);

/// A placement strategy and its parameters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Personalization {
    Minimal {
        band_px: u32,
    },
    Focal {
        radius_ratio: f32,
        occlusion_budget: f32,
    },
    EasterEgg {
        text_alpha: u8,
        image_opacity: f32,
        image_ratio: f32,
    },
}

impl Personalization {
    /// Default parameters for `mode`; `None` when no personalization is requested.
    pub fn for_mode(mode: PersonalizationMode) -> Option<Self> {
        match mode {
            PersonalizationMode::None => None,
            PersonalizationMode::Minimal => Some(Personalization::Minimal {
                band_px: MINIMAL_BAND_PX,
            }),
            PersonalizationMode::Focal => Some(Personalization::Focal {
                radius_ratio: FOCAL_RADIUS_RATIO,
                occlusion_budget: FOCAL_OCCLUSION_BUDGET,
            }),
            PersonalizationMode::EasterEgg => Some(Personalization::EasterEgg {
                text_alpha: EASTER_EGG_TEXT_ALPHA,
                image_opacity: EASTER_EGG_IMAGE_OPACITY,
                image_ratio: EASTER_EGG_IMAGE_RATIO,
            }),
        }
    }

    /// How many characters of text content this strategy shows.
    pub fn max_text_chars(&self) -> usize {
        match self {
            Personalization::Minimal { .. } => 24,
            Personalization::Focal { .. } => 3,
            Personalization::EasterEgg { .. } => 8,
        }
    }
}

/// Colors available to the compositor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Palette {
    pub fg: Rgba<u8>,
    pub bg: Rgba<u8>,
    pub transparent_background: bool,
}

impl Palette {
    pub fn new(colors: &ColorPair, transparent_background: bool) -> Self {
        Self {
            fg: colors.fg.rgba(),
            bg: colors.bg.rgba(),
            transparent_background,
        }
    }

    /// Fill for newly added canvas: the background, or nothing at all when it is transparent.
    pub fn backdrop(&self) -> Rgba<u8> {
        if self.transparent_background {
            let [r, g, b, _] = self.bg.0;
            Rgba([r, g, b, 0])
        } else {
            self.bg
        }
    }

    fn fg_with_alpha(&self, alpha: u8) -> Rgba<u8> {
        let [r, g, b, _] = self.fg.0;
        Rgba([r, g, b, alpha])
    }
}

/// Content ready for compositing.
#[derive(Clone, Debug)]
pub enum Overlay {
    /// Upper-cased, truncated text.
    Text(String),
    /// Kept rectangular, aspect ratio preserved.
    Logo(RgbaImage),
    /// Cropped to a circle.
    Photo(RgbaImage),
}

/// Trims, upper-cases and truncates text content to `max_chars` characters.
pub fn normalize_text(text: &str, max_chars: usize) -> String {
    text.trim().to_uppercase().chars().take(max_chars).collect()
}

/// Checks that `content` fits `content_type` and prepares it.
pub fn resolve_overlay(content_type: ContentType, content: &Content, max_chars: usize) -> StudioResult<Overlay> {
    match (content_type, content) {
        (ContentType::Text, Content::Text(text)) => {
            let text = normalize_text(text, max_chars);
            if text.is_empty() {
                return Err(StudioError::unsupported("text content is empty"));
            }
            Ok(Overlay::Text(text))
        }
        (ContentType::Logo | ContentType::Image, Content::Image(img)) => {
            if img.width() == 0 || img.height() == 0 {
                return Err(StudioError::unsupported("image content is empty"));
            }
            let rgba = img.to_rgba8();
            Ok(match content_type {
                ContentType::Logo => Overlay::Logo(rgba),
                _ => Overlay::Photo(rgba),
            })
        }
        (_, Content::Absent) => Err(StudioError::unsupported(format!("no content for {content_type:?}"))),
        (ContentType::Text, Content::Image(_)) => {
            Err(StudioError::unsupported("text personalization needs text content"))
        }
        (_, Content::Text(_)) => Err(StudioError::unsupported(format!(
            "{content_type:?} personalization needs image content"
        ))),
    }
}

/// Composites `content` onto `img` using `strategy`.
///
/// Returns `img` unchanged when the content is missing or does not match `content_type`.
pub fn personalize(
    img: RgbaImage,
    geometry: &SymbolGeometry,
    strategy: &Personalization,
    content_type: ContentType,
    content: &Content,
    palette: &Palette,
    fonts: &FontChain,
) -> RgbaImage {
    let layer = match resolve_overlay(content_type, content, strategy.max_text_chars()) {
        Ok(layer) => layer,
        Err(err) => {
            tracing::debug!(%err, ?strategy, "skipping personalization");
            return img;
        }
    };
    tracing::debug!(?strategy, ?content_type, "personalizing");
    match *strategy {
        Personalization::Minimal { band_px } => minimal(img, band_px, &layer, palette, fonts),
        Personalization::Focal {
            radius_ratio,
            occlusion_budget,
        } => focal(img, geometry, radius_ratio, occlusion_budget, &layer, palette, fonts),
        Personalization::EasterEgg {
            text_alpha,
            image_opacity,
            image_ratio,
        } => easter_egg(img, geometry, text_alpha, image_opacity, image_ratio, &layer, palette, fonts),
    }
}

fn minimal(img: RgbaImage, band_px: u32, layer: &Overlay, palette: &Palette, fonts: &FontChain) -> RgbaImage {
    let (w, h) = img.dimensions();
    let mut canvas = RgbaImage::from_pixel(w, h + band_px, palette.backdrop());
    imageops::replace(&mut canvas, &img, 0, 0);

    let band_top = i64::from(h);
    let band = i64::from(band_px);
    match layer {
        Overlay::Text(text) => {
            let font = fonts.resolve();
            let px = band_px as f32 * 0.4;
            let (tw, th) = font.measure(text, px);
            let x = (i64::from(w) - i64::from(tw)) / 2;
            let y = band_top + (band - i64::from(th)) / 2;
            font.draw(&mut canvas, text, px, x + 2, y + 2, SHADOW);
            font.draw(&mut canvas, text, px, x, y, palette.fg);
        }
        Overlay::Logo(logo) | Overlay::Photo(logo) => {
            let side = ((w as f32 * 0.25).round() as u32).min(band_px.saturating_sub(20)).max(1);
            let badge = match layer {
                Overlay::Photo(_) => circular_badge(logo, side),
                _ => fit_within(logo, side, side),
            };
            let x = (i64::from(w) - i64::from(badge.width())) / 2;
            let y = band_top + (band - i64::from(badge.height())) / 2;
            overlay(&mut canvas, &badge, x, y);
        }
    }
    canvas
}

/// Outer radius of the focal badge: the nominal share of the smaller side, capped so the disk
/// covers at most `occlusion_budget` of the symbol area.
pub fn focal_radius(
    width: u32,
    height: u32,
    geometry: &SymbolGeometry,
    radius_ratio: f32,
    occlusion_budget: f32,
) -> f32 {
    let nominal = width.min(height) as f32 * radius_ratio;
    let symbol = geometry.symbol_px() as f32;
    let cap = (occlusion_budget * symbol * symbol / PI).sqrt();
    nominal.min(cap)
}

/// Number of modules that a disk of `radius` pixels centered at `(cx, cy)` touches at all.
pub fn occluded_modules(geometry: &SymbolGeometry, cx: f32, cy: f32, radius: f32) -> usize {
    let m = geometry.module_size as f32;
    let origin = geometry.border_px() as f32;
    let mut count = 0;
    for my in 0..geometry.dimension {
        for mx in 0..geometry.dimension {
            let left = origin + mx as f32 * m;
            let top = origin + my as f32 * m;
            let nx = cx.clamp(left, left + m);
            let ny = cy.clamp(top, top + m);
            let (dx, dy) = (cx - nx, cy - ny);
            if dx * dx + dy * dy < radius * radius {
                count += 1;
            }
        }
    }
    count
}

fn focal(
    mut img: RgbaImage,
    geometry: &SymbolGeometry,
    radius_ratio: f32,
    occlusion_budget: f32,
    layer: &Overlay,
    palette: &Palette,
    fonts: &FontChain,
) -> RgbaImage {
    let (w, h) = img.dimensions();
    let radius = focal_radius(w, h, geometry, radius_ratio, occlusion_budget);
    if radius < 2.0 {
        return img;
    }
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let outline = (radius * 0.08).round().max(2.0);

    fill_circle(&mut img, cx, cy, radius, palette.bg);
    stroke_circle(&mut img, cx, cy, radius, outline, palette.fg);

    match layer {
        Overlay::Text(text) => {
            let font = fonts.resolve();
            let chars = text.chars().count().max(1) as f32;
            let mut px = radius * (1.3 / chars.sqrt());
            let limit = (radius - outline) * 1.4;
            let (tw, _) = font.measure(text, px);
            if tw as f32 > limit {
                px *= limit / tw as f32;
            }
            let (tw, th) = font.measure(text, px);
            let x = (cx - tw as f32 / 2.0).round() as i64;
            let y = (cy - th as f32 / 2.0).round() as i64;
            font.draw_bold(&mut img, text, px, x, y, palette.fg);
        }
        Overlay::Logo(content) | Overlay::Photo(content) => {
            let side = ((radius - outline - 2.0) * 2.0).floor().max(1.0) as u32;
            let badge = match layer {
                Overlay::Logo(_) => {
                    let fitted = fit_within(content, side, side);
                    let mut square = RgbaImage::new(side, side);
                    imageops::replace(
                        &mut square,
                        &fitted,
                        i64::from((side - fitted.width()) / 2),
                        i64::from((side - fitted.height()) / 2),
                    );
                    to_circular(&square)
                }
                _ => circular_badge(content, side),
            };
            let x = (cx - side as f32 / 2.0).round() as i64;
            let y = (cy - side as f32 / 2.0).round() as i64;
            overlay(&mut img, &badge, x, y);
        }
    }
    img
}

#[allow(clippy::too_many_arguments)]
fn easter_egg(
    mut img: RgbaImage,
    geometry: &SymbolGeometry,
    text_alpha: u8,
    image_opacity: f32,
    image_ratio: f32,
    layer: &Overlay,
    palette: &Palette,
    fonts: &FontChain,
) -> RgbaImage {
    let (w, h) = img.dimensions();
    match layer {
        Overlay::Text(text) => {
            let font = fonts.resolve();
            let border = geometry.border_px() as f32;
            let mut px = (border * 0.5).clamp(8.0, 24.0);
            let (w, h) = (i64::from(w), i64::from(h));
            // Keep the two top stamps apart: each may take at most a third of the width.
            let max_w = (w - (border as i64).max(4)) / 3;
            let (mut tw, mut th) = font.measure(text, px);
            while i64::from(tw) > max_w && px > 4.0 {
                px *= 0.9;
                (tw, th) = font.measure(text, px);
            }
            let (tw, th) = (i64::from(tw), i64::from(th));
            let pad = ((border as i64 - th) / 2).max(2);
            let ink = palette.fg_with_alpha(text_alpha);
            for (x, y) in [(pad, pad), ((w - tw) / 2, pad), (w - pad - tw, h - pad - th)] {
                font.draw(&mut img, text, px, x, y, ink);
            }
        }
        Overlay::Logo(content) | Overlay::Photo(content) => {
            let side = ((w.min(h) as f32 * image_ratio).round() as u32).max(1);
            let mut mark = match layer {
                Overlay::Photo(_) => circular_badge(content, side),
                _ => fit_within(content, side, side),
            };
            scale_alpha(&mut mark, image_opacity);
            let x = (i64::from(w) - i64::from(mark.width())) / 2;
            let y = (i64::from(h) - i64::from(mark.height())) / 2;
            overlay(&mut img, &mark, x, y);
        }
    }
    img
}

/// Resizes `img` to fit inside `max_w` x `max_h`, keeping its aspect ratio.
fn fit_within(img: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let scale = (max_w as f32 / img.width() as f32).min(max_h as f32 / img.height() as f32);
    let nw = ((img.width() as f32 * scale).round() as u32).clamp(1, max_w.max(1));
    let nh = ((img.height() as f32 * scale).round() as u32).clamp(1, max_h.max(1));
    imageops::resize(img, nw, nh, FilterType::Lanczos3)
}

/// Center-crops, scales to `side` x `side` and masks to a disk.
fn circular_badge(img: &RgbaImage, side: u32) -> RgbaImage {
    let square = center_square(img);
    to_circular(&imageops::resize(&square, side, side, FilterType::Lanczos3))
}
