//! Raster post-processing: background transparency, the decorative frame, circular masks and the
//! small drawing primitives the personalization stage builds on.

use image::{imageops, Pixel, Rgba, RgbaImage};

use crate::render::SymbolGeometry;

/// Makes every pixel matching the background transparent.
///
/// The background is sampled from the pixel at `(0, 0)` rather than taken from the requested color,
/// so any drift introduced after rendering is tolerated. Only RGB is compared; alpha of non-matching
/// pixels is left alone.
pub fn make_transparent(img: &mut RgbaImage) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    let sample = img.get_pixel(0, 0).to_rgb();
    for pixel in img.pixels_mut() {
        if pixel.to_rgb() == sample {
            pixel.0[3] = 0;
        }
    }
}

/// Outline shape of the frame.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FrameShape {
    Rounded { radius: f32 },
    Square,
}

/// Geometry of the inset frame outline, in pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FrameSpec {
    pub inset: u32,
    pub stroke: u32,
    pub shape: FrameShape,
}

impl FrameSpec {
    /// Nominal frame for a `width` x `height` image: inset 3.5%, stroke 1.5% (at least 2px) and
    /// corner radius 6% of the smaller side.
    pub fn for_image(width: u32, height: u32) -> Self {
        let min_dim = width.min(height) as f32;
        let radius = min_dim * 0.06;
        Self {
            inset: (min_dim * 0.035).round() as u32,
            stroke: ((min_dim * 0.015).round() as u32).max(2),
            shape: if radius >= 1.0 {
                FrameShape::Rounded { radius }
            } else {
                FrameShape::Square
            },
        }
    }

    /// Pulls the outline toward the edge so it stays inside a quiet zone of `border_px` pixels.
    /// Quiet zones too thin for the stroke are left as they are.
    pub fn within_quiet_zone(mut self, border_px: u32) -> Self {
        if self.stroke <= border_px && self.inset + self.stroke > border_px {
            self.inset = border_px - self.stroke;
        }
        self
    }
}

/// Draws the inset frame outline in `accent`.
pub fn add_frame(img: &mut RgbaImage, accent: Rgba<u8>, geometry: Option<&SymbolGeometry>) {
    let mut spec = FrameSpec::for_image(img.width(), img.height());
    if let Some(geometry) = geometry {
        spec = spec.within_quiet_zone(geometry.border_px());
    }
    draw_frame(img, &spec, accent);
}

pub fn draw_frame(img: &mut RgbaImage, spec: &FrameSpec, accent: Rgba<u8>) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let outer = spec.inset as f32;
    let inner = outer + spec.stroke as f32;
    if w - 2.0 * inner <= 0.0 || h - 2.0 * inner <= 0.0 {
        return;
    }
    let (outer_r, inner_r) = match spec.shape {
        FrameShape::Rounded { radius } => (radius, (radius - spec.stroke as f32).max(0.0)),
        FrameShape::Square => (0.0, 0.0),
    };
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let in_outer = rounded_rect_contains(px, py, outer, outer, w - outer, h - outer, outer_r);
        let in_inner = rounded_rect_contains(px, py, inner, inner, w - inner, h - inner, inner_r);
        if in_outer && !in_inner {
            *pixel = accent;
        }
    }
}

fn rounded_rect_contains(px: f32, py: f32, left: f32, top: f32, right: f32, bottom: f32, r: f32) -> bool {
    if px < left || px >= right || py < top || py >= bottom {
        return false;
    }
    let r = r.min((right - left) / 2.0).min((bottom - top) / 2.0);
    let cx = px.clamp(left + r, right - r);
    let cy = py.clamp(top + r, bottom - r);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= r * r
}

/// Largest centered square of `img`.
pub fn center_square(img: &RgbaImage) -> RgbaImage {
    let side = img.width().min(img.height());
    let left = (img.width() - side) / 2;
    let top = (img.height() - side) / 2;
    imageops::crop_imm(img, left, top, side, side).to_image()
}

/// Center-crops to a square and clears everything outside the inscribed disk.
pub fn to_circular(img: &RgbaImage) -> RgbaImage {
    let mut out = center_square(img);
    let side = out.width();
    let center = side as f32 / 2.0;
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        if dx * dx + dy * dy > center * center {
            pixel.0[3] = 0;
        }
    }
    out
}

/// Multiplies every alpha value by `opacity`.
pub fn scale_alpha(img: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    for pixel in img.pixels_mut() {
        pixel.0[3] = (f32::from(pixel.0[3]) * opacity).round() as u8;
    }
}

/// Straight-alpha "source over" of `src` onto `dst`.
pub fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = u32::from(src.0[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let da = u32::from(dst.0[3]);
    let inv = 255 - sa;
    // Both scaled by 255 to stay in integers.
    let den = sa * 255 + da * inv;
    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src.0[i]) * sa * 255 + u32::from(dst.0[i]) * da * inv;
        out[i] = ((num + den / 2) / den) as u8;
    }
    out[3] = ((den + 127) / 255) as u8;
    Rgba(out)
}

/// Alpha-blends `top` over `base` with its top-left corner at `(x, y)`. Parts of `top` falling
/// outside `base` are dropped.
pub fn overlay(base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    for (tx, ty, pixel) in top.enumerate_pixels() {
        blend_pixel(base, x + i64::from(tx), y + i64::from(ty), *pixel);
    }
}

/// Blends `color` into one pixel, ignoring coordinates outside the image.
pub fn blend_pixel(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    *dst = blend(*dst, color);
}

/// Fills the disk of radius `r` centered on `(cx, cy)`.
pub fn fill_circle(img: &mut RgbaImage, cx: f32, cy: f32, r: f32, color: Rgba<u8>) {
    paint_ring(img, cx, cy, 0.0, r, color);
}

/// Strokes a ring of `width` pixels whose outer edge has radius `r`.
pub fn stroke_circle(img: &mut RgbaImage, cx: f32, cy: f32, r: f32, width: f32, color: Rgba<u8>) {
    paint_ring(img, cx, cy, (r - width).max(0.0), r, color);
}

fn paint_ring(img: &mut RgbaImage, cx: f32, cy: f32, inner: f32, outer: f32, color: Rgba<u8>) {
    let x0 = (cx - outer).floor().max(0.0) as u32;
    let y0 = (cy - outer).floor().max(0.0) as u32;
    let x1 = ((cx + outer).ceil().max(0.0) as u32).min(img.width());
    let y1 = ((cy + outer).ceil().max(0.0) as u32).min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d2 = dx * dx + dy * dy;
            if d2 <= outer * outer && d2 >= inner * inner {
                let dst = img.get_pixel_mut(x, y);
                *dst = blend(*dst, color);
            }
        }
    }
}
