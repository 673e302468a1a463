/// Caption compositor
///
/// Draws caption text onto a copy of the source photo using the 8x8
/// bitmap glyphs from `font8x8`, scaled up to a size proportional to the
/// image width. Every caption gets a black outline first and a white fill
/// on top, so it stays readable on any background.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};

use crate::photo::SourceImage;
use crate::state::caption::{CaptionLayer, CaptionLine};

/// Glyph cell size of the bitmap font, in font pixels
const GLYPH_CELL: u32 = 8;

/// Number of glyph cells that span the full image width
const CELLS_ACROSS: u32 = 16;

const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A flattened photo with its captions burned in
#[derive(Debug, PartialEq)]
pub struct CompositeImage {
    pixels: RgbaImage,
}

impl CompositeImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels.into_raw()
    }
}

/// Bounding box of a rendered caption, outline included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptionRect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && py >= self.y as f32
            && px < self.x as f32 + self.width as f32
            && py < self.y as f32 + self.height as f32
    }
}

/// Integer upscale factor applied to the 8x8 glyphs
pub fn glyph_scale(image_width: u32) -> u32 {
    (image_width / (GLYPH_CELL * CELLS_ACROSS)).max(1)
}

/// Height of one caption line for an image of this width
pub fn line_height(image_width: u32) -> u32 {
    GLYPH_CELL * glyph_scale(image_width)
}

fn outline_width(scale: u32) -> i64 {
    i64::from(scale.div_ceil(2).max(1))
}

/// Composite the layer's captions onto a copy of `source`
///
/// Deterministic: the same inputs always give the same pixels.
pub fn render(source: &SourceImage, layer: &CaptionLayer) -> CompositeImage {
    let mut pixels = source.pixels().clone();

    for line in CaptionLine::ALL {
        if let Some((text, position)) = layer.caption(line) {
            draw_caption(&mut pixels, text, position);
        }
    }

    CompositeImage { pixels }
}

/// Where each caption lands on an image of `image_width` pixels
///
/// Indexed like `CaptionLine::ALL`.
pub fn caption_bounds(layer: &CaptionLayer, image_width: u32) -> [Option<CaptionRect>; 2] {
    CaptionLine::ALL.map(|line| {
        layer
            .caption(line)
            .map(|(text, position)| text_rect(text, position, image_width))
    })
}

fn text_rect(text: &str, (center_x, top): (i32, i32), image_width: u32) -> CaptionRect {
    let scale = i64::from(glyph_scale(image_width));
    let outline = outline_width(scale as u32);
    let text_width = text.chars().count() as i64 * i64::from(GLYPH_CELL) * scale;

    CaptionRect {
        x: saturate_i32(i64::from(center_x) - text_width / 2 - outline),
        y: saturate_i32(i64::from(top) - outline),
        width: saturate_u32(text_width + 2 * outline),
        height: saturate_u32(i64::from(GLYPH_CELL) * scale + 2 * outline),
    }
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn saturate_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Font-pixel coordinates of every lit cell in `text`
fn lit_cells(text: &str) -> Vec<(i64, i64)> {
    let mut cells = Vec::new();
    for (index, ch) in text.chars().enumerate() {
        let origin = index as i64 * i64::from(GLYPH_CELL);
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..i64::from(GLYPH_CELL) {
                if (bits >> col) & 1 == 1 {
                    cells.push((origin + col, row as i64));
                }
            }
        }
    }
    cells
}

fn draw_caption(pixels: &mut RgbaImage, text: &str, (center_x, top): (i32, i32)) {
    // i64 throughout: positions may come from a session file and be anywhere
    let scale = i64::from(glyph_scale(pixels.width()));
    let outline = outline_width(scale as u32);
    let text_width = text.chars().count() as i64 * i64::from(GLYPH_CELL) * scale;
    let left = i64::from(center_x) - text_width / 2;
    let top = i64::from(top);

    let blocks: Vec<(i64, i64)> = lit_cells(text)
        .into_iter()
        .map(|(cx, cy)| (left + cx * scale, top + cy * scale))
        .collect();

    // Outline pass first so neighbouring glyph fills are never covered
    for &(x, y) in &blocks {
        stamp_rounded(pixels, x, y, scale, outline, OUTLINE);
    }
    for &(x, y) in &blocks {
        stamp_rounded(pixels, x, y, scale, 0, FILL);
    }
}

/// Fill a `size` square at (x, y) grown by `radius` with round corners,
/// clipped to the image
fn stamp_rounded(pixels: &mut RgbaImage, x: i64, y: i64, size: i64, radius: i64, color: Rgba<u8>) {
    let (width, height) = (i64::from(pixels.width()), i64::from(pixels.height()));
    let x_range = (x - radius).max(0)..(x + size + radius).min(width);
    let y_range = (y - radius).max(0)..(y + size + radius).min(height);

    for py in y_range {
        let dy = (y - py).max(py - (y + size - 1)).max(0);
        for px in x_range.clone() {
            let dx = (x - px).max(px - (x + size - 1)).max(0);
            if dx * dx + dy * dy <= radius * radius {
                pixels.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}
