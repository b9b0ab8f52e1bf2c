//! Text label bitmaps for building sprites.
//!
//! A label is drawn the way a 2D canvas would draw it: a 300x150 transparent
//! bitmap, 70px sans-serif text in black with its baseline starting at
//! (50, 50). Glyphs are shaped and rasterized by cosmic-text (through the
//! `glyphon` re-exports, `ui` feature). Without that feature the bitmap is
//! left transparent.

use image::RgbaImage;

pub const CANVAS_WIDTH: u32 = 300;
pub const CANVAS_HEIGHT: u32 = 150;
pub const FONT_SIZE: f32 = 70.0;
pub const FONT_FAMILY: &str = "Arial";
/// Pen position of the first glyph's baseline, in canvas pixels.
pub const TEXT_ORIGIN: (f32, f32) = (50.0, 50.0);

/// Text and the bitmap rasterized from it. The label owns its bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub image: RgbaImage,
}

impl Label {
    pub fn rasterize(rasterizer: &mut TextRasterizer, text: &str) -> Self {
        let mut image = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        if text.is_empty() {
            log::warn!("Rasterizing an empty label");
        } else {
            rasterizer.draw(&mut image, text, [0, 0, 0, 255]);
        }
        Self {
            text: text.to_string(),
            image,
        }
    }

    /// Number of pixels with any coverage.
    pub fn ink(&self) -> usize {
        self.image.pixels().filter(|p| p.0[3] > 0).count()
    }
}

/// Shared font database and glyph cache; building it scans the system fonts,
/// so one instance should be reused for every label of a scene.
pub struct TextRasterizer {
    #[cfg(feature = "ui")]
    font_system: glyphon::FontSystem,
    #[cfg(feature = "ui")]
    swash_cache: glyphon::SwashCache,
}

impl TextRasterizer {
    pub fn new() -> Self {
        #[cfg(feature = "ui")]
        {
            Self {
                font_system: glyphon::FontSystem::new(),
                swash_cache: glyphon::SwashCache::new(),
            }
        }
        #[cfg(not(feature = "ui"))]
        {
            log::warn!("Built without the `ui` feature; labels will be blank.");
            Self {}
        }
    }

    pub fn has_fonts(&self) -> bool {
        #[cfg(feature = "ui")]
        {
            self.font_system.db().len() > 0
        }
        #[cfg(not(feature = "ui"))]
        {
            false
        }
    }

    #[cfg(feature = "ui")]
    fn draw(&mut self, image: &mut RgbaImage, text: &str, colour: [u8; 4]) {
        use glyphon::{Attrs, Buffer, Color, Family, Metrics, Shaping};

        let Self {
            font_system,
            swash_cache,
        } = self;
        let mut buffer = Buffer::new(font_system, Metrics::new(FONT_SIZE, FONT_SIZE * 1.2));
        // A canvas never wraps `fillText`, so the layout is unbounded.
        buffer.set_size(font_system, None, None);
        buffer.set_text(
            font_system,
            text,
            &Attrs::new().family(Family::Name(FONT_FAMILY)),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(font_system, false);

        let Some(baseline) = buffer.layout_runs().next().map(|run| run.line_y) else {
            log::warn!("Label `{}` produced no layout", text);
            return;
        };
        let dx = TEXT_ORIGIN.0.round() as i32;
        let dy = (TEXT_ORIGIN.1 - baseline).round() as i32;
        let [r, g, b, a] = colour;
        buffer.draw(
            font_system,
            swash_cache,
            Color::rgba(r, g, b, a),
            |x, y, w, h, color| {
                for py in 0..h as i32 {
                    for px in 0..w as i32 {
                        let rgba = [color.r(), color.g(), color.b(), color.a()];
                        blend(image, x + px + dx, y + py + dy, rgba);
                    }
                }
            },
        );
    }

    #[cfg(not(feature = "ui"))]
    fn draw(&mut self, _: &mut RgbaImage, text: &str, _: [u8; 4]) {
        log::warn!("Label `{}` left blank: text rendering is disabled", text);
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Source-over compositing of a single pixel; out-of-canvas writes are clipped.
#[cfg(any(feature = "ui", test))]
fn blend(image: &mut RgbaImage, x: i32, y: i32, src: [u8; 4]) {
    if x < 0 || y < 0 || x >= image.width() as i32 || y >= image.height() as i32 {
        return;
    }
    let src_a = f32::from(src[3]) / 255.0;
    if src_a <= 0.0 {
        return;
    }
    let dst = image.get_pixel_mut(x as u32, y as u32);
    let dst_a = f32::from(dst.0[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    let channel = |s: u8, d: u8| {
        let c = (f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    *dst = image::Rgba([
        channel(src[0], dst.0[0]),
        channel(src[1], dst.0[1]),
        channel(src[2], dst.0[2]),
        (out_a * 255.0).round() as u8,
    ]);
}
