//! 影格時間標籤
//!
//! 所有函式都不修改輸入影格，而是回傳新的影格，
//! 因此可以在多個 worker 與同一片段的多個影格間同時呼叫。

use super::timestamp_sampler::TimeStamp;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

/// 標籤框距離影格邊緣的距離
pub const LABEL_MARGIN: u32 = 5;
/// 標籤框內距
pub const LABEL_PADDING: u32 = 4;

pub const LABEL_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const LABEL_FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

const GLYPH_SIZE: u32 = 8;

/// 8x8 點陣字型，依 `scale` 放大
///
/// 不持有任何資源，每個 worker 各自建立即可
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    scale: u32,
}

impl Default for BitmapFont {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BitmapFont {
    #[must_use]
    pub const fn new(scale: u32) -> Self {
        Self {
            scale: if scale == 0 { 1 } else { scale },
        }
    }

    #[must_use]
    pub const fn glyph_size(&self) -> u32 {
        GLYPH_SIZE * self.scale
    }

    #[must_use]
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.glyph_size()
    }

    /// 在 `(x, y)` 繪製文字，超出影格的部分直接裁切
    pub fn draw_text(&self, image: &mut RgbaImage, x: u32, y: u32, text: &str, color: Rgba<u8>) {
        for (i, ch) in text.chars().enumerate() {
            let glyph = BASIC_FONTS
                .get(ch)
                .or_else(|| BASIC_FONTS.get('?'))
                .unwrap_or([0; 8]);
            let origin_x = x + i as u32 * self.glyph_size();
            if origin_x >= image.width() {
                break;
            }

            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if (*bits >> col) & 1 == 0 {
                        continue;
                    }
                    let px = origin_x + col * self.scale;
                    let py = y + row as u32 * self.scale;
                    fill_rect(image, px, py, px + self.scale, py + self.scale, color);
                }
            }
        }
    }
}

/// 填滿 `[x0, x1) x [y0, y1)`，自動裁切到影格範圍
pub fn fill_rect(image: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    let x1 = x1.min(image.width());
    let y1 = y1.min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}

/// 在左下角繪製不透明的黑底白字標籤
#[must_use]
pub fn annotate_frame(frame: &RgbaImage, label: &str, font: &BitmapFont) -> RgbaImage {
    let mut annotated = frame.clone();

    let box_width = font.text_width(label) + 2 * LABEL_PADDING;
    let box_height = font.glyph_size() + 2 * LABEL_PADDING;
    let box_x = LABEL_MARGIN;
    let box_y = annotated
        .height()
        .saturating_sub(LABEL_MARGIN + box_height);

    fill_rect(
        &mut annotated,
        box_x,
        box_y,
        box_x + box_width,
        box_y + box_height,
        LABEL_BACKGROUND,
    );
    font.draw_text(
        &mut annotated,
        box_x + LABEL_PADDING,
        box_y + LABEL_PADDING,
        label,
        LABEL_FOREGROUND,
    );

    annotated
}

/// 第 `frame_index` 個影格對應的原始影片時間
#[must_use]
pub fn frame_label(start: TimeStamp, frame_index: usize, fps: u32) -> String {
    let elapsed = frame_index as u64 / u64::from(fps.max(1));
    start.offset_by(elapsed).format()
}

/// 以 `opacity` 疊在黑色背景上的效果（降級片段使用）
#[must_use]
pub fn fade_frame(frame: &RgbaImage, opacity: f32) -> RgbaImage {
    let opacity = opacity.clamp(0.0, 1.0);
    let mut faded = frame.clone();
    for pixel in faded.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (f32::from(*channel) * opacity).round() as u8;
        }
        pixel.0[3] = 255;
    }
    faded
}
