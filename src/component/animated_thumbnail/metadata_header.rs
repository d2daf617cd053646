//! 網格上方的影片資訊列

use super::annotation::{BitmapFont, fill_rect};
use super::clip::Clip;
use super::grid_layout::GRID_BACKGROUND;
use crate::error::ThumbnailResult;
use crate::tools::CompleteMetadata;
use image::{Rgba, RgbaImage, imageops};
use log::debug;
use rayon::prelude::*;

pub const MIN_HEADER_HEIGHT: u32 = 90;
pub const MAX_HEADER_HEIGHT: u32 = 220;

const HEADER_MARGIN: u32 = 12;
const LINE_SPACING: u32 = 6;
const BORDER_WIDTH: u32 = 2;

const HEADER_BACKGROUND: Rgba<u8> = Rgba([28, 28, 32, 255]);
const HEADER_BORDER: Rgba<u8> = Rgba([96, 96, 104, 255]);
const HEADER_TEXT: Rgba<u8> = Rgba([235, 235, 235, 255]);

/// 資訊列固定使用兩倍大小的點陣字
#[must_use]
pub const fn header_font() -> BitmapFont {
    BitmapFont::new(2)
}

const fn line_height() -> u32 {
    header_font().glyph_size() + LINE_SPACING
}

/// 要顯示的文字行（點陣字只支援 ASCII）
#[must_use]
pub fn header_lines(metadata: &CompleteMetadata) -> Vec<String> {
    let file = &metadata.file;
    let video = &metadata.video;

    let mut lines = vec![
        file.filename.clone(),
        format!(
            "{}  |  {}  |  {}x{} ({})  |  {:.2} fps",
            file.size_human(),
            video.duration_formatted(),
            video.width,
            video.height,
            video.aspect_ratio,
            video.fps
        ),
    ];

    lines.push(match video.bitrate_kbps {
        Some(kbps) => format!("Video: {}, {} kbps", video.codec, kbps),
        None => format!("Video: {}", video.codec),
    });

    lines.push(match &metadata.audio {
        Some(audio) => {
            let mut line = format!(
                "Audio: {}, {} Hz, {}",
                audio.codec, audio.sample_rate_hz, audio.channels
            );
            if let Some(kbps) = audio.bitrate_kbps {
                line.push_str(&format!(", {kbps} kbps"));
            }
            line
        }
        None => "Audio: none".to_string(),
    });

    lines
}

/// 資訊列高度，限制在 `[MIN_HEADER_HEIGHT, MAX_HEADER_HEIGHT]`
#[must_use]
pub fn header_height(line_count: usize) -> u32 {
    let content = 2 * HEADER_MARGIN + line_count as u32 * line_height();
    content.clamp(MIN_HEADER_HEIGHT, MAX_HEADER_HEIGHT)
}

/// 繪製資訊列靜態影像，底部有一條分隔線
#[must_use]
pub fn render_header(lines: &[String], width: u32) -> RgbaImage {
    let width = width.max(1);
    let height = header_height(lines.len());
    let font = header_font();

    let mut header = RgbaImage::from_pixel(width, height, HEADER_BACKGROUND);
    fill_rect(
        &mut header,
        0,
        height - BORDER_WIDTH,
        width,
        height,
        HEADER_BORDER,
    );

    let text_bottom = height - BORDER_WIDTH;
    for (i, line) in lines.iter().enumerate() {
        let y = HEADER_MARGIN + i as u32 * line_height();
        // 超出高度上限的行不繪製
        if y + font.glyph_size() > text_bottom {
            break;
        }
        font.draw_text(&mut header, HEADER_MARGIN, y, line, HEADER_TEXT);
    }

    header
}

/// 資訊列疊在網格上方，每個網格影格都重複同一張資訊列
pub fn stack_header(header: &RgbaImage, grid: Clip) -> ThumbnailResult<Clip> {
    let width = header.width().max(grid.width());
    let height = header.height() + grid.height();
    let offset = i64::from(header.height());

    debug!("加上資訊列: {}x{} px", width, height);

    let frames: Vec<RgbaImage> = grid
        .frames()
        .par_iter()
        .map(|frame| {
            let mut canvas = RgbaImage::from_pixel(width, height, GRID_BACKGROUND);
            imageops::overlay(&mut canvas, header, 0, 0);
            imageops::overlay(&mut canvas, frame, 0, offset);
            canvas
        })
        .collect();

    let fps = grid.fps();
    grid.close();

    Ok(Clip::new(frames, fps)?)
}

pub fn combine_metadata_with_grid(metadata: &CompleteMetadata, grid: Clip) -> ThumbnailResult<Clip> {
    let lines = header_lines(metadata);
    let header = render_header(&lines, grid.width());
    stack_header(&header, grid)
}
