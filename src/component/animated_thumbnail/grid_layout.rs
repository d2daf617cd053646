use super::clip::Clip;
use crate::error::{ThumbnailError, ThumbnailResult};
use image::{Rgba, RgbaImage, imageops};
use log::{debug, warn};
use rayon::prelude::*;

pub const GRID_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 網格的像素配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub cols: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub padding: u32,
}

impl GridGeometry {
    #[must_use]
    pub const fn new(cols: u32, rows: u32, cell_width: u32, cell_height: u32, padding: u32) -> Self {
        Self {
            cols,
            rows,
            cell_width,
            cell_height,
            padding,
        }
    }

    /// `cols*w + (cols-1)*padding` x `rows*h + (rows-1)*padding`
    #[must_use]
    pub const fn canvas_size(&self) -> (u32, u32) {
        (
            self.cols * self.cell_width + self.cols.saturating_sub(1) * self.padding,
            self.rows * self.cell_height + self.rows.saturating_sub(1) * self.padding,
        )
    }

    /// 第 `index` 格（列優先）的左上角
    #[must_use]
    pub const fn cell_origin(&self, index: usize) -> (u32, u32) {
        let col = index as u32 % self.cols;
        let row = index as u32 / self.cols;
        (
            col * (self.cell_width + self.padding),
            row * (self.cell_height + self.padding),
        )
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// 以第一個片段的完全透明複本補足到 `target` 個
pub fn pad_clips_to_grid_size(mut clips: Vec<Clip>, target: usize) -> ThumbnailResult<Vec<Clip>> {
    let Some(first) = clips.first() else {
        return Err(ThumbnailError::EmptyComposition);
    };

    if clips.len() > target {
        warn!("片段數 {} 超過網格格數 {}，多餘的片段不使用", clips.len(), target);
        clips.truncate(target);
        return Ok(clips);
    }

    let filler = first.transparent_copy();
    let missing = target - clips.len();
    if missing > 0 {
        debug!("補上 {missing} 個透明片段");
    }
    clips.extend(std::iter::repeat_n(filler, missing));

    Ok(clips)
}

/// 將 `top` 以 `opacity` 疊到 `canvas` 的 `(x, y)`
fn blend_onto(canvas: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32, opacity: f32) {
    if opacity >= 1.0 {
        imageops::overlay(canvas, top, i64::from(x), i64::from(y));
        return;
    }

    let width = top.width().min(canvas.width().saturating_sub(x));
    let height = top.height().min(canvas.height().saturating_sub(y));
    for ty in 0..height {
        for tx in 0..width {
            let src = top.get_pixel(tx, ty);
            let alpha = opacity * f32::from(src.0[3]) / 255.0;
            let dst = canvas.get_pixel_mut(x + tx, y + ty);
            for c in 0..3 {
                let blended = f32::from(src.0[c]) * alpha + f32::from(dst.0[c]) * (1.0 - alpha);
                dst.0[c] = blended.round() as u8;
            }
        }
    }
}

/// 合成網格片段
///
/// 片段數必須剛好等於 `cols * rows`。輸出長度與幀率取自第一個片段，
/// 較短的片段停留在最後一個影格。傳入的片段在回傳前全部釋放。
pub fn compose_grid(clips: Vec<Clip>, cols: u32, rows: u32, padding: u32) -> ThumbnailResult<Clip> {
    let Some(first) = clips.first() else {
        return Err(ThumbnailError::EmptyComposition);
    };

    if cols == 0 || rows == 0 {
        return Err(ThumbnailError::invalid_config(format!(
            "網格欄列數必須大於 0 (cols={cols}, rows={rows})"
        )));
    }

    let (cell_width, cell_height) = first.size();
    let geometry = GridGeometry::new(cols, rows, cell_width, cell_height, padding);
    if clips.len() != geometry.cell_count() {
        return Err(ThumbnailError::invalid_config(format!(
            "片段數 {} 與網格 {}x{} 不符",
            clips.len(),
            cols,
            rows
        )));
    }

    let frame_count = first.frame_count();
    let fps = first.fps();
    let (canvas_width, canvas_height) = geometry.canvas_size();
    debug!(
        "合成 {}x{} 網格: {}x{} px, {} 個影格",
        cols, rows, canvas_width, canvas_height, frame_count
    );

    let frames: Vec<RgbaImage> = (0..frame_count)
        .into_par_iter()
        .map(|frame_index| {
            let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, GRID_BACKGROUND);
            for (i, clip) in clips.iter().enumerate() {
                if clip.is_transparent() {
                    continue;
                }
                let (x, y) = geometry.cell_origin(i);
                blend_onto(&mut canvas, clip.frame(frame_index), x, y, clip.opacity());
            }
            canvas
        })
        .collect();

    for clip in clips {
        clip.close();
    }

    Ok(Clip::new(frames, fps)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_clip(width: u32, height: u32, frames: usize, color: [u8; 4]) -> Clip {
        Clip::new(
            vec![RgbaImage::from_pixel(width, height, Rgba(color)); frames],
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_canvas_size_with_padding() {
        let geometry = GridGeometry::new(3, 2, 100, 60, 4);
        assert_eq!(geometry.canvas_size(), (308, 124));
        assert_eq!(geometry.cell_origin(0), (0, 0));
        assert_eq!(geometry.cell_origin(2), (208, 0));
        assert_eq!(geometry.cell_origin(4), (104, 64));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_cell_count_of_wide_grid() {
        let geometry = GridGeometry::new(70_000, 70_000, 1, 1, 0);
        assert_eq!(geometry.cell_count(), 4_900_000_000);
    }

    #[test]
    fn test_pad_clips_to_grid_size() {
        let clips: Vec<Clip> = (0..4).map(|i| solid_clip(10, 6, 2, [i * 40, 0, 0, 255])).collect();
        let first = clips[0].clone();

        let padded = pad_clips_to_grid_size(clips, 6).unwrap();
        assert_eq!(padded.len(), 6);
        assert!(padded[..4].iter().all(|c| !c.is_transparent()));
        for filler in &padded[4..] {
            assert!(filler.is_transparent());
            assert!(filler.shares_frames_with(&first));
        }
    }

    #[test]
    fn test_pad_empty_is_error() {
        assert!(matches!(
            pad_clips_to_grid_size(Vec::new(), 6),
            Err(ThumbnailError::EmptyComposition)
        ));
    }

    #[test]
    fn test_compose_empty_is_error() {
        assert!(matches!(
            compose_grid(Vec::new(), 3, 1, 0),
            Err(ThumbnailError::EmptyComposition)
        ));
    }

    #[test]
    fn test_compose_count_mismatch_is_config_error() {
        let clips = vec![solid_clip(10, 6, 1, [255; 4]); 2];
        let err = compose_grid(clips, 3, 1, 0).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_compose_places_clips_row_major() {
        let clips = vec![
            solid_clip(10, 6, 3, [255, 0, 0, 255]),
            solid_clip(10, 6, 3, [0, 255, 0, 255]),
            solid_clip(10, 6, 3, [0, 0, 255, 255]),
            solid_clip(10, 6, 3, [255, 255, 0, 255]),
        ];
        let grid = compose_grid(clips, 2, 2, 2).unwrap();

        assert_eq!(grid.size(), (22, 14));
        assert_eq!(grid.frame_count(), 3);
        let frame = grid.frame(0);
        assert_eq!(*frame.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*frame.get_pixel(12, 0), Rgba([0, 255, 0, 255]));
        assert_eq!(*frame.get_pixel(0, 8), Rgba([0, 0, 255, 255]));
        assert_eq!(*frame.get_pixel(21, 13), Rgba([255, 255, 0, 255]));
        // 間距維持背景色
        assert_eq!(*frame.get_pixel(10, 0), GRID_BACKGROUND);
    }

    #[test]
    fn test_compose_holds_last_frame_of_short_clip() {
        let long = solid_clip(4, 4, 5, [255, 255, 255, 255]);
        let short = Clip::new(
            vec![
                RgbaImage::from_pixel(4, 4, Rgba([10, 10, 10, 255])),
                RgbaImage::from_pixel(4, 4, Rgba([90, 90, 90, 255])),
            ],
            10,
        )
        .unwrap();

        let grid = compose_grid(vec![long, short], 2, 1, 0).unwrap();
        assert_eq!(grid.frame_count(), 5);
        assert_eq!(*grid.frame(4).get_pixel(5, 0), Rgba([90, 90, 90, 255]));
    }

    #[test]
    fn test_transparent_padding_leaves_background() {
        let clips = pad_clips_to_grid_size(vec![solid_clip(4, 4, 1, [255; 4])], 2).unwrap();
        let grid = compose_grid(clips, 2, 1, 0).unwrap();
        assert_eq!(*grid.frame(0).get_pixel(5, 1), GRID_BACKGROUND);
    }

    #[test]
    fn test_partial_opacity_blends_over_background() {
        let clip = solid_clip(2, 2, 1, [200, 100, 0, 255]).with_opacity(0.5);
        let grid = compose_grid(vec![clip], 1, 1, 0).unwrap();
        assert_eq!(*grid.frame(0).get_pixel(0, 0), Rgba([100, 50, 0, 255]));
    }
}
