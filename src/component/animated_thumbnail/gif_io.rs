use super::clip::Clip;
use anyhow::{Context, Result};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, RgbaImage};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// NeuQuant 取樣速度（1 最慢最精確，30 最快）
const ENCODER_SPEED: i32 = 10;

/// 將影格寫成無限循環的 GIF
pub fn write_gif(frames: &[RgbaImage], fps: u32, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("無法建立 GIF: {}", path.display()))?;
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), ENCODER_SPEED);
    encoder.set_repeat(Repeat::Infinite)?;

    let delay = Delay::from_numer_denom_ms(1000, fps.max(1));
    encoder
        .encode_frames(
            frames
                .iter()
                .map(|frame| Frame::from_parts(frame.clone(), 0, 0, delay)),
        )
        .with_context(|| format!("GIF 編碼失敗: {}", path.display()))?;

    Ok(())
}

/// 讀回 GIF 為片段
pub fn read_gif(path: &Path, fps: u32) -> Result<Clip> {
    let file = File::open(path).with_context(|| format!("無法開啟 GIF: {}", path.display()))?;
    let decoder = GifDecoder::new(BufReader::new(file))
        .with_context(|| format!("無法解析 GIF: {}", path.display()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .with_context(|| format!("GIF 影格解碼失敗: {}", path.display()))?;

    Clip::new(frames.into_iter().map(Frame::into_buffer).collect(), fps)
}

/// 重新取樣時每個輸出影格對應的來源影格
///
/// 總長度維持不變：`frame_count / input_fps` 秒
#[must_use]
pub fn resample_indices(frame_count: usize, input_fps: u32, output_fps: u32) -> Vec<usize> {
    if frame_count == 0 || input_fps == 0 || output_fps == 0 {
        return Vec::new();
    }

    let input_fps = input_fps as usize;
    let output_fps = output_fps as usize;
    let output_count = (frame_count * output_fps).div_ceil(input_fps);

    (0..output_count)
        .map(|j| (j * input_fps / output_fps).min(frame_count - 1))
        .collect()
}

/// 以 `output_fps` 輸出片段
pub fn write_clip_resampled(clip: &Clip, output_fps: u32, path: &Path) -> Result<()> {
    let frames: Vec<RgbaImage> = resample_indices(clip.frame_count(), clip.fps(), output_fps)
        .into_iter()
        .map(|i| clip.frame(i).clone())
        .collect();
    write_gif(&frames, output_fps, path)
}
