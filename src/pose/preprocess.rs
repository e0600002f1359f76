use anyhow::Result;
use ndarray::Array4;
use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
};

/// モデル入力の横幅 (human-pose-estimation系)
pub const INPUT_WIDTH: i32 = 456;
/// モデル入力の高さ
pub const INPUT_HEIGHT: i32 = 256;

/// BGRフレームをモデル入力テンソルに変換
///
/// - 456x256 にリサイズ
/// - [1, 3, 256, 456] の f32 NCHW テンソルに転置 (0.0-255.0)
///
/// モデルはBGR入力なのでチャンネル順は変換しない。
pub fn preprocess_frame(frame: &Mat) -> Result<Array4<f32>> {
    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(INPUT_WIDTH, INPUT_HEIGHT),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_HEIGHT as usize, INPUT_WIDTH as usize));

    for y in 0..INPUT_HEIGHT {
        for x in 0..INPUT_WIDTH {
            let pixel = resized.at_2d::<opencv::core::Vec3b>(y, x)?;
            for channel in 0..3usize {
                tensor[[0, channel, y as usize, x as usize]] = pixel[channel] as f32;
            }
        }
    }

    Ok(tensor)
}
