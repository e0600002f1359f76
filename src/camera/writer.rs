use std::path::Path;

use anyhow::{Context, Result};
use opencv::{
    core::{Mat, Size},
    highgui,
    prelude::*,
    videoio::{VideoWriter, VideoWriterTrait},
};

use crate::detect::fall::StreamGeometry;

/// ライブ表示の中断キー (ESC)
const QUIT_KEY: i32 = 27;

/// 入力パスから出力ファイル名を導出する ("clip.mp4" -> "clip_output.mp4")
pub fn output_path_for(input: &str) -> String {
    let stem = Path::new(input).with_extension("");
    format!("{}_output.mp4", stem.display())
}

/// 注釈済みフレームの出力先
///
/// 動画ファイル入力時はmp4へ書き出し、カメラ入力時はウィンドウに表示する。
pub enum VideoSink {
    Writer { writer: VideoWriter, path: String },
    Window { title: String },
}

impl VideoSink {
    /// 入力ファイルの隣に出力ファイルを作る
    pub fn file(input_path: &str, geometry: &StreamGeometry) -> Result<Self> {
        let path = output_path_for(input_path);
        let fourcc = VideoWriter::fourcc('a', 'v', 'c', '1')?;
        let writer = VideoWriter::new(
            &path,
            fourcc,
            geometry.frame_rate,
            Size::new(geometry.width as i32, geometry.height as i32),
            true,
        )
        .with_context(|| format!("Failed to open video writer for {}", path))?;
        if !writer.is_opened()? {
            anyhow::bail!("Video writer could not be opened for {}", path);
        }
        Ok(Self::Writer { writer, path })
    }

    /// ライブ表示ウィンドウを作る
    pub fn window(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self::Window {
            title: title.to_string(),
        })
    }

    /// 1フレームを出力する
    pub fn emit(&mut self, frame: &Mat) -> Result<()> {
        match self {
            Self::Writer { writer, .. } => {
                writer.write(frame)?;
            }
            Self::Window { title } => {
                highgui::imshow(title, frame)?;
            }
        }
        Ok(())
    }

    /// 中断要求が来ているか。ウィンドウ表示時のみESCを監視する。
    pub fn poll_quit(&self) -> Result<bool> {
        match self {
            Self::Writer { .. } => Ok(false),
            Self::Window { .. } => Ok(highgui::wait_key(1)? == QUIT_KEY),
        }
    }

    /// 出力を閉じる
    pub fn finish(self) -> Result<()> {
        match self {
            Self::Writer { mut writer, path } => {
                writer.release()?;
                log::info!("Finished. {} saved.", path);
            }
            Self::Window { .. } => {
                highgui::destroy_all_windows()?;
                log::info!("Finished.");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_replaces_extension() {
        assert_eq!(output_path_for("fall.mp4"), "fall_output.mp4");
        assert_eq!(output_path_for("videos/clip.avi"), "videos/clip_output.mp4");
    }

    #[test]
    fn test_output_path_without_extension() {
        assert_eq!(output_path_for("videos/clip"), "videos/clip_output.mp4");
    }
}
