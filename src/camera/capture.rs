use anyhow::{Context, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs, VideoCaptureTrait},
};

use crate::detect::fall::StreamGeometry;

/// カメラがFPSを報告しない場合のフォールバック
const FALLBACK_FRAME_RATE: f64 = 30.0;

/// OpenCVによる映像入力（動画ファイルまたはWebカメラ）
pub struct VideoSource {
    capture: VideoCapture,
    geometry: StreamGeometry,
}

impl VideoSource {
    /// 動画ファイルを開く
    pub fn open_file(path: &str) -> Result<Self> {
        let capture = VideoCapture::from_file(path, VideoCaptureAPIs::CAP_ANY as i32)
            .with_context(|| format!("Failed to open video file {}", path))?;
        Self::wrap(capture, path)
    }

    /// カメラを開く
    pub fn open_camera(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32)
            .context("Failed to open camera")?;
        Self::wrap(capture, "camera")
    }

    fn wrap(capture: VideoCapture, name: &str) -> Result<Self> {
        if !capture.is_opened()? {
            anyhow::bail!("{} is not available", name);
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let mut frame_rate = capture.get(videoio::CAP_PROP_FPS)?;
        if frame_rate <= 0.0 {
            // 一部のカメラはCAP_PROP_FPSに0を返す
            log::warn!(
                "Stream reports no frame rate, assuming {} fps",
                FALLBACK_FRAME_RATE
            );
            frame_rate = FALLBACK_FRAME_RATE;
        }

        Ok(Self {
            capture,
            geometry: StreamGeometry {
                width,
                height,
                frame_rate,
            },
        })
    }

    /// ストリームのジオメトリ（最初のフレームを読む前に確定している）
    pub fn geometry(&self) -> StreamGeometry {
        self.geometry
    }

    /// 次のフレームを読む（BGR形式）。ストリーム終端ではNone。
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}
