use anyhow::Result;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
};

use crate::detect::fall::StreamGeometry;

const ALERT_TEXT: &str = "FALL DETECTED!";

/// フォントスケール1.0の基準フレーム高
const BASE_HEIGHT: f64 = 360.0;

/// 転倒警告のオーバーレイ
///
/// テキスト位置とスケールはフレーム高からセッション開始時に一度だけ
/// 導出する。
pub struct AlertOverlay {
    origin: Point,
    font_scale: f64,
    thickness: i32,
}

impl AlertOverlay {
    pub fn new(geometry: &StreamGeometry) -> Self {
        let font_scale = (geometry.height as f64 / BASE_HEIGHT).round();
        Self {
            origin: Point::new(20, (0.15 * geometry.height as f64).round() as i32),
            font_scale,
            thickness: (3.0 * font_scale) as i32,
        }
    }

    /// 警告テキストをフレームに描き込む
    pub fn draw(&self, frame: &mut Mat) -> Result<()> {
        imgproc::put_text(
            frame,
            ALERT_TEXT,
            self.origin,
            imgproc::FONT_HERSHEY_COMPLEX,
            self.font_scale,
            Scalar::new(0.0, 0.0, 255.0, 0.0),
            self.thickness,
            imgproc::LINE_AA,
            false,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(height: u32) -> StreamGeometry {
        StreamGeometry {
            width: 640,
            height,
            frame_rate: 25.0,
        }
    }

    #[test]
    fn test_overlay_geometry_at_base_height() {
        let overlay = AlertOverlay::new(&geometry(360));
        assert_eq!(overlay.font_scale, 1.0);
        assert_eq!(overlay.thickness, 3);
        assert_eq!(overlay.origin.x, 20);
        assert_eq!(overlay.origin.y, 54);
    }

    #[test]
    fn test_overlay_scales_with_frame_height() {
        let overlay = AlertOverlay::new(&geometry(720));
        assert_eq!(overlay.font_scale, 2.0);
        assert_eq!(overlay.thickness, 6);
        assert_eq!(overlay.origin.y, 108);
    }
}
