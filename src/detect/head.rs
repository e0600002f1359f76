use crate::pose::keypoint::{KeypointFrame, HEAD_REGION};

/// フレームごとの頭部位置の推定値（存在する頭部キーポイントの平均y座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadSample {
    /// ピクセル単位の垂直座標（画面下方向が正）
    pub y: f32,
}

/// 頭部領域キーポイントを1つのスカラーに集約する
///
/// 頭部集合のうち存在するキーポイントのy座標の平均を返す。全て不在の
/// フレームではNone。不在は正常な結果でありエラーではない。
pub fn head_position(frame: &KeypointFrame) -> Option<HeadSample> {
    let mut sum = 0.0f32;
    let mut count = 0usize;

    for index in HEAD_REGION {
        if let Some(keypoint) = frame.get(index) {
            sum += keypoint.y;
            count += 1;
        }
    }

    if count == 0 {
        None
    } else {
        Some(HeadSample {
            y: sum / count as f32,
        })
    }
}
