use anyhow::Result;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
};

use crate::pose::keypoint::{KeypointFrame, KeypointIndex};

/// 骨格の接続定義（開始キーポイント, 終了キーポイント）
pub const POSE_PAIRS: [(KeypointIndex, KeypointIndex); 17] = [
    (KeypointIndex::Neck, KeypointIndex::Nose),
    (KeypointIndex::Neck, KeypointIndex::RightShoulder),
    (KeypointIndex::Neck, KeypointIndex::LeftShoulder),
    (KeypointIndex::RightShoulder, KeypointIndex::RightElbow),
    (KeypointIndex::RightElbow, KeypointIndex::RightWrist),
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftElbow),
    (KeypointIndex::LeftElbow, KeypointIndex::LeftWrist),
    (KeypointIndex::Neck, KeypointIndex::RightHip),
    (KeypointIndex::RightHip, KeypointIndex::RightKnee),
    (KeypointIndex::RightKnee, KeypointIndex::RightAnkle),
    (KeypointIndex::Neck, KeypointIndex::LeftHip),
    (KeypointIndex::LeftHip, KeypointIndex::LeftKnee),
    (KeypointIndex::LeftKnee, KeypointIndex::LeftAnkle),
    (KeypointIndex::Nose, KeypointIndex::RightEye),
    (KeypointIndex::Nose, KeypointIndex::LeftEye),
    (KeypointIndex::RightEye, KeypointIndex::RightEar),
    (KeypointIndex::LeftEye, KeypointIndex::LeftEar),
];

/// 各接続線のBGR色
pub const JOINT_COLORS: [(f64, f64, f64); 17] = [
    (0.0, 0.0, 255.0),
    (0.0, 0.0, 128.0),
    (255.0, 255.0, 255.0),
    (0.0, 255.0, 0.0),
    (0.0, 0.0, 255.0),
    (192.0, 192.0, 192.0),
    (128.0, 0.0, 255.0),
    (0.0, 128.0, 128.0),
    (255.0, 255.0, 255.0),
    (128.0, 128.0, 0.0),
    (128.0, 128.0, 128.0),
    (0.0, 255.0, 0.0),
    (0.0, 0.0, 255.0),
    (255.0, 255.0, 0.0),
    (255.0, 0.0, 255.0),
    (0.0, 255.0, 255.0),
    (0.0, 0.0, 128.0),
];

/// 骨格線の太さ（ピクセル）
const LINE_THICKNESS: i32 = 3;

/// 両端が存在する接続線をフレームに描き込む
pub fn draw_skeleton(frame: &mut Mat, keypoints: &KeypointFrame) -> Result<()> {
    for (&(start, end), &(b, g, r)) in POSE_PAIRS.iter().zip(JOINT_COLORS.iter()) {
        let (Some(from), Some(to)) = (keypoints.get(start), keypoints.get(end)) else {
            continue;
        };
        imgproc::line(
            frame,
            Point::new(from.x as i32, from.y as i32),
            Point::new(to.x as i32, to.y as i32),
            Scalar::new(b, g, r, 0.0),
            LINE_THICKNESS,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}
