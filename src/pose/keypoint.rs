/// OpenPose系 18キーポイントインデックス
///
/// human-pose-estimation モデルの出力チャンネル順。チャンネル18は背景で、
/// キーポイントにはならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    Neck = 1,
    RightShoulder = 2,
    RightElbow = 3,
    RightWrist = 4,
    LeftShoulder = 5,
    LeftElbow = 6,
    LeftWrist = 7,
    RightHip = 8,
    RightKnee = 9,
    RightAnkle = 10,
    LeftHip = 11,
    LeftKnee = 12,
    LeftAnkle = 13,
    RightEye = 14,
    LeftEye = 15,
    RightEar = 16,
    LeftEar = 17,
}

impl KeypointIndex {
    pub const COUNT: usize = 18;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::Neck),
            2 => Some(Self::RightShoulder),
            3 => Some(Self::RightElbow),
            4 => Some(Self::RightWrist),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::LeftElbow),
            7 => Some(Self::LeftWrist),
            8 => Some(Self::RightHip),
            9 => Some(Self::RightKnee),
            10 => Some(Self::RightAnkle),
            11 => Some(Self::LeftHip),
            12 => Some(Self::LeftKnee),
            13 => Some(Self::LeftAnkle),
            14 => Some(Self::RightEye),
            15 => Some(Self::LeftEye),
            16 => Some(Self::RightEar),
            17 => Some(Self::LeftEar),
            _ => None,
        }
    }
}

/// 検出信頼度の閾値。これ以下のキーポイントは不在として扱う
pub const DETECTION_THRESHOLD: f32 = 0.5;

/// 頭部領域のキーポイント集合（鼻・首・両肩・両目・両耳）
///
/// 頭部位置の集計と骨格描画の両方から参照される。
pub const HEAD_REGION: [KeypointIndex; 8] = [
    KeypointIndex::Nose,
    KeypointIndex::Neck,
    KeypointIndex::RightShoulder,
    KeypointIndex::LeftShoulder,
    KeypointIndex::RightEye,
    KeypointIndex::LeftEye,
    KeypointIndex::RightEar,
    KeypointIndex::LeftEar,
];

/// 単一キーポイント（フレームのピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

/// 1フレーム分のキーポイント集合
///
/// 各スロットは存在(Some)か不在(None)のどちらか。不在は正常な値であり、
/// ゼロ座標で代用しない。信頼度によるフィルタリングは検出器側で行われる。
#[derive(Debug, Clone, Default)]
pub struct KeypointFrame {
    slots: [Option<Keypoint>; KeypointIndex::COUNT],
}

impl KeypointFrame {
    /// 全スロット不在のフレーム
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, index: KeypointIndex) -> Option<&Keypoint> {
        self.slots[index as usize].as_ref()
    }

    pub fn set(&mut self, index: KeypointIndex, keypoint: Keypoint) {
        self.slots[index as usize] = Some(keypoint);
    }

    /// 存在するキーポイントの数
    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
