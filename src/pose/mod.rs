pub mod detector;
pub mod engine;
pub mod keypoint;
pub mod preprocess;

pub use detector::PoseDetector;
pub use engine::{AsyncPoseEngine, PendingPose, REQUEST_SLOTS};
pub use keypoint::{Keypoint, KeypointFrame, KeypointIndex, DETECTION_THRESHOLD, HEAD_REGION};
pub use preprocess::preprocess_frame;
