pub mod overlay;
pub mod skeleton;

pub use overlay::AlertOverlay;
pub use skeleton::{draw_skeleton, JOINT_COLORS, POSE_PAIRS};
