pub mod fall;
pub mod head;

pub use fall::{FallTracker, StreamGeometry};
pub use head::{head_position, HeadSample};
