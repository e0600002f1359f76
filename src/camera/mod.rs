pub mod capture;
pub mod writer;

pub use capture::VideoSource;
pub use writer::{output_path_for, VideoSink};
