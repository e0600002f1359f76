//! Session driver: the double-buffered capture/inference loop.
//!
//! Two request slots rotate each iteration: frame N+1 is captured,
//! preprocessed and submitted to the inference worker while frame N's
//! request drains through head aggregation, the fall tracker and the
//! renderer. Head aggregation and the tracker run synchronously on this
//! thread, once per frame, in frame order; only inference overlaps. The
//! slot still in flight at end-of-stream or on an interrupt is dropped
//! without being awaited.

use std::time::Instant;

use anyhow::Result;
use opencv::core::Mat;

use crate::camera::{VideoSink, VideoSource};
use crate::detect::fall::FallTracker;
use crate::detect::head::head_position;
use crate::pose::engine::{AsyncPoseEngine, PendingPose};
use crate::pose::preprocess::preprocess_frame;
use crate::render::overlay::AlertOverlay;
use crate::render::skeleton::draw_skeleton;

/// 1スロット分の処理単位: フレーム本体と飛行中の推論リクエスト
struct InflightFrame {
    frame: Mat,
    request: PendingPose,
}

pub struct Pipeline {
    source: VideoSource,
    engine: AsyncPoseEngine,
    tracker: FallTracker,
    overlay: AlertOverlay,
    sink: VideoSink,
}

impl Pipeline {
    pub fn new(source: VideoSource, engine: AsyncPoseEngine, sink: VideoSink) -> Self {
        let geometry = source.geometry();
        Self {
            source,
            engine,
            tracker: FallTracker::new(&geometry),
            overlay: AlertOverlay::new(&geometry),
            sink,
        }
    }

    /// ストリーム終端または中断までフレームを処理する
    pub fn run(mut self) -> Result<()> {
        let Some(first) = self.source.read_frame()? else {
            anyhow::bail!("Input stream yielded no frames");
        };
        let request = self.engine.submit(preprocess_frame(&first)?)?;
        let mut current = InflightFrame {
            frame: first,
            request,
        };

        let mut frame_index: u64 = 0;
        let mut alert_was_active = false;
        let mut fps_count = 0u32;
        let mut fps_timer = Instant::now();

        loop {
            // 次フレームを投入してからcurrentを回収する。終端なら
            // currentの飛行中リクエストは待たずに破棄する。
            let next_frame = match self.source.read_frame()? {
                Some(frame) => frame,
                None => break,
            };
            let next = InflightFrame {
                request: self.engine.submit(preprocess_frame(&next_frame)?)?,
                frame: next_frame,
            };

            let InflightFrame { mut frame, request } = current;
            let keypoints = match request.wait() {
                Ok(keypoints) => Some(keypoints),
                Err(e) => {
                    // 結果が得られないフレームは検出なしと同じ扱いで先へ進む
                    log::warn!("No inference result for frame {}: {}", frame_index, e);
                    None
                }
            };

            let sample = keypoints.as_ref().and_then(head_position);
            let alert_active = self.tracker.update(sample, frame_index);
            if alert_active && !alert_was_active {
                log::info!("Fall detected at frame {}", frame_index);
            }
            alert_was_active = alert_active;

            if let Some(ref keypoints) = keypoints {
                draw_skeleton(&mut frame, keypoints)?;
            }
            if alert_active {
                self.overlay.draw(&mut frame)?;
            }
            self.sink.emit(&frame)?;

            fps_count += 1;
            let elapsed = fps_timer.elapsed().as_secs_f32();
            if elapsed >= 1.0 {
                log::debug!("FPS: {:.1}", fps_count as f32 / elapsed);
                fps_count = 0;
                fps_timer = Instant::now();
            }

            current = next;
            frame_index += 1;

            if self.sink.poll_quit()? {
                break;
            }
        }

        self.sink.finish()
    }
}
