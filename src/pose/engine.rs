//! Asynchronous pose-inference engine.
//!
//! The ONNX session lives on a dedicated worker thread; the driver keeps
//! up to [`REQUEST_SLOTS`] requests in flight and collects each result in
//! submission order. This overlaps inference latency with the driver's
//! capture, preprocessing and rendering work without sharing any mutable
//! state across threads.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use anyhow::{Context, Result};
use ndarray::Array4;

use super::detector::PoseDetector;
use super::keypoint::KeypointFrame;
use crate::detect::fall::StreamGeometry;

/// 同時に飛行できる推論リクエスト数（ダブルバッファ）
pub const REQUEST_SLOTS: usize = 2;

struct Request {
    input: Array4<f32>,
    result_tx: mpsc::Sender<Result<KeypointFrame>>,
}

/// 投入済みリクエストのハンドル
///
/// waitせずにdropすると結果は破棄される。終了時に飛行中のリクエストを
/// 待たずに捨てるのはこの経路。
pub struct PendingPose {
    result_rx: Receiver<Result<KeypointFrame>>,
}

impl PendingPose {
    /// 推論完了までブロックして結果を受け取る
    pub fn wait(self) -> Result<KeypointFrame> {
        self.result_rx
            .recv()
            .context("Inference worker disconnected")?
    }
}

pub struct AsyncPoseEngine {
    request_tx: SyncSender<Request>,
    _worker: thread::JoinHandle<()>,
}

impl AsyncPoseEngine {
    /// 検出器をワーカースレッドに移して起動する
    ///
    /// リクエストチャンネルはスロット数で制限され、全エンジンが塞がって
    /// いる間のsubmitはブロックする。エンジンがdropされるとチャンネルが
    /// 閉じ、ワーカーは残りのリクエストを流し終えて終了する。
    pub fn start(detector: PoseDetector, geometry: StreamGeometry) -> Self {
        let (request_tx, request_rx) = mpsc::sync_channel::<Request>(REQUEST_SLOTS);

        let worker = thread::spawn(move || {
            let mut detector = detector;
            while let Ok(request) = request_rx.recv() {
                let result = detector.detect(request.input, &geometry);
                // 受信側がdrop済みなら結果はそのまま破棄される
                let _ = request.result_tx.send(result);
            }
        });

        Self {
            request_tx,
            _worker: worker,
        }
    }

    /// 前処理済みテンソルを投入する
    pub fn submit(&self, input: Array4<f32>) -> Result<PendingPose> {
        let (result_tx, result_rx) = mpsc::channel();
        self.request_tx
            .send(Request { input, result_tx })
            .context("Inference worker is gone")?;
        Ok(PendingPose { result_rx })
    }
}
