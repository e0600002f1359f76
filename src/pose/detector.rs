use anyhow::{bail, Context, Result};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use super::keypoint::{Keypoint, KeypointFrame, KeypointIndex, DETECTION_THRESHOLD};
use crate::detect::fall::StreamGeometry;

/// キーポイントヒートマップの出力ブロブ名
const OUTPUT_NAME: &str = "Mconv7_stage2_L2";

fn build_session(model_path: &Path, device: &str) -> Result<Session> {
    let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

    let builder = match device {
        "cpu" => builder,
        #[cfg(feature = "cuda")]
        "cuda" => {
            log::info!("Registering CUDA execution provider");
            builder.with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build(),
            ])?
        }
        other => bail!("Unsupported inference device: {}", other),
    };

    builder
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model {}", model_path.display()))
}

/// ヒートマップ出力型の姿勢検出器
pub struct PoseDetector {
    session: Session,
    input_name: String,
}

impl PoseDetector {
    /// ONNXモデルを読み込んで初期化
    pub fn new<P: AsRef<Path>>(model_path: P, device: &str) -> Result<Self> {
        let session = build_session(model_path.as_ref(), device)?;
        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .context("Model has no inputs")?;
        Ok(Self {
            session,
            input_name,
        })
    }

    /// 前処理済みテンソルからキーポイントを検出
    ///
    /// 出力は [1, C, H', W'] のヒートマップ (関節18ch + 背景)。関節ごとに
    /// 最大値の位置を求め、フレームのピクセル座標へスケールする。信頼度が
    /// 閾値を超えないスロットは不在のまま残す。
    pub fn detect(
        &mut self,
        input: Array4<f32>,
        geometry: &StreamGeometry,
    ) -> Result<KeypointFrame> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .context("Inference failed")?;

        let heatmaps: ndarray::ArrayViewD<f32> = outputs[OUTPUT_NAME]
            .try_extract_array()
            .context("Failed to extract heatmap tensor")?;

        let shape = heatmaps.shape();
        if shape.len() != 4 || shape[1] < KeypointIndex::COUNT {
            bail!("Unexpected heatmap shape {:?}", shape);
        }
        let heat_height = shape[2];
        let heat_width = shape[3];
        let scale_x = geometry.width as f32 / heat_width as f32;
        let scale_y = geometry.height as f32 / heat_height as f32;

        let mut frame = KeypointFrame::empty();

        for index in 0..KeypointIndex::COUNT {
            let Some(joint) = KeypointIndex::from_index(index) else {
                continue;
            };

            // 確信度マップの最大値を探す
            let mut best = f32::NEG_INFINITY;
            let mut best_x = 0usize;
            let mut best_y = 0usize;
            for y in 0..heat_height {
                for x in 0..heat_width {
                    let confidence = heatmaps[[0, index, y, x]];
                    if confidence > best {
                        best = confidence;
                        best_x = x;
                        best_y = y;
                    }
                }
            }

            if best > DETECTION_THRESHOLD {
                frame.set(
                    joint,
                    Keypoint::new(best_x as f32 * scale_x, best_y as f32 * scale_y, best),
                );
            }
        }

        Ok(frame)
    }
}
