use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// 実行時設定 (config.toml)
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// ONNXモデルのパス
    #[serde(default = "default_model_path")]
    pub path: String,
    /// 推論デバイス ("cpu" | "cuda")
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_model_path() -> String {
    "models/human-pose-estimation.onnx".to_string()
}
fn default_device() -> String {
    "cpu".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            device: default_device(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VideoConfig {
    /// "cam"入力時のカメラインデックス
    #[serde(default)]
    pub camera_index: i32,
    /// ライブ表示ウィンドウのタイトル
    #[serde(default = "default_window_title")]
    pub window_title: String,
}

fn default_window_title() -> String {
    "Detection Results".to_string()
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            window_title: default_window_title(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルが読めなければデフォルトを使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::debug!(
                    "Using default config ({}: {})",
                    path.as_ref().display(),
                    e
                );
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model.path, "models/human-pose-estimation.onnx");
        assert_eq!(config.model.device, "cpu");
        assert_eq!(config.video.camera_index, 0);
        assert_eq!(config.video.window_title, "Detection Results");
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
            [model]
            device = "cuda"

            [video]
            camera_index = 2
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.model.device, "cuda");
        assert_eq!(config.model.path, "models/human-pose-estimation.onnx");
        assert_eq!(config.video.camera_index, 2);
    }
}
