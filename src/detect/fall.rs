use super::head::HeadSample;

/// ストリーム1本あたりの固定ジオメトリ
///
/// 最初のフレームを読んだ時点で確定し、セッション中は不変。
#[derive(Debug, Clone, Copy)]
pub struct StreamGeometry {
    pub width: u32,
    pub height: u32,
    /// フレームレート (fps)
    pub frame_rate: f64,
}

/// 頭部位置の時系列から転倒を判定する状態機械
///
/// 閾値はジオメトリから一度だけ導出する:
/// - fall_threshold: 連続する検出間で転倒とみなす下方向の移動量
///   （フレーム高の4%。解像度に依存しない）
/// - frame_gap_threshold: 2つの検出を「連続」とみなす最大フレーム間隔。
///   長い未検出期間をまたいだ比較は、画面への出入りなどを高速落下と
///   誤認するため除外する
/// - alert_duration: 転倒検出後に警告を維持するフレーム数（2秒分）。
///   表示のためだけの窓で、判定にはフィードバックしない
///
/// 「前回サンプルなし」はOptionで明示する。フレーム0で正当な転倒が
/// 起きた場合に検出が抑制されないようにするため、フレーム番号0を
/// 番兵として使ってはならない。
pub struct FallTracker {
    fall_threshold: f32,
    frame_gap_threshold: u64,
    alert_duration: u64,
    last_head_sample: Option<HeadSample>,
    last_head_frame: Option<u64>,
    last_fall_frame: Option<u64>,
}

impl FallTracker {
    pub fn new(geometry: &StreamGeometry) -> Self {
        Self {
            fall_threshold: 0.04 * geometry.height as f32,
            frame_gap_threshold: (geometry.frame_rate / 5.0).round() as u64,
            alert_duration: (2.0 * geometry.frame_rate).round() as u64,
            last_head_sample: None,
            last_head_frame: None,
            last_fall_frame: None,
        }
    }

    /// 1フレーム分の頭部サンプルを取り込み、更新後の警告状態を返す
    ///
    /// サンプルなし（検出なし）のフレームは基準値を変更しない。検出の
    /// 途切れは転倒でも追跡リセットでもない。frame_indexは厳密に単調
    /// 増加であること。順序の乱れは呼び出し側のバグ。
    pub fn update(&mut self, sample: Option<HeadSample>, frame_index: u64) -> bool {
        debug_assert!(
            self.last_head_frame.is_none_or(|prev| frame_index > prev),
            "frame index must be strictly increasing"
        );

        if let Some(sample) = sample {
            if let (Some(prev_sample), Some(prev_frame)) =
                (self.last_head_sample, self.last_head_frame)
            {
                // 両方とも厳密な不等号。等しい場合は発火しない
                if sample.y - prev_sample.y > self.fall_threshold
                    && frame_index - prev_frame < self.frame_gap_threshold
                {
                    self.last_fall_frame = Some(frame_index);
                }
            }

            // 転倒を記録したフレームでも基準値は必ず前進させる。
            // 持続的な下降で警告が連発しないのは意図した挙動。
            self.last_head_sample = Some(sample);
            self.last_head_frame = Some(frame_index);
        }

        self.last_fall_frame
            .is_some_and(|fall| frame_index - fall <= self.alert_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(height: u32, frame_rate: f64) -> StreamGeometry {
        StreamGeometry {
            width: 640,
            height,
            frame_rate,
        }
    }

    fn sample(y: f32) -> Option<HeadSample> {
        Some(HeadSample { y })
    }

    #[test]
    fn test_threshold_derivation() {
        let tracker = FallTracker::new(&geometry(360, 25.0));
        assert!((tracker.fall_threshold - 14.4).abs() < 1e-3);
        assert_eq!(tracker.frame_gap_threshold, 5);
        assert_eq!(tracker.alert_duration, 50);
    }

    #[test]
    fn test_no_alert_without_fall() {
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 0));
        assert!(!tracker.update(sample(101.0), 1));
        assert!(!tracker.update(None, 2));
    }

    #[test]
    fn test_delta_above_threshold_triggers() {
        // height=360 -> fall_threshold=14.4; 14.5の下降は2フレーム差なら転倒
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(tracker.update(sample(114.5), 12));
    }

    #[test]
    fn test_delta_below_threshold_does_not_trigger() {
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(!tracker.update(sample(114.25), 12));
    }

    #[test]
    fn test_delta_equal_to_threshold_does_not_trigger() {
        // height=100の閾値は正確に4.0。ちょうど4.0の下降は発火しない
        let mut tracker = FallTracker::new(&geometry(100, 25.0));
        assert_eq!(tracker.fall_threshold, 4.0);
        assert!(!tracker.update(sample(100.0), 10));
        assert!(!tracker.update(sample(104.0), 11));

        // 少しでも超えれば発火する
        let mut tracker = FallTracker::new(&geometry(100, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(tracker.update(sample(104.5), 11));
    }

    #[test]
    fn test_gap_rejection() {
        // frame_gap_threshold=5。間隔6の比較は転倒にならない
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(!tracker.update(sample(114.5), 16));
    }

    #[test]
    fn test_gap_equal_to_threshold_does_not_trigger() {
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(!tracker.update(sample(120.0), 15));

        // 間隔4なら発火する
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(tracker.update(sample(120.0), 14));
    }

    #[test]
    fn test_fall_on_early_frame_is_not_suppressed() {
        // フレーム0のサンプルも正当な基準値になる
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 0));
        assert!(tracker.update(sample(120.0), 1));
    }

    #[test]
    fn test_alert_expiry() {
        // alert_duration=50。フレーム100の転倒は100..=150で有効、151で失効
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 99));
        assert!(tracker.update(sample(120.0), 100));

        for frame in 101..=150 {
            assert!(tracker.update(None, frame), "frame {}", frame);
        }
        assert!(!tracker.update(None, 151));
    }

    #[test]
    fn test_retrigger_refreshes_alert_window() {
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 49));
        assert!(tracker.update(sample(120.0), 50));
        // 警告中の再転倒で窓が更新される
        assert!(tracker.update(sample(140.0), 51));

        for frame in 52..=101 {
            assert!(tracker.update(None, frame), "frame {}", frame);
        }
        assert!(!tracker.update(None, 102));
    }

    #[test]
    fn test_baseline_advances_on_fall_frame() {
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(tracker.update(sample(120.0), 11));
        // 基準値は120に前進済みなので、130への下降(10.0)は新たな転倒ではない
        assert!(tracker.update(sample(130.0), 12));

        // 失効タイミングがフレーム11基準であることを確認 (11+50=61まで有効)
        for frame in 13..=61 {
            assert!(tracker.update(None, frame), "frame {}", frame);
        }
        assert!(!tracker.update(None, 62));
    }

    #[test]
    fn test_gradual_descent_never_triggers() {
        // 1フレームあたり10pxの下降は閾値14.4未満のまま基準値が追従する
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        for frame in 0..20u64 {
            let y = 100.0 + 10.0 * frame as f32;
            assert!(!tracker.update(sample(y), frame), "frame {}", frame);
        }
    }

    #[test]
    fn test_missing_detection_resilience() {
        // 未検出フレームは基準値を変えず、次の検出は最後の検出と比較される
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        assert!(!tracker.update(None, 11));
        assert!(!tracker.update(None, 12));
        assert!(!tracker.update(None, 13));
        // 間隔4 (10→14) は許容範囲内なので転倒になる
        assert!(tracker.update(sample(120.0), 14));
    }

    #[test]
    fn test_missing_detection_beyond_gap() {
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        assert!(!tracker.update(sample(100.0), 10));
        for frame in 11..=15 {
            assert!(!tracker.update(None, frame));
        }
        // 間隔6は棄却される
        assert!(!tracker.update(sample(120.0), 16));
    }

    #[test]
    fn test_noop_frames_do_not_change_trajectory() {
        // 未検出フレームを挟んでも、検出フレームでの警告状態は同じ
        let mut with_gaps = FallTracker::new(&geometry(360, 25.0));
        let mut without_gaps = FallTracker::new(&geometry(360, 25.0));

        let a1 = with_gaps.update(sample(100.0), 10);
        with_gaps.update(None, 11);
        let a2 = with_gaps.update(sample(120.0), 12);

        let b1 = without_gaps.update(sample(100.0), 10);
        let b2 = without_gaps.update(sample(120.0), 12);

        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
    }

    #[test]
    fn test_determinism() {
        let inputs: Vec<(Option<HeadSample>, u64)> = (0..100u64)
            .map(|frame| {
                let y = if frame < 30 { 100.0 } else { 130.0 };
                let sample = if frame % 7 == 3 { None } else { sample(y) };
                (sample, frame)
            })
            .collect();

        let run = |inputs: &[(Option<HeadSample>, u64)]| -> Vec<bool> {
            let mut tracker = FallTracker::new(&geometry(360, 25.0));
            inputs
                .iter()
                .map(|&(sample, frame)| tracker.update(sample, frame))
                .collect()
        };

        assert_eq!(run(&inputs), run(&inputs));
    }

    #[test]
    fn test_end_to_end_scenario() {
        // 200フレーム、height=360、fps=25。フレーム0〜49はy=100、
        // フレーム50でy=120へ急落 (delta=20 > 14.4, gap=1 < 5)。
        // 転倒はフレーム50で記録され、警告は50..=100で有効、101以降は無効。
        let mut tracker = FallTracker::new(&geometry(360, 25.0));
        let mut alerts = Vec::new();

        for frame in 0..200u64 {
            let y = if frame < 50 { 100.0 } else { 120.0 };
            alerts.push(tracker.update(sample(y), frame));
        }

        for (frame, &alert) in alerts.iter().enumerate() {
            let expected = (50..=100).contains(&frame);
            assert_eq!(alert, expected, "frame {}", frame);
        }
    }
}
