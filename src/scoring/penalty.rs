use crate::config::ScoringConfig;
use crate::pose::{angle_between, midpoint, tilt_from_vertical, Landmark, LandmarkIndex, Point2};

// 肩の左右差
const SHOULDER_SCALE: f64 = 0.20;
const SHOULDER_CAP: f64 = 12.0;

// 頭の落ち込み（主信号）
const HEAD_DROP_MIN_PX: f64 = 80.0;
const HEAD_DROP_SCALE: f64 = 0.6;
const HEAD_DROP_CAP: f64 = 45.0;

// 耳の縦ずれ
const EAR_DRIFT_MIN_PX: f64 = 100.0;
const EAR_DRIFT_SCALE: f64 = 0.35;
const EAR_DRIFT_CAP: f64 = 30.0;

// 背骨の傾き
const SPINE_SCALE: f64 = 0.3;
const SPINE_CAP: f64 = 10.0;

// 非線形リマップ: EXCELLENT 未満は一律に押し下げる
const EXCELLENT_SCORE: f64 = 93.0;
const SLOUCH_DROP: f64 = 30.0;
const SLOUCH_FLOOR: f64 = 40.0;

/// 1フレーム分のスコア内訳
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyBreakdown {
    pub shoulder: f64,
    pub head_drop: f64,
    /// 計算はするが合計には含めない
    pub ear_drift: f64,
    pub spine: f64,
    /// 背骨の傾き（度、符号付き）
    pub spine_angle: f64,
    /// 耳-肩中心-腰中心の折れ角（度）。診断用
    pub neck_angle: f64,
    /// クランプ後、リマップ前のスコア
    pub base_score: f64,
    /// 最終スコア
    pub score: f64,
}

/// ランドマークから姿勢スコア (0〜100) を計算する
///
/// 状態を持たないので同じ入力には常に同じ結果を返す。
#[derive(Debug, Clone)]
pub struct PostureScorer {
    required_landmarks: usize,
    fallback_score: f64,
}

impl PostureScorer {
    pub fn new(required_landmarks: usize, fallback_score: f64) -> Self {
        Self {
            // 参照するインデックスは最大 24 なので、それ未満にはしない
            required_landmarks: required_landmarks.max(LandmarkIndex::RightHip as usize + 1),
            fallback_score,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.required_landmarks, config.fallback_score)
    }

    pub fn fallback_score(&self) -> f64 {
        self.fallback_score
    }

    /// スコアを計算。ランドマーク不足・非有限値ならフォールバック値
    pub fn score(&self, landmarks: &[Landmark], width: u32, height: u32) -> f64 {
        self.breakdown(landmarks, width, height)
            .map(|b| b.score)
            .unwrap_or(self.fallback_score)
    }

    /// スコアの内訳を計算。ランドマーク不足なら None
    pub fn breakdown(&self, landmarks: &[Landmark], width: u32, height: u32) -> Option<PenaltyBreakdown> {
        if landmarks.len() < self.required_landmarks {
            return None;
        }

        let pt = |index: LandmarkIndex| -> Option<Point2> {
            let lm = landmarks.get(index as usize)?;
            lm.is_finite().then(|| lm.to_pixel(width, height))
        };

        let left_shoulder = pt(LandmarkIndex::LeftShoulder)?;
        let right_shoulder = pt(LandmarkIndex::RightShoulder)?;
        let left_hip = pt(LandmarkIndex::LeftHip)?;
        let right_hip = pt(LandmarkIndex::RightHip)?;
        let ear = pt(LandmarkIndex::LeftEar)?;
        let nose = pt(LandmarkIndex::Nose)?;

        let shoulder_center = midpoint(left_shoulder, right_shoulder);
        let hip_center = midpoint(left_hip, right_hip);

        let shoulder = shoulder_penalty(left_shoulder, right_shoulder);
        // 正: 頭が肩より上
        let head_drop = drop_penalty(
            shoulder_center.y - nose.y,
            HEAD_DROP_MIN_PX,
            HEAD_DROP_SCALE,
            HEAD_DROP_CAP,
        );
        let ear_drift = drop_penalty(
            shoulder_center.y - ear.y,
            EAR_DRIFT_MIN_PX,
            EAR_DRIFT_SCALE,
            EAR_DRIFT_CAP,
        );
        let spine_angle = tilt_from_vertical(hip_center, shoulder_center);
        let spine = (spine_angle.abs() * SPINE_SCALE).min(SPINE_CAP);
        let neck_angle = angle_between(ear, shoulder_center, hip_center);

        let base_score = (100.0 - head_drop - shoulder - spine).clamp(0.0, 100.0);

        Some(PenaltyBreakdown {
            shoulder,
            head_drop,
            ear_drift,
            spine,
            spine_angle,
            neck_angle,
            base_score,
            score: remap_slouch(base_score),
        })
    }
}

impl Default for PostureScorer {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

fn shoulder_penalty(left: Point2, right: Point2) -> f64 {
    ((left.y - right.y).abs() * SHOULDER_SCALE).min(SHOULDER_CAP)
}

/// 肩中心からの高さが min_px を下回った分だけ減点
fn drop_penalty(height_above_shoulders: f64, min_px: f64, scale: f64, cap: f64) -> f64 {
    if height_above_shoulders < min_px {
        ((min_px - height_above_shoulders) * scale).min(cap)
    } else {
        0.0
    }
}

/// 93 未満を 40〜70 帯に押し込む
pub fn remap_slouch(score: f64) -> f64 {
    if score < EXCELLENT_SCORE {
        (score - SLOUCH_DROP).max(SLOUCH_FLOOR)
    } else {
        score
    }
}
