use std::collections::VecDeque;

use crate::config::SmoothingConfig;

/// 生スコアの移動平均
///
/// 直近 capacity フレーム分だけ保持し、古いものから捨てる。
pub struct ScoreHistory {
    capacity: usize,
    scores: VecDeque<f64>,
}

impl ScoreHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            scores: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(config.history_capacity)
    }

    pub fn push(&mut self, raw_score: f64) {
        self.scores.push_back(raw_score);
        while self.scores.len() > self.capacity {
            self.scores.pop_front();
        }
    }

    /// 平均を四捨五入した平滑化スコア。まだ1フレームもなければ None
    pub fn current(&self) -> Option<u8> {
        if self.scores.is_empty() {
            return None;
        }
        let mean = self.scores.iter().sum::<f64>() / self.scores.len() as f64;
        Some(mean.round().clamp(0.0, 100.0) as u8)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reset(&mut self) {
        self.scores.clear();
    }
}

impl Default for ScoreHistory {
    fn default() -> Self {
        Self::from_config(&SmoothingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_value() {
        let h = ScoreHistory::default();
        assert!(h.is_empty());
        assert_eq!(h.current(), None);
    }

    #[test]
    fn test_first_frame_passthrough() {
        let mut h = ScoreHistory::default();
        h.push(73.0);
        assert_eq!(h.current(), Some(73));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut h = ScoreHistory::default();
        for i in 0..100 {
            h.push(i as f64);
            assert!(h.len() <= 7);
        }
        assert_eq!(h.len(), 7);
        assert_eq!(h.capacity(), 7);
    }

    #[test]
    fn test_mean_of_last_seven_after_ten() {
        let mut h = ScoreHistory::default();
        let scores = [100.0, 40.0, 55.0, 62.0, 71.0, 93.0, 40.0, 100.0, 58.0, 66.0];
        for s in scores {
            h.push(s);
        }
        let mean: f64 = scores[3..].iter().sum::<f64>() / 7.0;
        assert_eq!(h.current(), Some(mean.round() as u8));
        assert_eq!(h.current(), Some(70));
    }

    #[test]
    fn test_half_rounds_up() {
        let mut h = ScoreHistory::new(2);
        h.push(60.0);
        h.push(61.0);
        assert_eq!(h.current(), Some(61));
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut h = ScoreHistory::new(0);
        h.push(10.0);
        h.push(90.0);
        assert_eq!(h.len(), 1);
        assert_eq!(h.current(), Some(90));
    }

    #[test]
    fn test_reset() {
        let mut h = ScoreHistory::default();
        h.push(40.0);
        h.push(40.0);
        h.reset();
        assert_eq!(h.current(), None);
        h.push(100.0);
        assert_eq!(h.current(), Some(100));
    }
}
