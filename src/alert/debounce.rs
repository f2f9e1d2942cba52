use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::AlertConfig;

/// 猫背アラートの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// 閾値以上
    #[default]
    Quiet,
    /// 閾値未満だが継続時間に達していない
    Pending,
    /// 継続時間を超えて閾値未満
    Active,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }
}

/// スコアが閾値を継続して下回ったときだけアラートを上げる
///
/// 閾値以上のスコアが1回でも来れば即座に Quiet に戻り、経過時間は破棄する。
pub struct AlertDebouncer {
    threshold: u8,
    sustained: Duration,
    enabled: bool,
    state: AlertState,
    below_since: Option<Instant>,
}

impl AlertDebouncer {
    pub fn new(threshold: u8, sustained: Duration) -> Self {
        Self {
            threshold,
            sustained,
            enabled: true,
            state: AlertState::Quiet,
            below_since: None,
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        let mut debouncer = Self::new(config.threshold, Duration::from_millis(config.sustained_ms));
        debouncer.enabled = config.enabled;
        debouncer
    }

    /// 平滑化スコアを1つ取り込む。状態が変わったら新しい状態を返す
    pub fn update(&mut self, score: u8, now: Instant) -> Option<AlertState> {
        if !self.enabled {
            return None;
        }

        if score >= self.threshold {
            return self.transition(AlertState::Quiet, score);
        }

        let since = *self.below_since.get_or_insert(now);
        let next = if now.saturating_duration_since(since) >= self.sustained {
            AlertState::Active
        } else {
            AlertState::Pending
        };
        self.transition(next, score)
    }

    fn transition(&mut self, next: AlertState, score: u8) -> Option<AlertState> {
        if next == AlertState::Quiet {
            self.below_since = None;
        }
        if next == self.state {
            return None;
        }
        match next {
            AlertState::Active => info!(
                "Posture alert: score {} below {} for {:?}",
                score, self.threshold, self.sustained
            ),
            _ => debug!("Alert {} -> {} (score {})", self.state.as_str(), next.as_str(), score),
        }
        self.state = next;
        Some(next)
    }

    /// 無効化すると Quiet に戻し、再度有効化されるまで何もしない
    pub fn set_enabled(&mut self, enabled: bool) -> Option<AlertState> {
        self.enabled = enabled;
        if enabled {
            None
        } else {
            self.reset()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Quiet に戻す。状態が変わった場合は Some(Quiet)
    pub fn reset(&mut self) -> Option<AlertState> {
        self.below_since = None;
        if self.state == AlertState::Quiet {
            None
        } else {
            self.state = AlertState::Quiet;
            Some(AlertState::Quiet)
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn sustained(&self) -> Duration {
        self.sustained
    }

    /// 閾値を下回り始めた時刻
    pub fn below_since(&self) -> Option<Instant> {
        self.below_since
    }

    /// 閾値未満が続いている時間
    pub fn time_below(&self, now: Instant) -> Duration {
        self.below_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::from_config(&AlertConfig::default())
    }
}
