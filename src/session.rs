use std::time::{Duration, Instant};
use tracing::debug;

use crate::alert::{deliver, AlertDebouncer, AlertState, NotificationSink, PostureAlert};
use crate::config::Config;
use crate::pose::Landmark;
use crate::scoring::{PostureScorer, PostureStatus, ScoreHistory};

/// スコアとアラートの購読者
///
/// フレーム処理スレッド上で同期的に呼ばれる。
pub trait ScoreObserver {
    fn on_score(&mut self, score: u8);

    fn on_alert_change(&mut self, _state: AlertState) {}

    fn on_fps(&mut self, _fps: u32) {}
}

/// 1秒窓のフレームカウンタ
pub struct FpsCounter {
    window: Duration,
    frames: u32,
    window_start: Option<Instant>,
    last_fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            window: Duration::from_secs(1),
            frames: 0,
            window_start: None,
            last_fps: 0,
        }
    }

    /// フレームを1つ数える。窓が閉じたらその窓のフレーム数を返す
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        if now.saturating_duration_since(start) >= self.window {
            self.last_fps = self.frames;
            self.frames = 0;
            self.window_start = Some(now);
            Some(self.last_fps)
        } else {
            None
        }
    }

    /// 直近に確定したFPS
    pub fn fps(&self) -> u32 {
        self.last_fps
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// 1フレーム処理の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// 平滑化スコア
    pub score: u8,
    /// このフレームの生スコア
    pub raw_score: f64,
    pub status: PostureStatus,
    pub slouch: bool,
    pub alert: AlertState,
    /// このフレームで遷移した場合のみ true
    pub alert_changed: bool,
    /// 1秒窓が閉じたフレームのみ Some
    pub fps: Option<u32>,
}

/// 1本のランドマークストリームに対するスコアリングセッション
///
/// 平滑化バッファとアラート状態はこのセッションが単独で所有する。
/// フレームは到着順に1つずつ処理すること。
pub struct PostureSession {
    scorer: PostureScorer,
    history: ScoreHistory,
    debouncer: AlertDebouncer,
    fps: FpsCounter,
    observers: Vec<Box<dyn ScoreObserver + Send>>,
    notifier: Option<Box<dyn NotificationSink + Send>>,
    running: bool,
    frames: u64,
}

impl PostureSession {
    pub fn new(scorer: PostureScorer, history: ScoreHistory, debouncer: AlertDebouncer) -> Self {
        Self {
            scorer,
            history,
            debouncer,
            fps: FpsCounter::new(),
            observers: Vec::new(),
            notifier: None,
            running: true,
            frames: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PostureScorer::from_config(&config.scoring),
            ScoreHistory::from_config(&config.smoothing),
            AlertDebouncer::from_config(&config.alert),
        )
    }

    pub fn subscribe(&mut self, observer: Box<dyn ScoreObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn with_notifier(mut self, notifier: Box<dyn NotificationSink + Send>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 1フレーム処理する。停止後は None
    pub fn on_frame(
        &mut self,
        landmarks: &[Landmark],
        width: u32,
        height: u32,
        now: Instant,
    ) -> Option<FrameReport> {
        if !self.running {
            debug!("Session stopped, ignoring frame");
            return None;
        }

        let raw_score = self.scorer.score(landmarks, width, height);
        self.history.push(raw_score);
        let score = self.history.current()?;
        self.frames += 1;

        for observer in &mut self.observers {
            observer.on_score(score);
        }

        let change = self.debouncer.update(score, now);
        if let Some(state) = change {
            self.publish_alert(state, score);
        }

        let fps = self.fps.tick(now);
        if let Some(fps) = fps {
            for observer in &mut self.observers {
                observer.on_fps(fps);
            }
        }

        Some(FrameReport {
            score,
            raw_score,
            status: PostureStatus::from_score(score),
            slouch: score < self.debouncer.threshold(),
            alert: self.debouncer.state(),
            alert_changed: change.is_some(),
            fps,
        })
    }

    fn publish_alert(&mut self, state: AlertState, score: u8) {
        for observer in &mut self.observers {
            observer.on_alert_change(state);
        }
        if state == AlertState::Active {
            if let Some(notifier) = self.notifier.as_deref_mut() {
                let alert = PostureAlert::sustained(score, self.debouncer.sustained());
                deliver(notifier, &alert);
            }
        }
    }

    /// アラートの有効/無効を切り替える
    pub fn set_alerts_enabled(&mut self, enabled: bool) {
        if let Some(state) = self.debouncer.set_enabled(enabled) {
            for observer in &mut self.observers {
                observer.on_alert_change(state);
            }
        }
    }

    /// フレーム受付を止め、平滑化バッファとアラート状態を破棄する
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.history.reset();
        if let Some(state) = self.debouncer.reset() {
            for observer in &mut self.observers {
                observer.on_alert_change(state);
            }
        }
        self.fps.reset();
        debug!("Session stopped after {} frames", self.frames);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 最新の平滑化スコア
    pub fn current_score(&self) -> Option<u8> {
        self.history.current()
    }

    pub fn alert_state(&self) -> AlertState {
        self.debouncer.state()
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// 処理済みフレーム数
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for PostureSession {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
