use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// スコア計算に必要なランドマーク数。これ未満ならフォールバック
    #[serde(default = "default_required_landmarks")]
    pub required_landmarks: usize,
    /// ランドマーク不足時に返すスコア
    #[serde(default = "default_fallback_score")]
    pub fallback_score: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmoothingConfig {
    /// 移動平均に使う直近フレーム数
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertConfig {
    /// これ未満のスコアを猫背とみなす
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// アラートまでに猫背が継続すべき時間（ミリ秒）
    #[serde(default = "default_sustained_ms")]
    pub sustained_ms: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 通知コマンド (e.g. ["notify-send", "-u", "normal"])。タイトルと本文が末尾に追加される
    #[serde(default)]
    pub command: Vec<String>,
}

fn default_required_landmarks() -> usize { 33 }
fn default_fallback_score() -> f64 { 80.0 }
fn default_history_capacity() -> usize { 7 }
fn default_threshold() -> u8 { 60 }
fn default_sustained_ms() -> u64 { 7000 }
fn default_true() -> bool { true }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            required_landmarks: default_required_landmarks(),
            fallback_score: default_fallback_score(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            sustained_ms: default_sustained_ms(),
            enabled: true,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルがなければデフォルト値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.smoothing.history_capacity > 0,
            "smoothing.history_capacity must be at least 1"
        );
        ensure!(
            (0.0..=100.0).contains(&self.scoring.fallback_score),
            "scoring.fallback_score must be within 0..=100, got {}",
            self.scoring.fallback_score
        );
        ensure!(
            self.alert.threshold <= 100,
            "alert.threshold must be within 0..=100, got {}",
            self.alert.threshold
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scoring.required_landmarks, 33);
        assert_eq!(config.scoring.fallback_score, 80.0);
        assert_eq!(config.smoothing.history_capacity, 7);
        assert_eq!(config.alert.threshold, 60);
        assert_eq!(config.alert.sustained_ms, 7000);
        assert!(config.alert.enabled);
        assert!(config.notify.enabled);
        assert!(config.notify.command.is_empty());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.alert.threshold, 60);
        assert_eq!(config.smoothing.history_capacity, 7);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            [alert]
            threshold = 70
            sustained_ms = 3000

            [notify]
            command = ["notify-send", "-u", "critical"]
            "#,
        )
        .unwrap();
        assert_eq!(config.alert.threshold, 70);
        assert_eq!(config.alert.sustained_ms, 3000);
        assert!(config.alert.enabled);
        assert_eq!(config.notify.command, vec!["notify-send", "-u", "critical"]);
        assert_eq!(config.scoring.required_landmarks, 33);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Config::from_toml("[smoothing]\nhistory_capacity = 0\n").unwrap_err();
        assert!(err.to_string().contains("history_capacity"));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        assert!(Config::from_toml("[alert]\nthreshold = 120\n").is_err());
        assert!(Config::from_toml("[scoring]\nfallback_score = -1.0\n").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/posture.toml").unwrap();
        assert_eq!(config.alert.sustained_ms, 7000);
    }
}
