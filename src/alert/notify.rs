use anyhow::{bail, Context, Result};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::NotifyConfig;

pub const ALERT_TITLE: &str = "Posture Alert";
/// 同じタグの通知は置き換えられる
pub const ALERT_TAG: &str = "posture-alert";

/// 通知の許可状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// 通知手段がない
    Unavailable,
}

/// Active への遷移時に送る通知
#[derive(Debug, Clone, PartialEq)]
pub struct PostureAlert {
    pub title: String,
    pub body: String,
    pub tag: &'static str,
    pub score: u8,
}

impl PostureAlert {
    pub fn sustained(score: u8, sustained: Duration) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            body: format!(
                "Your posture has been poor for over {} seconds. Please adjust your position.",
                format_seconds(sustained)
            ),
            tag: ALERT_TAG,
            score,
        }
    }
}

fn format_seconds(d: Duration) -> String {
    let ms = d.as_millis();
    if ms % 1000 == 0 {
        format!("{}", ms / 1000)
    } else {
        format!("{:.1}", d.as_secs_f64())
    }
}

/// 通知の送り先（バナー、OS通知など）
pub trait NotificationSink {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&mut self, alert: &PostureAlert) -> Result<()>;
}

/// 通知を送る。失敗してもログに残すだけで、送れたかどうかを返す
pub fn deliver(sink: &mut dyn NotificationSink, alert: &PostureAlert) -> bool {
    match sink.permission() {
        Permission::Granted => {}
        Permission::Denied => {
            debug!("Notification permission denied, skipping alert");
            return false;
        }
        Permission::Unavailable => {
            debug!("Notifications unavailable, skipping alert");
            return false;
        }
    }
    match sink.notify(alert) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to show notification: {:#}", e);
            false
        }
    }
}

/// tracing に警告として出すだけのシンク
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&mut self, alert: &PostureAlert) -> Result<()> {
        warn!(score = alert.score, tag = alert.tag, "{}: {}", alert.title, alert.body);
        Ok(())
    }
}

/// 外部コマンド（notify-send 等）でデスクトップ通知を出す
///
/// タイトルと本文を引数の末尾に追加して起動する。終了は待たない。
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: Vec<String>,
}

impl CommandNotifier {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// 設定で無効、またはコマンド未指定なら None
    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        (config.enabled && !config.command.is_empty()).then(|| Self::new(config.command.clone()))
    }
}

impl NotificationSink for CommandNotifier {
    fn permission(&self) -> Permission {
        if self.command.is_empty() {
            Permission::Unavailable
        } else {
            Permission::Granted
        }
    }

    fn notify(&mut self, alert: &PostureAlert) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("No notification command configured");
        };
        let mut child = Command::new(program)
            .args(args)
            .arg(&alert.title)
            .arg(&alert.body)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", program))?;

        let program = program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => warn!("{} exited with {}", program, status),
            Err(e) => warn!("Failed to wait for {}: {}", program, e),
            _ => {}
        });
        Ok(())
    }
}
