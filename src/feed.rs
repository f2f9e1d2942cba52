use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::pose::LandmarkFrame;
use crate::session::PostureSession;

struct Slot {
    latest: Mutex<Option<LandmarkFrame>>,
    frame_id: AtomicU64,
    closed: AtomicBool,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<LandmarkFrame>> {
        // 書き込み側が panic しても最新フレームは読める
        self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// ランドマークソース側のハンドル
///
/// 未処理のフレームは上書きされる。キューには積まない。
pub struct FeedSender {
    slot: Arc<Slot>,
}

/// フレーム処理側のハンドル
pub struct FeedReceiver {
    slot: Arc<Slot>,
    last_id: u64,
}

/// 最新1フレームだけを受け渡すフィードを作る
pub fn landmark_feed() -> (FeedSender, FeedReceiver) {
    let slot = Arc::new(Slot {
        latest: Mutex::new(None),
        frame_id: AtomicU64::new(0),
        closed: AtomicBool::new(false),
    });
    (
        FeedSender { slot: slot.clone() },
        FeedReceiver { slot, last_id: 0 },
    )
}

impl FeedSender {
    /// 新しいフレームを置く。フレームIDを返す
    pub fn publish(&self, frame: LandmarkFrame) -> u64 {
        let mut latest = self.slot.lock();
        *latest = Some(frame);
        self.slot.frame_id.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// ソース停止。受信側は残りを処理せずに終了する
    pub fn close(&self) {
        self.slot.closed.store(true, Ordering::Release);
    }
}

impl Drop for FeedSender {
    fn drop(&mut self) {
        self.close();
    }
}

impl FeedReceiver {
    /// 前回以降に届いた最新フレームを取り出す
    ///
    /// 間に上書きされたフレーム数を合わせて返す。新着がなければ None。
    pub fn take_latest(&mut self) -> Option<(LandmarkFrame, u64)> {
        // ID は publish と同じロック下で読む
        let (frame, id) = {
            let mut latest = self.slot.lock();
            let frame = latest.take()?;
            (frame, self.slot.frame_id.load(Ordering::Acquire))
        };
        let dropped = id.saturating_sub(self.last_id + 1);
        self.last_id = id;
        Some((frame, dropped))
    }

    pub fn is_closed(&self) -> bool {
        self.slot.closed.load(Ordering::Acquire)
    }

    /// 最後に受け取ったフレームID
    pub fn last_id(&self) -> u64 {
        self.last_id
    }
}

/// drive の集計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveStats {
    pub processed: u64,
    /// 処理が追いつかず上書きされたフレーム数
    pub dropped: u64,
}

/// ソースが閉じるまでフィードのフレームをセッションに流す
///
/// フレームは到着順に1つずつ処理する。終了時にセッションを停止する。
pub fn drive(session: &mut PostureSession, feed: &mut FeedReceiver) -> DriveStats {
    let mut stats = DriveStats::default();

    loop {
        if feed.is_closed() {
            break;
        }
        let Some((frame, dropped)) = feed.take_latest() else {
            thread::sleep(Duration::from_millis(1));
            continue;
        };
        if dropped > 0 {
            debug!("Dropped {} stale frames", dropped);
            stats.dropped += dropped;
        }
        if session
            .on_frame(&frame.landmarks, frame.width, frame.height, Instant::now())
            .is_some()
        {
            stats.processed += 1;
        }
    }

    session.stop();
    debug!(
        "Feed closed: processed {}, dropped {}",
        stats.processed, stats.dropped
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LandmarkIndex};

    fn frame(ts: u64) -> LandmarkFrame {
        LandmarkFrame::new(ts, 640, 480, vec![Landmark::new(0.5, 0.5); LandmarkIndex::COUNT])
    }

    #[test]
    fn test_empty_feed() {
        let (_tx, mut rx) = landmark_feed();
        assert!(rx.take_latest().is_none());
        assert!(!rx.is_closed());
    }

    #[test]
    fn test_take_latest_once() {
        let (tx, mut rx) = landmark_feed();
        assert_eq!(tx.publish(frame(1)), 1);
        let (f, dropped) = rx.take_latest().unwrap();
        assert_eq!(f.timestamp_ms, 1);
        assert_eq!(dropped, 0);
        assert!(rx.take_latest().is_none());
    }

    #[test]
    fn test_overwrite_drops_stale() {
        let (tx, mut rx) = landmark_feed();
        tx.publish(frame(1));
        tx.publish(frame(2));
        tx.publish(frame(3));
        let (f, dropped) = rx.take_latest().unwrap();
        assert_eq!(f.timestamp_ms, 3);
        assert_eq!(dropped, 2);
        assert_eq!(rx.last_id(), 3);

        tx.publish(frame(4));
        let (f, dropped) = rx.take_latest().unwrap();
        assert_eq!(f.timestamp_ms, 4);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_drop_sender_closes() {
        let (tx, rx) = landmark_feed();
        drop(tx);
        assert!(rx.is_closed());
    }

    #[test]
    fn test_drive_until_closed() {
        let (tx, mut rx) = landmark_feed();
        let producer = thread::spawn(move || {
            for i in 0..5 {
                tx.publish(frame(i));
                // 受信側が取り出すまで待つ
                let deadline = Instant::now() + Duration::from_secs(5);
                while tx.slot.lock().is_some() && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(1));
                }
            }
            tx.close();
        });

        let mut session = PostureSession::default();
        let stats = drive(&mut session, &mut rx);
        producer.join().unwrap();

        assert_eq!(stats.processed + stats.dropped, 5);
        assert!(stats.processed >= 1);
        assert!(!session.is_running());
        assert_eq!(session.current_score(), None);
    }
}
