pub mod debounce;
pub mod notify;

pub use debounce::{AlertDebouncer, AlertState};
pub use notify::{deliver, CommandNotifier, LogNotifier, NotificationSink, Permission, PostureAlert};
