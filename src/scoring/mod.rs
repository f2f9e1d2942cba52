pub mod penalty;
pub mod smooth;
pub mod status;

pub use penalty::{remap_slouch, PenaltyBreakdown, PostureScorer};
pub use smooth::ScoreHistory;
pub use status::PostureStatus;
