use serde::Serialize;

/// 平滑化スコアの表示区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureStatus {
    Good,
    Fair,
    Slouch,
}

impl PostureStatus {
    pub const GOOD_MIN: u8 = 80;
    pub const FAIR_MIN: u8 = 60;

    pub fn from_score(score: u8) -> Self {
        if score >= Self::GOOD_MIN {
            Self::Good
        } else if score >= Self::FAIR_MIN {
            Self::Fair
        } else {
            Self::Slouch
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Slouch => "Slouch",
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            Self::Good => "Great posture! Keep it up.",
            Self::Fair => "Tip: Bring your ears over your shoulders.",
            Self::Slouch => "Tip: Sit up straight and align your spine.",
        }
    }
}
