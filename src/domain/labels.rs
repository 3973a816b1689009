use {
    serde::{Deserialize, Serialize},
    std::str::FromStr,
    strum_macros::{Display, EnumIter, EnumString},
};

/// Market direction derived from prices. `Unknown` means no ground truth and is never scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Move {
    Down,
    Neutral,
    Up,
    #[default]
    Unknown,
}

impl Move {
    /// The scored classes, in the fixed reporting order.
    pub const SCORED: [Move; 3] = [Move::Down, Move::Neutral, Move::Up];

    /// Row/column index in the confusion matrix. `None` for `Unknown`.
    pub fn index(self) -> Option<usize> {
        match self {
            Move::Down => Some(0),
            Move::Neutral => Some(1),
            Move::Up => Some(2),
            Move::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        self != Move::Unknown
    }

    /// CSV cell value: `Unknown` is written as an empty cell.
    pub fn as_str(self) -> &'static str {
        match self {
            Move::Down => "down",
            Move::Neutral => "neutral",
            Move::Up => "up",
            Move::Unknown => "",
        }
    }

    /// Classifies a simple return against a symmetric threshold.
    pub fn from_return(ret: f64, threshold: f64) -> Self {
        if ret > threshold {
            Move::Up
        } else if ret < -threshold {
            Move::Down
        } else {
            Move::Neutral
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Unknown => write!(f, "unknown"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for Move {
    type Err = String;

    /// Empty, `unknown`, `none` and `nan` all read as `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "down" => Ok(Move::Down),
            "neutral" => Ok(Move::Neutral),
            "up" => Ok(Move::Up),
            "" | "unknown" | "none" | "nan" => Ok(Move::Unknown),
            other => Err(format!("unrecognised move label '{}'", other)),
        }
    }
}

/// Sentiment class emitted by the labeler.
///
/// The derived `Ord` (Bear < Neutral < Bull) is the tie-break order when two
/// classes carry the same probability: the earlier class ranks higher.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum PredictedClass {
    #[strum(to_string = "bear")]
    Bear,
    #[strum(to_string = "neutral", serialize = "neut")]
    Neutral,
    #[strum(to_string = "bull")]
    Bull,
}

impl PredictedClass {
    /// Fixed class -> move mapping. Never recalibrated.
    pub fn to_move(self) -> Move {
        match self {
            PredictedClass::Bear => Move::Down,
            PredictedClass::Neutral => Move::Neutral,
            PredictedClass::Bull => Move::Up,
        }
    }
}
