//! Game settings chosen on the menu: theme, difficulty, and who moves first.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::instrument;

/// Theme ("vibe") the generated tasks are flavored with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::EnumIter,
)]
pub enum Theme {
    /// General Fun.
    #[default]
    #[serde(rename = "General Fun")]
    GeneralFun,
    /// Software Engineering.
    #[serde(rename = "Software Engineering")]
    SoftwareEngineering,
    /// Fitness & Health.
    #[serde(rename = "Fitness & Health")]
    FitnessHealth,
    /// Space & Science.
    #[serde(rename = "Space & Science")]
    SpaceScience,
    /// Pop Culture.
    #[serde(rename = "Pop Culture")]
    PopCulture,
    /// Hard Mode.
    #[serde(rename = "Hard Mode")]
    HardMode,
    /// Zen Master.
    #[serde(rename = "Zen Master")]
    ZenMaster,
    /// Master Chef.
    #[serde(rename = "Master Chef")]
    MasterChef,
    /// History Buff.
    #[serde(rename = "History Buff")]
    HistoryBuff,
    /// Nature Explorer.
    #[serde(rename = "Nature Explorer")]
    NatureExplorer,
    /// 80s Nostalgia.
    #[serde(rename = "80s Nostalgia")]
    EightiesNostalgia,
    /// Mystery & Noir.
    #[serde(rename = "Mystery & Noir")]
    MysteryNoir,
    /// Travel Guru.
    #[serde(rename = "Travel Guru")]
    TravelGuru,
    /// Literary Legend.
    #[serde(rename = "Literary Legend")]
    LiteraryLegend,
}

impl Theme {
    /// Returns the display label for this theme.
    pub fn label(self) -> &'static str {
        match self {
            Self::GeneralFun => "General Fun",
            Self::SoftwareEngineering => "Software Engineering",
            Self::FitnessHealth => "Fitness & Health",
            Self::SpaceScience => "Space & Science",
            Self::PopCulture => "Pop Culture",
            Self::HardMode => "Hard Mode",
            Self::ZenMaster => "Zen Master",
            Self::MasterChef => "Master Chef",
            Self::HistoryBuff => "History Buff",
            Self::NatureExplorer => "Nature Explorer",
            Self::EightiesNostalgia => "80s Nostalgia",
            Self::MysteryNoir => "Mystery & Noir",
            Self::TravelGuru => "Travel Guru",
            Self::LiteraryLegend => "Literary Legend",
        }
    }

    /// Position of this theme in the menu list.
    pub fn ordinal(self) -> usize {
        Self::iter().position(|t| t == self).unwrap_or(0)
    }

    /// Next theme in menu order, wrapping around.
    #[instrument]
    pub fn next(self) -> Self {
        let themes: Vec<Self> = Self::iter().collect();
        themes[(self.ordinal() + 1) % themes.len()]
    }

    /// Previous theme in menu order, wrapping around.
    #[instrument]
    pub fn previous(self) -> Self {
        let themes: Vec<Self> = Self::iter().collect();
        themes[(self.ordinal() + themes.len() - 1) % themes.len()]
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Theme {
    type Err = UnknownSetting;

    /// Accepts the label or a loose spelling of it: case, spaces, `&` and
    /// dashes are ignored, so `software-engineering` and `SPACE & SCIENCE`
    /// both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::iter()
            .find(|theme| normalize(theme.label()) == wanted)
            .ok_or_else(|| UnknownSetting::new("theme", s))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// How much effort a generated task should take.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::EnumIter,
)]
pub enum Difficulty {
    /// Trivial, under 30 seconds.
    Easy,
    /// Moderate effort, 1-2 minutes.
    #[default]
    Medium,
    /// Demanding, 3-5 minutes.
    Hard,
}

impl Difficulty {
    /// Returns the display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Qualitative effort guidance passed to the task oracle.
    pub fn descriptor(self) -> &'static str {
        match self {
            Self::Easy => "very simple, quick, and almost effortless (takes < 30 seconds).",
            Self::Medium => "standard complexity, requiring moderate effort (takes 1-2 minutes).",
            Self::Hard => "challenging, creative, or physically demanding (takes 3-5 minutes).",
        }
    }

    /// Example task of this difficulty.
    pub fn example(self) -> &'static str {
        match self {
            Self::Easy => "Type 'Victory' in a notepad 3 times.",
            Self::Medium => "Name 5 countries starting with the letter 'A'.",
            Self::Hard => "Write a 4-line rhyming poem about the current board state.",
        }
    }

    /// Cycles Easy -> Medium -> Hard -> Easy.
    #[instrument]
    pub fn next(self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            Self::Medium => Self::Hard,
            Self::Hard => Self::Easy,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSetting::new("difficulty", s))
    }
}

/// Which side takes the first move in a new game.
///
/// Defaults to [`FirstPlayer::Human`] so the player moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FirstPlayer {
    /// The human plays X and opens.
    #[default]
    Human,
    /// The opponent opens.
    Opponent,
}

impl FirstPlayer {
    /// Returns the display label for this option.
    pub fn label(self) -> &'static str {
        match self {
            Self::Human => "You",
            Self::Opponent => "Opponent",
        }
    }

    /// Toggles between `Human` and `Opponent`.
    #[instrument]
    pub fn toggle(self) -> Self {
        match self {
            Self::Human => Self::Opponent,
            Self::Opponent => Self::Human,
        }
    }
}

/// Everything the menu lets the player choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameSettings {
    /// Task theme.
    pub theme: Theme,
    /// Task difficulty.
    pub difficulty: Difficulty,
    /// Who takes the first move.
    pub first_player: FirstPlayer,
}

/// A theme or difficulty name that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Unknown {}: '{}'", kind, value)]
pub struct UnknownSetting {
    /// Which setting was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl UnknownSetting {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
