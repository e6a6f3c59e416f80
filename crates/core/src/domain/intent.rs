use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Food,
    Weather,
    Nutrition,
    Spin,
    Chat,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Weather => "weather",
            Self::Nutrition => "nutrition",
            Self::Spin => "spin",
            Self::Chat => "chat",
            Self::Unknown => "unknown",
        }
    }

    /// Exact label match after normalisation; `None` for anything else.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "food" => Some(Self::Food),
            "weather" => Some(Self::Weather),
            "nutrition" => Some(Self::Nutrition),
            "spin" => Some(Self::Spin),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuildId(pub u64);

impl GuildId {
    /// Key used by the JSON stores.
    pub fn storage_key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
