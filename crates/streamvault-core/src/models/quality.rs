use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Quality tier a derived artifact is encoded to.
///
/// The table is fixed: each tier maps to the target vertical resolution the encoder
/// scales to, keeping the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum QualityTier {
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Hd1080,
}

impl QualityTier {
    /// Every known tier, lowest resolution first.
    pub const ALL: [QualityTier; 2] = [QualityTier::Hd720, QualityTier::Hd1080];

    /// Label used in storage file names, record keys and the `quality` query parameter.
    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Hd720 => "720p",
            QualityTier::Hd1080 => "1080p",
        }
    }

    /// Target output height in pixels.
    pub fn target_height(&self) -> u32 {
        match self {
            QualityTier::Hd720 => 720,
            QualityTier::Hd1080 => 1080,
        }
    }

    /// Case-insensitive lookup. Returns `None` for labels outside the table.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(label))
    }
}

impl FromStr for QualityTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| anyhow::anyhow!("Unsupported quality tier: {}", s))
    }
}

impl Display for QualityTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}
