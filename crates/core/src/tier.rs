//! Quality tiers and the resolution ladder.

use serde::{Deserialize, Serialize};

/// Discrete output-quality classification.
///
/// Ordering follows quality: `Sd < Hd < OneK < FourK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// 480 lines
    #[serde(rename = "sd")]
    Sd,
    /// 720 lines
    #[serde(rename = "hd")]
    Hd,
    /// 1080 lines
    #[serde(rename = "1k")]
    OneK,
    /// 2160 lines
    #[serde(rename = "4k")]
    FourK,
}

/// Errors from tier classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LadderError {
    /// Probed dimensions match no known tier
    #[error("unknown resolution {width}x{height}")]
    UnknownResolution {
        /// Probed width
        width: u32,
        /// Probed height
        height: u32,
    },
}

impl Tier {
    /// All tiers, highest first.
    pub const DESCENDING: [Tier; 4] = [Tier::FourK, Tier::OneK, Tier::Hd, Tier::Sd];

    /// Short label used in section names, file names and markers.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Sd => "sd",
            Tier::Hd => "hd",
            Tier::OneK => "1k",
            Tier::FourK => "4k",
        }
    }

    /// Output frame height for this tier.
    pub fn height(&self) -> u32 {
        match self {
            Tier::Sd => 480,
            Tier::Hd => 720,
            Tier::OneK => 1080,
            Tier::FourK => 2160,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sd" => Ok(Tier::Sd),
            "hd" => Ok(Tier::Hd),
            "1k" => Ok(Tier::OneK),
            "4k" => Ok(Tier::FourK),
            other => Err(other.to_string()),
        }
    }
}

/// Classify probed dimensions by exact match.
pub fn classify_tier(width: u32, height: u32) -> Result<Tier, LadderError> {
    match (width, height) {
        (720, 480) => Ok(Tier::Sd),
        (1080, 720) => Ok(Tier::Hd),
        (1920, 1080) => Ok(Tier::OneK),
        (4096, 2160) | (3840, 2160) => Ok(Tier::FourK),
        _ => Err(LadderError::UnknownResolution { width, height }),
    }
}

/// Expand a tier into the list of tiers to produce.
///
/// Without `multi` the ladder is just `[tier]`. With it, the ladder descends
/// from `tier` down to and including `sd`.
pub fn expand_ladder(tier: Tier, multi: bool) -> Vec<Tier> {
    if !multi {
        return vec![tier];
    }
    Tier::DESCENDING
        .iter()
        .copied()
        .filter(|t| *t <= tier)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_pairs() {
        assert_eq!(classify_tier(720, 480), Ok(Tier::Sd));
        assert_eq!(classify_tier(1080, 720), Ok(Tier::Hd));
        assert_eq!(classify_tier(1920, 1080), Ok(Tier::OneK));
        assert_eq!(classify_tier(3840, 2160), Ok(Tier::FourK));
        assert_eq!(classify_tier(4096, 2160), Ok(Tier::FourK));
    }

    #[test]
    fn test_classify_unknown_pair() {
        assert_eq!(
            classify_tier(1280, 720),
            Err(LadderError::UnknownResolution { width: 1280, height: 720 })
        );
    }

    #[test]
    fn test_single_ladder() {
        for tier in Tier::DESCENDING {
            assert_eq!(expand_ladder(tier, false), vec![tier]);
        }
    }

    #[test]
    fn test_multi_ladder_descends_to_sd() {
        assert_eq!(
            expand_ladder(Tier::FourK, true),
            vec![Tier::FourK, Tier::OneK, Tier::Hd, Tier::Sd]
        );
        assert_eq!(expand_ladder(Tier::OneK, true), vec![Tier::OneK, Tier::Hd, Tier::Sd]);
        assert_eq!(expand_ladder(Tier::Hd, true), vec![Tier::Hd, Tier::Sd]);
        assert_eq!(expand_ladder(Tier::Sd, true), vec![Tier::Sd]);

        for tier in Tier::DESCENDING {
            let ladder = expand_ladder(tier, true);
            assert!(ladder.windows(2).all(|w| w[0] >= w[1]));
            assert_eq!(ladder.last(), Some(&Tier::Sd));
        }
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        assert_eq!("1K".parse::<Tier>(), Ok(Tier::OneK));
        assert_eq!(Tier::FourK.to_string(), "4k");
        assert!("8k".parse::<Tier>().is_err());
    }
}
