//! Directory management modes.

use serde::{Deserialize, Serialize};

/// How a managed directory's entries are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Directory of further managed directories (`subdir`)
    Container,
    /// Directory of movie files or movie folders (`movie`)
    Movie,
    /// Directory of season folders (`tv`)
    Series,
    /// Audio-only directory (`soundtrack`)
    Soundtrack,
}

impl Mode {
    /// Descriptor keyword for this mode.
    pub fn keyword(&self) -> &'static str {
        match self {
            Mode::Container => "subdir",
            Mode::Movie => "movie",
            Mode::Series => "tv",
            Mode::Soundtrack => "soundtrack",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subdir" => Ok(Mode::Container),
            "movie" => Ok(Mode::Movie),
            "tv" => Ok(Mode::Series),
            "soundtrack" => Ok(Mode::Soundtrack),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("SubDir".parse::<Mode>(), Ok(Mode::Container));
        assert_eq!(" movie ".parse::<Mode>(), Ok(Mode::Movie));
        assert_eq!("TV".parse::<Mode>(), Ok(Mode::Series));
        assert_eq!("soundtrack".parse::<Mode>(), Ok(Mode::Soundtrack));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!("series".parse::<Mode>(), Err("series".to_string()));
    }
}
