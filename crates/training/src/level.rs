use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Difficulty level of a training module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Essential,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("level must be one of Beginner, Intermediate, Advanced, Essential (got '{0}')")]
pub struct ParseLevelError(pub String);

impl Level {
    pub const ALL: [Level; 4] = [
        Level::Beginner,
        Level::Intermediate,
        Level::Advanced,
        Level::Essential,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
            Level::Essential => "Essential",
        }
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|l| l.as_str() == s.trim())
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_names_only() {
        assert_eq!("Advanced".parse::<Level>(), Ok(Level::Advanced));
        assert!("advanced".parse::<Level>().is_err());
        assert!("Expert".parse::<Level>().is_err());
    }

    #[test]
    fn default_is_beginner() {
        assert_eq!(Level::default(), Level::Beginner);
    }

    #[test]
    fn serde_uses_display_names() {
        assert_eq!(serde_json::to_value(Level::Essential).unwrap(), "Essential");
        for level in Level::ALL {
            let json = serde_json::to_value(level).unwrap();
            assert_eq!(json.as_str(), Some(level.as_str()));
        }
    }
}
