//! The closed set of supported languages.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ExecError;

/// A language the daemon knows how to build and run.
///
/// Parsing is exact: `cpp`, `python`, `javascript`. No aliases, no case folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Python,
    JavaScript,
}

impl Language {
    pub const ALL: [Self; 3] = [Self::Cpp, Self::Python, Self::JavaScript];

    /// Wire name of the language.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| ExecError::UnsupportedLanguage(s.to_string()))
    }
}
