use crate::modifiers::Modifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host platform family, consulted once to decide what `super` means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Windows,
    Linux,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "macos") || cfg!(target_os = "ios") {
            Self::Mac
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    /// Classify a browser-style user agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("mac") {
            Self::Mac
        } else if ua.contains("win") {
            Self::Windows
        } else if ua.contains("linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    pub fn is_mac_like(&self) -> bool {
        matches!(self, Self::Mac)
    }

    /// The modifier `super` stands for: command on mac, ctrl everywhere else
    pub fn super_modifier(&self) -> Modifier {
        if self.is_mac_like() {
            Modifier::Command
        } else {
            Modifier::Ctrl
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mac => "mac",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mac" | "macos" | "darwin" => Ok(Self::Mac),
            "windows" | "win" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "other" => Ok(Self::Other),
            _ => Err(anyhow::anyhow!("Unknown platform: {}", s)),
        }
    }
}
