//! Target platforms for which toolchains are published.

use std::fmt;

/// Documentation page base for the vendor's getting-started guides.
const DOC_BASE_URL: &str = "https://docs.espressif.com/projects/esp-idf/en/latest/get-started";

/// A target operating system with its own toolchain downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// Linux hosts.
    Linux,
    /// macOS hosts.
    Macos,
    /// Windows hosts.
    Windows,
}

impl Platform {
    /// All platforms in the fixed processing order.
    pub const ALL: [Platform; 3] = [Self::Linux, Self::Macos, Self::Windows];

    /// Returns the database and directory string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
        }
    }

    /// Returns the vendor setup page that lists this platform's toolchains.
    #[must_use]
    pub fn default_doc_url(&self) -> String {
        format!("{DOC_BASE_URL}/{}-setup.html", self.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Macos),
            "windows" => Ok(Self::Windows),
            _ => Err(format!("invalid platform: {s} (expected linux, macos or windows)")),
        }
    }
}
