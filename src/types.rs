// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a program record was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "Security.txt")]
    SecurityTxt,
    Website,
    Platform,
    Manual,
    HackerOne,
    Bugcrowd,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::SecurityTxt => "Security.txt",
            Source::Website => "Website",
            Source::Platform => "Platform",
            Source::Manual => "Manual",
            Source::HackerOne => "HackerOne",
            Source::Bugcrowd => "Bugcrowd",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered bug bounty or disclosure program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// Discovery source tag
    pub platform: Source,

    /// Absolute URL of the program or its landing page
    pub link: String,

    /// Hostname the record applies to
    pub scope: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub rewards: String,
}

impl ProgramRecord {
    pub fn new(platform: Source, link: impl Into<String>, scope: &str) -> Self {
        Self {
            platform,
            link: link.into(),
            scope: scope.to_lowercase(),
            description: String::new(),
            rewards: String::new(),
        }
    }
}

impl fmt::Display for ProgramRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.platform, self.link)
    }
}

/// Outcome of a domain lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub found: bool,
    #[serde(default)]
    pub programs: Vec<ProgramRecord>,
}

impl LookupResult {
    /// Build a result from deduplicated programs; `found` follows from the list
    pub fn from_programs(programs: Vec<ProgramRecord>) -> Self {
        Self {
            found: !programs.is_empty(),
            programs,
        }
    }

    /// Result carrying only the boolean outcome (cache hits)
    pub fn outcome_only(found: bool) -> Self {
        Self {
            found,
            programs: Vec::new(),
        }
    }
}

/// A lookup result tagged with the domain and time it was produced, for output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupReport {
    /// Unix timestamp when the lookup completed
    pub timestamp: u64,

    pub domain: String,

    #[serde(flatten)]
    pub result: LookupResult,
}

impl LookupReport {
    pub fn new(domain: String, result: LookupResult) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
            domain,
            result,
        }
    }
}

impl fmt::Display for LookupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.result.found {
            write!(f, "[+] {} ({} programs)", self.domain, self.result.programs.len())
        } else {
            write!(f, "[-] {}", self.domain)
        }
    }
}
