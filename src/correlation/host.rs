// Agent host identification.
// Log scraping is a heuristic over free text: it depends on the CI system's
// console format and breaks silently if that format changes.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{CorrelationError, Result};
use crate::models::BuildRecord;

const RUNNING_ON_PATTERN: &str = r"Running on ([A-Za-z0-9_][\w.-]*)";

static RUNNING_ON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(RUNNING_ON_PATTERN).expect("valid host line pattern"));

static RUNNING_ON_ANY_CASE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(RUNNING_ON_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("valid host line pattern")
});

/// Determines which machine executed a build.
pub trait HostIdentifier: Send + Sync {
    /// Whether `identify` needs the console log; callers skip fetching it otherwise.
    fn needs_console_log(&self) -> bool {
        true
    }

    fn identify(&self, build: &BuildRecord, console_log: &str) -> Result<String>;
}

/// Finds the first "Running on <host>" line in the console log.
#[derive(Debug, Clone, Copy)]
pub struct LogHostIdentifier {
    case_sensitive: bool,
}

impl LogHostIdentifier {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    pub fn find_host(&self, console_log: &str) -> Result<String> {
        let re = if self.case_sensitive {
            &*RUNNING_ON
        } else {
            &*RUNNING_ON_ANY_CASE
        };
        re.captures(console_log)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches(['.', '-']).to_string())
            .ok_or_else(|| {
                CorrelationError::not_found(
                    "build host",
                    "\"Running on <nodeName>\" line not found in build log",
                )
            })
    }
}

impl Default for LogHostIdentifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HostIdentifier for LogHostIdentifier {
    fn identify(&self, _build: &BuildRecord, console_log: &str) -> Result<String> {
        self.find_host(console_log)
    }
}

/// Uses the agent name the CI service reports in build metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltOnHostIdentifier;

impl HostIdentifier for BuiltOnHostIdentifier {
    fn needs_console_log(&self) -> bool {
        false
    }

    fn identify(&self, build: &BuildRecord, _console_log: &str) -> Result<String> {
        build
            .built_on
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                CorrelationError::not_found(
                    "build host",
                    format!("build #{} reports no agent in its metadata", build.build_id),
                )
            })
    }
}

/// Strategy for locating the build host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostSource {
    /// Scrape the console log.
    #[default]
    Log,
    /// Use the build's `builtOn` metadata.
    Metadata,
}

impl HostSource {
    pub fn identifier(self, case_sensitive: bool) -> Box<dyn HostIdentifier> {
        match self {
            HostSource::Log => Box::new(LogHostIdentifier::new(case_sensitive)),
            HostSource::Metadata => Box::new(BuiltOnHostIdentifier),
        }
    }
}
