use std::str::FromStr;

/// What the scheduler does once a step reports failure.
///
/// - `FailFast`: stop dispatching new steps as soon as a failure is observed.
///   Steps that are already running are allowed to finish; everything that
///   never started is reported as skipped (default behaviour).
/// - `KeepGoing`: only the transitive successors of the failed step are
///   skipped. Independent branches of the pipeline keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    FailFast,
    KeepGoing,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::FailFast
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "fail-fast" => Ok(FailurePolicy::FailFast),
            "keep-going" => Ok(FailurePolicy::KeepGoing),
            other => Err(format!(
                "invalid failure policy: {other} (expected \"fail-fast\" or \"keep-going\")"
            )),
        }
    }
}

/// Serialization format of a pipeline document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Pick a format from a file extension. Anything that is not `.toml`
    /// is read as YAML, which is the native pipeline format.
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext.map(|e| e.to_ascii_lowercase()) {
            Some(e) if e == "toml" => DocumentFormat::Toml,
            _ => DocumentFormat::Yaml,
        }
    }
}
