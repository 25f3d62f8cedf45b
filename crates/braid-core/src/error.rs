use std::fmt;

/// Machine-readable error codes for the fatal failure path.
///
/// Recoverable problems never reach this type — they are absorbed into
/// the envelope's warnings. A code here means the invocation produced
/// no coherent output at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    LoaderFailed,
    CommitStreamFailed,
    ConfigParseError,
    IssueNotFound,
    BaselineUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::LoaderFailed => "E1001",
            Self::CommitStreamFailed => "E1002",
            Self::ConfigParseError => "E1003",
            Self::IssueNotFound => "E2001",
            Self::BaselineUnavailable => "E2002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::LoaderFailed => "Issue loader returned no data",
            Self::CommitStreamFailed => "Commit stream failed before any data",
            Self::ConfigParseError => "Engine config parse error",
            Self::IssueNotFound => "Issue not found",
            Self::BaselineUnavailable => "Baseline requested but unavailable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::LoaderFailed => Some("Check that the tracker database exists and is readable."),
            Self::CommitStreamFailed => {
                Some("Verify the repository has history and the producer can read it.")
            }
            Self::ConfigParseError => Some("Fix the config syntax and retry."),
            Self::IssueNotFound => Some("Use a known issue identifier."),
            Self::BaselineUnavailable => Some("Save a baseline before requesting a comparison."),
            Self::InternalUnexpected => Some("Retry once; report a bug if persistent."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Structured fatal failure: kind, context, cause.
#[derive(Debug)]
pub struct EngineError {
    pub code: ErrorCode,
    pub context: String,
    pub cause: Option<anyhow::Error>,
}

impl EngineError {
    #[must_use]
    pub fn new(code: ErrorCode, context: impl Into<String>) -> Self {
        Self {
            code,
            context: context.into(),
            cause: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: anyhow::Error) -> Self {
        self.cause = Some(cause);
        self
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.code.message(), self.context)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(anyhow::Error::as_ref)
    }
}
