//! Format and validation configuration
//!
//! Both values are built once (usually at program start) and handed to the
//! [`Decoder`](crate::Decoder), [`Encoder`](crate::Encoder) and
//! [`Validator`](crate::Validator) that need them.

use crate::diagnostic::Severity;

/// Line terminator written by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    #[cfg_attr(feature = "cli", value(name = "crlf"))]
    CrLf,
    /// `\r`
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }

    /// Parse `lf`, `crlf` or `cr` (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "lf" => Some(LineEnding::Lf),
            "crlf" => Some(LineEnding::CrLf),
            "cr" => Some(LineEnding::Cr),
            _ => None,
        }
    }
}

/// What the decoder does with a lone text line that is neither a marker nor a
/// field and has no active key to continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BareNamePolicy {
    /// Treat the line as the name of an implicit section holding the fields
    /// that follow it
    #[default]
    ImplicitSection,
    /// Drop the line (it is still reported)
    Ignore,
}

/// Configuration shared by the decoder and encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Line terminator used for encoded output
    pub line_ending: LineEnding,
    /// Handling of bare section-name lines while decoding
    pub bare_names: BareNamePolicy,
    /// Whether encoded output ends with a line terminator
    pub trailing_newline: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            bare_names: BareNamePolicy::ImplicitSection,
            trailing_newline: true,
        }
    }
}

impl FormatConfig {
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_bare_names(mut self, policy: BareNamePolicy) -> Self {
        self.bare_names = policy;
        self
    }

    pub fn with_trailing_newline(mut self, trailing_newline: bool) -> Self {
        self.trailing_newline = trailing_newline;
        self
    }
}

/// How strictly a validation rule is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReferencePolicy {
    /// Report violations as errors
    Error,
    /// Report violations as warnings
    #[default]
    Warn,
    /// Skip the rule entirely
    Ignore,
}

impl ReferencePolicy {
    /// Severity of a finding under this policy, `None` when the rule is off
    pub fn severity(self) -> Option<Severity> {
        match self {
            ReferencePolicy::Error => Some(Severity::Error),
            ReferencePolicy::Warn => Some(Severity::Warning),
            ReferencePolicy::Ignore => None,
        }
    }
}

/// Fields that hold non-negative integer identifiers in message board archives
pub const DEFAULT_NUMERIC_FIELDS: &[&str] = &["Entry", "Thread", "Post", "AuthorID", "EditAuthorID"];

/// Configuration for [`Validator`](crate::Validator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Unresolved category `InSub` references
    pub insub: ReferencePolicy,
    /// Field names whose values must be non-negative integers
    pub numeric_fields: Vec<String>,
    /// Non-numeric values in `numeric_fields`
    pub numeric: ReferencePolicy,
    /// Repeated `Post` numbers within one message thread
    pub duplicate_posts: ReferencePolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            insub: ReferencePolicy::Warn,
            numeric_fields: DEFAULT_NUMERIC_FIELDS.iter().map(|s| s.to_string()).collect(),
            numeric: ReferencePolicy::Warn,
            duplicate_posts: ReferencePolicy::Warn,
        }
    }
}

impl ValidationConfig {
    pub fn with_insub(mut self, policy: ReferencePolicy) -> Self {
        self.insub = policy;
        self
    }

    pub fn with_numeric(mut self, policy: ReferencePolicy) -> Self {
        self.numeric = policy;
        self
    }

    pub fn with_duplicate_posts(mut self, policy: ReferencePolicy) -> Self {
        self.duplicate_posts = policy;
        self
    }

    pub fn with_numeric_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}
