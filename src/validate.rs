//! Message board checks on top of the generic archive structure
//!
//! The decoder accepts any well-bracketed text. These checks look at what the
//! sections mean: category `InSub` references, numeric identifier fields and
//! post numbering inside a thread. Each rule's strictness comes from
//! [`ValidationConfig`].

use crate::archive::{Document, KeyPath, Section};
use crate::config::ValidationConfig;
use crate::diagnostic::Severity;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

pub const CATEGORY_SECTION: &str = "Category List";
pub const THREAD_SECTION: &str = "Message Thread";
pub const POST_SECTION: &str = "Message Post";

/// Kind of rule violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind {
    /// Category `InSub` names no category `ID` in the same container
    UnresolvedInSub { insub: String },
    /// Identifier field that is not a non-negative integer
    NotANonNegativeInteger { field: String, value: String },
    /// `Post` number already used earlier in the same thread
    DuplicatePost { post: String },
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::UnresolvedInSub { insub } => {
                write!(f, "InSub value '{}' does not match any category ID", insub)
            }
            FindingKind::NotANonNegativeInteger { field, value } => {
                write!(f, "Invalid non-negative integer '{}' for '{}'", value, field)
            }
            FindingKind::DuplicatePost { post } => {
                write!(f, "Duplicate 'Post' value '{}' in thread", post)
            }
        }
    }
}

/// A rule violation and where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: KeyPath,
    pub severity: Severity,
    pub kind: FindingKind,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.kind)
    }
}

/// Runs message board checks over a decoded document
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new() -> Self {
        Self::with_config(ValidationConfig::default())
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check a document, returning findings in document order
    pub fn validate(&self, document: &Document) -> Vec<Finding> {
        let mut findings = Vec::new();
        let lists: Vec<_> = document.iter().collect();
        self.check_container(&KeyPath::root(), &lists, &mut findings);
        debug!(findings = findings.len(), "validated archive");
        findings
    }

    /// Check the section lists held by one container (the document or a section)
    fn check_container(&self, path: &KeyPath, lists: &[(&str, &[Section])], findings: &mut Vec<Finding>) {
        if let Some(severity) = self.config.insub.severity() {
            let categories: Vec<&Section> = lists
                .iter()
                .filter(|&&(name, _)| name == CATEGORY_SECTION)
                .flat_map(|&(_, sections)| sections.iter())
                .collect();
            let ids: HashSet<&str> = categories
                .iter()
                .filter_map(|category| category.get_text("ID"))
                .map(str::trim)
                .collect();

            for (index, category) in categories.iter().enumerate() {
                let Some(insub) = category.get_text("InSub").map(str::trim) else {
                    continue;
                };
                if insub.is_empty() || insub == "0" || ids.contains(insub) {
                    continue;
                }
                findings.push(Finding {
                    path: path.section(CATEGORY_SECTION, index).field("InSub"),
                    severity,
                    kind: FindingKind::UnresolvedInSub {
                        insub: insub.to_string(),
                    },
                });
            }
        }

        for &(name, sections) in lists {
            for (index, section) in sections.iter().enumerate() {
                self.check_section(&path.section(name, index), name, section, findings);
            }
        }
    }

    fn check_section(&self, path: &KeyPath, name: &str, section: &Section, findings: &mut Vec<Finding>) {
        if let Some(severity) = self.config.numeric.severity() {
            for (key, value) in section.iter() {
                let Some(text) = value.as_text() else {
                    continue;
                };
                if !self.config.numeric_fields.iter().any(|field| field == key) {
                    continue;
                }
                if text.trim().parse::<u64>().is_err() {
                    findings.push(Finding {
                        path: path.field(key),
                        severity,
                        kind: FindingKind::NotANonNegativeInteger {
                            field: key.to_string(),
                            value: text.to_string(),
                        },
                    });
                }
            }
        }

        if name == THREAD_SECTION {
            self.check_posts(path, section, findings);
        }

        let lists: Vec<_> = section
            .iter()
            .filter_map(|(key, value)| value.as_sections().map(|sections| (key, sections)))
            .collect();
        self.check_container(path, &lists, findings);
    }

    fn check_posts(&self, path: &KeyPath, thread: &Section, findings: &mut Vec<Finding>) {
        let Some(severity) = self.config.duplicate_posts.severity() else {
            return;
        };
        let mut seen = HashSet::new();
        for (index, post) in thread.sections(POST_SECTION).iter().enumerate() {
            let Some(number) = post.get_text("Post").map(str::trim) else {
                continue;
            };
            if !seen.insert(number) {
                findings.push(Finding {
                    path: path.section(POST_SECTION, index).field("Post"),
                    severity,
                    kind: FindingKind::DuplicatePost {
                        post: number.to_string(),
                    },
                });
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// True when any finding is an error
pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferencePolicy;
    use crate::decoder::Decoder;

    const BOARD: &str = r#"--- Start Archive Service ---
Entry: 1
--- Start Category List ---
Kind: Categories, Category
ID: 1
InSub: 0
Headline: General
--- End Category List ---
--- Start Category List ---
Kind: Forums, Forum
ID: 2
InSub: 1
Headline: Main Chat
--- End Category List ---
--- Start Category List ---
Kind: Forums, SubForum
ID: 3
InSub: 9
Headline: Lost
--- End Category List ---
--- Start Message List ---
--- Start Message Thread ---
Thread: 1
--- Start Message Post ---
Post: 1
--- End Message Post ---
--- Start Message Post ---
Post: 1
--- End Message Post ---
--- Start Message Post ---
Post: two
--- End Message Post ---
--- End Message Thread ---
--- End Message List ---
--- End Archive Service ---"#;

    fn board() -> Document {
        Decoder::new().decode(BOARD).document
    }

    #[test]
    fn test_validate_default_policies() {
        let findings = Validator::new().validate(&board());
        let rendered: Vec<String> = findings.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "warning: Archive Service[0]/Category List[2]/InSub: InSub value '9' does not match any category ID",
                "warning: Archive Service[0]/Message List[0]/Message Thread[0]/Message Post[1]/Post: Duplicate 'Post' value '1' in thread",
                "warning: Archive Service[0]/Message List[0]/Message Thread[0]/Message Post[2]/Post: Invalid non-negative integer 'two' for 'Post'",
            ]
        );
        assert!(!has_errors(&findings));
    }

    #[test]
    fn test_validate_insub_as_error() {
        let config = ValidationConfig::default()
            .with_insub(ReferencePolicy::Error)
            .with_numeric(ReferencePolicy::Ignore)
            .with_duplicate_posts(ReferencePolicy::Ignore);
        let findings = Validator::with_config(config).validate(&board());

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(
            findings[0].kind,
            FindingKind::UnresolvedInSub { insub: "9".into() }
        );
        assert!(has_errors(&findings));
    }

    #[test]
    fn test_validate_all_rules_ignored() {
        let config = ValidationConfig::default()
            .with_insub(ReferencePolicy::Ignore)
            .with_numeric(ReferencePolicy::Ignore)
            .with_duplicate_posts(ReferencePolicy::Ignore);
        assert!(Validator::with_config(config).validate(&board()).is_empty());
    }

    #[test]
    fn test_validate_custom_numeric_fields() {
        let document = Decoder::new()
            .decode("--- Start User Info ---\nUser: -4\nEntry: x\n--- End User Info ---")
            .document;
        let config = ValidationConfig::default().with_numeric_fields(["User"]);
        let findings = Validator::with_config(config).validate(&document);

        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].kind,
            FindingKind::NotANonNegativeInteger {
                field: "User".into(),
                value: "-4".into(),
            }
        );
    }

    #[test]
    fn test_validate_top_level_categories() {
        let document = Decoder::new()
            .decode("--- Start Category List ---\nID: 5\nInSub: 5\n--- End Category List ---")
            .document;
        assert!(Validator::new().validate(&document).is_empty());
    }
}
