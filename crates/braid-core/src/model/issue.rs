//! Issue model: the immutable input view the engine analyzes.
//!
//! The engine never loads issues itself — an external loader assembles a
//! `Vec<Issue>` (possibly merged from several repositories) and hands it
//! over. Everything here is plain data with stable snake_case string
//! encodings so the analytic outputs round-trip through JSON unchanged.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an issue.
///
/// `Tombstone` issues exist in the input but are excluded from the graph,
/// from triage, and from every correlation result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Blocked,
    Closed,
    Deferred,
    Pinned,
    Tombstone,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
            Self::Deferred => "deferred",
            Self::Pinned => "pinned",
            Self::Tombstone => "tombstone",
        }
    }

    /// Closed means `closed` only; tombstone is excluded, not closed.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn is_tombstone(self) -> bool {
        matches!(self, Self::Tombstone)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "closed" => Ok(Self::Closed),
            "deferred" => Ok(Self::Deferred),
            "pinned" => Ok(Self::Pinned),
            "tombstone" => Ok(Self::Tombstone),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Kind of work an issue represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Task,
    Bug,
    Feature,
    Epic,
    Question,
    Docs,
}

impl IssueType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Epic => "epic",
            Self::Question => "question",
            Self::Docs => "docs",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed dependency relation. Only `Blocks` participates in structural
/// analysis; the others are retained for display but ignored by the
/// graph kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepType {
    Blocks,
    Related,
    ParentChild,
    DiscoveredFrom,
}

impl DepType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Related => "related",
            Self::ParentChild => "parent_child",
            Self::DiscoveredFrom => "discovered_from",
        }
    }
}

/// A directed relation: `issue_id` depends on `depends_on_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub issue_id: String,
    pub depends_on_id: String,
    #[serde(rename = "type")]
    pub dep_type: DepType,
}

/// A comment attached to an issue. Not consumed by the core analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One issue as assembled by the external loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    /// 0 is most urgent, 4 least. Values outside 0..=4 normalize to 0.5
    /// in scoring.
    pub priority: u8,
    pub issue_type: IssueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Estimated effort in minutes, when the tracker records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    /// Source repo tag for multi-repo assemblies; empty for single-repo.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_repo: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Issue {
    /// Minimal constructor used heavily in tests: open task, priority 2,
    /// epoch timestamps.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: Status::Open,
            priority: 2,
            issue_type: IssueType::Task,
            assignee: None,
            labels: Vec::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            closed_at: None,
            estimate_minutes: None,
            due_date: None,
            external_ref: None,
            source_repo: String::new(),
            dependencies: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Blocking dependency targets, in declaration order.
    pub fn blocking_deps(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| d.dep_type == DepType::Blocks)
            .map(|d| d.depends_on_id.as_str())
    }
}

/// Validate a raw issue collection.
///
/// Drops issues with an empty id or a duplicate id and strips self-loop
/// dependencies, appending one warning per drop. Dangling dependency
/// targets are left in place — the graph builder skips them silently.
/// Never fails: invalid input degrades, it does not abort.
#[must_use]
pub fn validate_issues(issues: Vec<Issue>) -> (Vec<Issue>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut valid = Vec::with_capacity(issues.len());

    for mut issue in issues {
        if issue.id.is_empty() {
            warnings.push(format!("dropped issue with empty id (title: {:?})", issue.title));
            continue;
        }
        if !seen.insert(issue.id.clone()) {
            warnings.push(format!("dropped duplicate issue id {}", issue.id));
            continue;
        }

        let before = issue.dependencies.len();
        issue.dependencies.retain(|d| d.depends_on_id != d.issue_id);
        if issue.dependencies.len() < before {
            warnings.push(format!("dropped self-loop dependency on {}", issue.id));
        }

        valid.push(issue);
    }

    (valid, warnings)
}
