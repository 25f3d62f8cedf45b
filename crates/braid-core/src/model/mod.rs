pub mod commit;
pub mod issue;

pub use commit::{Commit, FileChange};
pub use issue::{
    validate_issues, Comment, DepType, Dependency, Issue, IssueType, Status,
};
