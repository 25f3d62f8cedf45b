pub mod build;
pub mod cycles;

pub use build::IssueGraph;
pub use cycles::{find_cycles, has_cycles};
