//! Ref lifecycle for release workflows.
//!
//! Tags mark released mapped versions; maintenance branches let an older
//! upstream line receive one more patch release after a newer line shipped.

mod manager;
mod operations;

pub use manager::{RefManager, RefNaming};
pub use operations::{CommitInfo, PullRequestInfo, RefOperations};
