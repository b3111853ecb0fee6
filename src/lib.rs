pub mod audit;
pub mod config;
pub mod error;
pub mod error_translation;
pub mod gerrit;
pub mod git;
pub mod status;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, ErrorKind, GitError, GitResult};
pub use gerrit::{Ref, RevisionSession};
pub use git::{ConflictState, GitFacade, GitVersion, ProcessRunner};
pub use status::FileStatusAggregator;
