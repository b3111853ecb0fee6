pub mod executor;
pub mod parser;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use executor::{CommandResult, CommandRunner, ProcessError, ProcessRunner, SPAWN_FAILURE_EXIT_CODE};
pub use parser::{
    Author, CommitLog, FileEntry, FileStatus, StagedKind, parse_file_list, parse_log_entry,
    parse_staged_status,
};
pub use repository::{ConflictState, DEFAULT_REMOTE, GitFacade, default_runner, discover_root};
pub use version::GitVersion;
