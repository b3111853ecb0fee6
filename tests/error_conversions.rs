use gerrit_flow::config::ConfigError;
use gerrit_flow::error::{AppError, AppResult, ErrorKind, GitError};
use gerrit_flow::gerrit::GerritError;
use gerrit_flow::git::ConflictState;
use std::error::Error;

fn command_failed(stderr: &str) -> GitError {
    GitError::CommandFailed {
        command: "cherry-pick FETCH_HEAD --".to_string(),
        exit_code: 1,
        stderr: stderr.to_string(),
        reason: stderr.to_string(),
    }
}

/// Test that GitError converts to AppError::Git
#[test]
fn test_git_error_converts_to_app_error() {
    let app_err: AppError = GitError::NotARepository.into();
    assert!(matches!(app_err, AppError::Git(_)));
}

/// Test that ConfigError converts to AppError::Config
#[test]
fn test_config_error_converts_to_app_error() {
    let app_err: AppError = ConfigError::DirectoryNotFound.into();
    assert!(matches!(app_err, AppError::Config(_)));
    assert_eq!(app_err.kind(), ErrorKind::Config);
}

/// Test that GerritError converts to AppError::Gerrit
#[test]
fn test_gerrit_error_converts_to_app_error() {
    let app_err: AppError = GerritError::HostNotConfigured.into();
    assert!(matches!(app_err, AppError::Gerrit(_)));
    assert_eq!(app_err.kind(), ErrorKind::Network);
}

/// Test that std::io::Error converts to AppError::Io
#[test]
fn test_io_error_converts_to_app_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
    let app_err: AppError = io_err.into();
    assert!(matches!(app_err, AppError::Io(_)));
}

/// Test that error source is preserved
#[test]
fn test_error_source_preserved() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
    let app_err: AppError = GitError::IoError(io_err).into();

    assert!(app_err.source().is_some());
}

/// Conflict errors keep the failed git invocation as their source
#[test]
fn test_conflict_source_is_git_failure() {
    let app_err = AppError::Conflict {
        message: "Resolve conflicts in cherry-pick, then continue".to_string(),
        source: command_failed("error: could not apply 1234abc"),
    };

    assert_eq!(app_err.to_string(), "Resolve conflicts in cherry-pick, then continue");
    let source = app_err.source().expect("conflict has a source");
    assert!(source.to_string().contains("could not apply"));
    assert_eq!(app_err.kind(), ErrorKind::Git);
}

#[test]
fn test_busy_display() {
    let app_err = AppError::Busy { operation: "rebase" };
    assert_eq!(
        app_err.to_string(),
        "Cannot run rebase: another operation is still in progress"
    );
    assert_eq!(app_err.kind(), ErrorKind::Busy);
}

#[test]
fn test_conflict_pending_display() {
    let err = GitError::ConflictPending {
        pending: ConflictState::Rebase,
        requested: "cherry-pick",
    };
    assert_eq!(
        err.to_string(),
        "Cannot start cherry-pick while a rebase is waiting for conflict resolution"
    );
}

/// Test AppError::Git variant displays correctly
#[test]
fn test_app_error_git_display() {
    let app_err = AppError::Git(command_failed("fatal: bad revision"));
    let msg = format!("{}", app_err);
    assert!(msg.contains("Git error"));
    assert!(msg.contains("fatal: bad revision"));
}

/// Test that ? operator works with AppError
#[test]
fn test_question_mark_operator() {
    fn may_fail() -> Result<(), GitError> {
        Err(GitError::NotARepository)
    }

    fn outer() -> AppResult<()> {
        may_fail()?;
        Ok(())
    }

    assert!(matches!(outer().unwrap_err(), AppError::Git(_)));
}

#[test]
fn test_error_kinds() {
    let cases: Vec<(AppError, ErrorKind)> = vec![
        (GitError::Validation("Requires a message to commit with".into()).into(), ErrorKind::Validation),
        (command_failed("CONFLICT").into(), ErrorKind::Git),
        (GitError::EmptyLog.into(), ErrorKind::Git),
        (GitError::ParseError("Unrecognized staged status code: Z".into()).into(), ErrorKind::Parse),
        (GerritError::InvalidResponse("empty".into()).into(), ErrorKind::Parse),
        (
            GerritError::ApiError { status: 500, body: "boom".into() }.into(),
            ErrorKind::Network,
        ),
        (AppError::Busy { operation: "push" }, ErrorKind::Busy),
    ];

    for (err, kind) in cases {
        assert_eq!(err.kind(), kind, "{}", err);
    }
}
