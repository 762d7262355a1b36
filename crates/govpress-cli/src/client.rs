//! CLI error type, blocking-work bridge and local identity lookup.

use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;
use govpress_build::{BuildError, BuildResult, Principal, principal_for};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<BuildError> for CliError {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::Unauthorized { principal } => Self::Validation(format!(
                "'{principal}' may not trigger builds (run as root or add the account to operators)"
            )),
            BuildError::RunInProgress { lock } => Self::Validation(format!(
                "build already in progress (lock held on {})",
                lock.display()
            )),
            other => Self::Failure(other.into()),
        }
    }
}

/// Run builder work on the blocking pool; the HTTP client is synchronous.
pub(crate) async fn blocking<T, F>(work: F) -> CliResult<T>
where
    F: FnOnce() -> BuildResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| CliError::failure(anyhow!("background task failed: {err}")))?
        .map_err(CliError::from)
}

/// Principal for the account running the CLI.
pub(crate) fn current_principal(operators: &[String]) -> Principal {
    let (user, is_root) = current_user();
    principal_for(&user, is_root, operators)
}

#[cfg(unix)]
fn current_user() -> (String, bool) {
    use nix::unistd::{Uid, User};

    let uid = Uid::effective();
    let name = User::from_uid(uid)
        .ok()
        .flatten()
        .map_or_else(|| uid.to_string(), |user| user.name);
    (name, uid.is_root())
}

#[cfg(not(unix))]
fn current_user() -> (String, bool) {
    let name = std::env::var("USERNAME").unwrap_or_else(|_| "unknown".to_string());
    (name, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn exit_codes_split_validation_from_failure() {
        assert_eq!(CliError::validation("bad input").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
    }

    #[test]
    fn failure_message_includes_the_chain() {
        let err = CliError::failure(anyhow!("disk full").context("writing bundle"));
        assert_eq!(err.display_message(), "writing bundle: disk full");
    }

    #[test]
    fn admission_errors_are_validation() {
        let denied = CliError::from(BuildError::Unauthorized {
            principal: "intern".to_string(),
        });
        assert_eq!(denied.exit_code(), 2);
        assert!(denied.display_message().contains("intern"));

        let busy = CliError::from(BuildError::RunInProgress {
            lock: PathBuf::from("/tmp/govpress.lock"),
        });
        assert_eq!(busy.exit_code(), 2);

        let failed = CliError::from(BuildError::NoPackage);
        assert_eq!(failed.exit_code(), 3);
    }

    #[tokio::test]
    async fn blocking_propagates_build_errors() {
        let result: CliResult<()> = blocking(|| Err(BuildError::NoPackage)).await;
        assert!(matches!(result, Err(CliError::Failure(_))));

        let value = blocking(|| Ok(7)).await;
        assert!(matches!(value, Ok(7)));
    }

    #[test]
    fn listed_operator_may_manage_builds() {
        let (user, _) = current_user();
        let principal = current_principal(&[user]);
        assert!(principal.has(govpress_build::Capability::ManageBuilds));
    }
}
