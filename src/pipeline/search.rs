//! Post-build search indexing.
//!
//! Runs an external indexer (Pagefind by default) against the written
//! output directory. The build does not finish until the indexer exits, a
//! non-zero exit fails the build, and a hung indexer is killed once the
//! configured timeout passes.

use super::BuildContext;
use crate::{
    config::SearchConfig,
    exec, log,
    utils::exec::{Finished, Outcome},
};
use anyhow::Result;
use std::{path::Path, time::Duration};
use thiserror::Error;

/// Failures of the indexing hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// The indexer exited unsuccessfully.
    #[error("search indexer `{command}` failed ({}){}", describe_code(.code), describe_stderr(.stderr))]
    Failed {
        command: String,
        /// Exit code; `None` when terminated by a signal.
        code: Option<i32>,
        /// Tail of the indexer's stderr.
        stderr: String,
    },

    /// The indexer did not exit within the configured timeout.
    #[error("search indexer `{command}` did not finish within {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    match stderr.trim() {
        "" => String::new(),
        tail => format!(":\n{tail}"),
    }
}

/// Invokes `command... <output dir>` from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIndexHook {
    command: Vec<String>,
    timeout: Duration,
}

impl SearchIndexHook {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.command.clone(), config.timeout())
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        let build = &ctx.config.build;
        self.index(ctx.config.get_root(), &build.output)
    }

    /// Run the indexer over `output` and wait for it.
    ///
    /// # Errors
    /// [`HookError`] for a failed or timed-out indexer; spawn failures are
    /// reported as is.
    pub fn index(&self, root: &Path, output: &Path) -> Result<()> {
        log!("search"; "indexing {}", output.display());
        let finished = exec!(self.timeout; root; &self.command; output)?;
        self.check(finished)?;
        Ok(())
    }

    fn check(&self, finished: Finished) -> Result<(), HookError> {
        let command = self.command.join(" ");
        match finished.outcome {
            Outcome::Exited(status) if status.success() => {
                log!("search"; "done in {:.1}s", finished.elapsed.as_secs_f32());
                Ok(())
            }
            Outcome::Exited(status) => Err(HookError::Failed {
                command,
                code: status.code(),
                stderr: finished.stderr,
            }),
            Outcome::TimedOut => Err(HookError::Timeout {
                command,
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(command: &[&str], timeout: Duration) -> SearchIndexHook {
        SearchIndexHook::new(command.iter().map(|s| s.to_string()).collect(), timeout)
    }

    #[test]
    fn test_from_config() {
        let config = SearchConfig::default();
        let hook = SearchIndexHook::from_config(&config);
        assert_eq!(hook.command(), ["npx", "pagefind", "--site"]);
        assert_eq!(hook.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_error_messages() {
        let failed = HookError::Failed {
            command: "npx pagefind --site".into(),
            code: Some(1),
            stderr: "Error: no html files\n".into(),
        };
        assert_eq!(
            failed.to_string(),
            "search indexer `npx pagefind --site` failed (exit code 1):\nError: no html files"
        );

        let timeout = HookError::Timeout {
            command: "pagefind".into(),
            timeout: Duration::from_secs(300),
        };
        assert_eq!(
            timeout.to_string(),
            "search indexer `pagefind` did not finish within 300s"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_index_passes_output_dir_as_last_argument() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dist");
        std::fs::create_dir_all(&output).unwrap();

        let hook = hook(&["sh", "-c", r#"touch "$0/indexed""#], Duration::from_secs(10));
        hook.index(dir.path(), &output).unwrap();
        assert!(output.join("indexed").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_index_nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let hook = hook(&["sh", "-c", "echo broken >&2; exit 1"], Duration::from_secs(10));

        let err = hook.index(dir.path(), dir.path()).unwrap_err();
        match err.downcast_ref::<HookError>() {
            Some(HookError::Failed { code, stderr, .. }) => {
                assert_eq!(*code, Some(1));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_index_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let hook = hook(&["sh", "-c", "sleep 5"], Duration::from_millis(200));

        let err = hook.index(dir.path(), dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HookError>(),
            Some(HookError::Timeout { .. })
        ));
    }

    #[test]
    fn test_index_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let hook = hook(&["devblog-no-such-indexer-xyz"], Duration::from_secs(1));
        let err = hook.index(dir.path(), dir.path()).unwrap_err();
        assert!(err.downcast_ref::<HookError>().is_none());
    }
}
