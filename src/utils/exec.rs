//! External command execution utilities.
//!
//! Runs build tools (the search indexer) with inherited stdout and a bounded
//! wait, so a hung tool surfaces as an error instead of a hang. Stderr is
//! forwarded line by line and its tail is kept for error reports.

use anyhow::{Context, Result};
use std::{
    collections::VecDeque,
    ffi::OsString,
    io::{BufRead, BufReader, Read},
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

/// Interval between `try_wait` polls while a child is running.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Number of trailing stderr lines kept in [`Finished::stderr`].
const STDERR_TAIL: usize = 20;

/// How long to wait for the last stderr lines of a killed command.
const KILL_GRACE: Duration = Duration::from_millis(200);

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with inherited stdio and a deadline.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(timeout; ["pagefind"]; "--site", output)?;
///
/// // With working directory
/// exec!(timeout; root; &config.build.search.command; output)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($timeout:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::exec::exec(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $timeout,
        )
    }};
    ($timeout:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::exec::exec(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $timeout,
        )
    }};
}

// ============================================================================
// Argument Conversion
// ============================================================================

#[doc(hidden)]
pub mod internal {
    use std::ffi::OsString;

    /// Convert to `OsString`.
    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    /// Trait for converting to command vector.
    pub trait ToCmd {
        fn to_cmd(self) -> Vec<OsString>;
    }

    impl<const N: usize> ToCmd for [&str; N] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.into_iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &[String] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &Vec<String> {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    /// Convert command to `Vec<OsString>`.
    #[inline]
    pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
        cmd.to_cmd()
    }

    /// Filter out empty args.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// How a bounded command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The process exited on its own.
    Exited(ExitStatus),
    /// The deadline passed; the process was killed and reaped.
    TimedOut,
}

/// Result of a finished command run.
#[derive(Debug, Clone)]
pub struct Finished {
    /// Program name (first element of the command vector)
    pub name: String,
    pub outcome: Outcome,
    pub elapsed: Duration,
    /// Last lines the process wrote to stderr
    pub stderr: String,
}

/// Spawn a command and block until it exits or `timeout` elapses.
///
/// The command runs in its own process group on Unix. On timeout the whole
/// group is killed, and processes left behind after the command exits are
/// killed once the deadline passes if they still hold its stderr.
///
/// # Errors
/// Returns error only if the command cannot be spawned or waited on; a
/// non-zero exit or a timeout is reported through [`Outcome`].
pub fn exec(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    timeout: Duration,
) -> Result<Finished> {
    let (name, mut command) = prepare(root, cmd, args)?;

    command
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped());
    own_process_group(&mut command);

    let started = Instant::now();
    let deadline = started + timeout;
    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    let (sender, lines) = mpsc::channel();
    match child.stderr.take() {
        Some(stderr) => {
            thread::spawn(move || forward_stderr(stderr, &sender));
        }
        None => drop(sender),
    }

    let outcome = wait_with_deadline(&mut child, deadline)
        .with_context(|| format!("`{name}` process failed"))?;

    let tail = match outcome {
        Outcome::Exited(_) => collect_tail(&lines, deadline),
        Outcome::TimedOut => collect_tail(&lines, Instant::now() + KILL_GRACE),
    };
    if !tail.closed {
        kill_group(&mut child);
    }

    Ok(Finished {
        name,
        outcome,
        elapsed: started.elapsed(),
        stderr: tail.text,
    })
}

/// Echo a child's stderr to ours and pass every line on.
fn forward_stderr(stderr: impl Read, sender: &Sender<String>) {
    for line in BufReader::new(stderr).lines().map_while(|line| line.ok()) {
        eprintln!("{line}");
        if sender.send(line).is_err() {
            break;
        }
    }
}

/// Last stderr lines received before the pipe closed or the deadline passed.
struct Tail {
    text: String,
    /// Every writer of the pipe has exited
    closed: bool,
}

/// Keep the last [`STDERR_TAIL`] lines received before `deadline`.
fn collect_tail(lines: &Receiver<String>, deadline: Instant) -> Tail {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL);
    let closed = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match lines.recv_timeout(remaining) {
            Ok(line) => {
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Err(RecvTimeoutError::Disconnected) => break true,
            Err(RecvTimeoutError::Timeout) => break false,
        }
    };
    Tail {
        text: Vec::from(tail).join("\n"),
        closed,
    }
}

/// Poll a child until it exits or the deadline passes.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> std::io::Result<Outcome> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Outcome::Exited(status));
        }

        let now = Instant::now();
        if now >= deadline {
            kill_group(child);
            child.wait()?;
            return Ok(Outcome::TimedOut);
        }

        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

/// Kill the child and everything else in its process group.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let _ = Command::new("kill")
            .args(["-s", "KILL", "--"])
            .arg(format!("-{}", child.id()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    // The child may exit between `try_wait` and `kill`
    let _ = child.kill();
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Tests
// ============================================================================
