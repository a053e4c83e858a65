//! External process execution.
//!
//! Commands are explicit argument vectors; nothing goes through a shell.
//! [`SystemRunner`] inherits stdio so toolchain output reaches the user
//! unmodified. Invocations block until the child exits: there is no timeout,
//! so callers that need bounded latency must run the tool under a watchdog.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    /// Working directory; inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Arguments as (lossy) UTF-8 strings.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following `flag` in the argument list, if any.
    pub fn flag_value(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }
}

/// Renders the invocation as a copy-pasteable shell command line.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Quote `s` for POSIX sh if it contains anything outside a safe set.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@%".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code; `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub const SUCCESS: ProcessExit = ProcessExit { code: Some(0) };

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands to completion.
pub trait ToolRunner {
    /// Run `invocation` and wait for it. Spawn failures are `Err`; a process
    /// that ran and failed is `Ok` with a non-zero exit.
    fn run(&mut self, invocation: &Invocation) -> io::Result<ProcessExit>;
}

/// Runs commands as real child processes with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<ProcessExit> {
        debug!(command = %invocation, cwd = ?invocation.cwd, "spawning");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(ref dir) = invocation.cwd {
            command.current_dir(dir);
        }
        let status = command.status()?;
        debug!(program = %invocation.program, code = ?status.code(), "exited");
        Ok(ProcessExit {
            code: status.code(),
        })
    }
}
