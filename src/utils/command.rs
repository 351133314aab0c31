use crate::{log, publish::Step};
use std::{
    ffi::{OsStr, OsString},
    fmt, io,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

/// Build an [`Invocation`]: `invocation!(step; cwd; program; args...)`.
///
/// Empty arguments are dropped, so optional flags can be passed as `""`.
#[macro_export]
macro_rules! invocation {
    ($step:expr; $root:expr; $program:expr; $($arg:expr),* $(,)?) => {{
        use $crate::utils::command::{Invocation, into_arg};
        use std::ffi::OsString;

        let args: Vec<OsString> = [$(into_arg($arg),)*].into_iter().filter(|a| !a.is_empty()).collect();
        Invocation::new($step, into_arg($program), args, $root)
    }};
}

pub fn into_arg<S>(arg: S) -> OsString
where
    S: Into<OsString>,
{
    arg.into()
}

/// One external process call made by the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub step: Step,
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub envs: Vec<(OsString, OsString)>,
}

impl Invocation {
    pub fn new(step: Step, program: OsString, args: Vec<OsString>, cwd: &Path) -> Self {
        Self { step, program, args, cwd: cwd.to_owned(), envs: Vec::new() }
    }

    pub fn env<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[cfg(test)]
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == OsStr::new(arg))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        write!(f, "  (in {})", self.cwd.display())
    }
}

/// Runs external processes for the publisher.
///
/// The returned `Output` is handed back untouched, exit status included:
/// deciding whether a step failed is the caller's job.
pub trait Runner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<Output>;
}

/// Spawns real processes and relays their output through the logger.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<Output> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .output()?;

        log_for_command(invocation.step.as_str(), &output);

        Ok(output)
    }
}

#[rustfmt::skip]
pub fn log_for_command(name: &str, output: &Output) {
    let (stdout, stderr) = (String::from_utf8_lossy(&output.stdout), String::from_utf8_lossy(&output.stderr));

    stdout.lines().filter(|s| !s.trim().is_empty()).for_each(|s| log!(name; "{}", s.trim_end()));
    stderr.lines().filter(|s| !s.trim().is_empty()).for_each(|s| log!(name; "{}", s.trim_end()));
}
