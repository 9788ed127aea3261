//! Running `gapit dump` and parsing its standard output.

use std::ffi::OsString;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::call::CallRecord;
use crate::error::TraceReadError;
use crate::reader::TraceReader;

/// Program used when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "gapit";

/// Environment variable overriding the dump program.
pub const PROGRAM_ENV: &str = "GAPIT_BIN";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpCommand {
    program: OsString,
    trace: PathBuf,
}

impl DumpCommand {
    pub fn new(trace: impl Into<PathBuf>) -> Self {
        Self {
            program: DEFAULT_PROGRAM.into(),
            trace: trace.into(),
        }
    }

    /// Like [`DumpCommand::new`], but honours `GAPIT_BIN` when it is set and non-empty.
    pub fn from_env(trace: impl Into<PathBuf>) -> Self {
        let cmd = Self::new(trace);
        match std::env::var_os(PROGRAM_ENV) {
            Some(program) if !program.is_empty() => cmd.program(program),
            _ => cmd,
        }
    }

    pub fn program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    pub fn trace(&self) -> &Path {
        &self.trace
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("dump")
            .arg("-observations")
            .arg(&self.trace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        cmd
    }

    pub fn spawn(&self) -> Result<DumpProcess, TraceReadError> {
        let program = self.program_name();
        tracing::debug!(%program, trace = %self.trace.display(), "starting trace dump");
        let mut child = self
            .command()
            .spawn()
            .map_err(|source| TraceReadError::Spawn {
                program: program.clone(),
                source,
            })?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TraceReadError::Spawn {
                program,
                source: std::io::Error::other("child stdout was not captured"),
            });
        };
        Ok(DumpProcess {
            program,
            child: Some(child),
            reader: TraceReader::new(BufReader::new(stdout)),
        })
    }
}

/// A running dump process, read as a stream of call records.
///
/// The exit status is not looked at while records are read. Dropping the process early kills
/// the child.
pub struct DumpProcess {
    program: String,
    child: Option<Child>,
    reader: TraceReader<BufReader<ChildStdout>>,
}

impl DumpProcess {
    /// Waits for the dump program and reports a non-zero exit.
    ///
    /// Records not yet read are discarded.
    pub fn finish(mut self) -> Result<(), TraceReadError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        // Drain stdout so the child is never blocked on a full pipe.
        for _ in self.reader.by_ref() {}
        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(TraceReadError::DumpFailed {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

impl Iterator for DumpProcess {
    type Item = Result<CallRecord, TraceReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next()
    }
}

impl Drop for DumpProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Starts `gapit dump -observations <trace>` (see [`DumpCommand::from_env`]).
pub fn parse_trace_file(trace: impl AsRef<Path>) -> Result<DumpProcess, TraceReadError> {
    DumpCommand::from_env(trace.as_ref()).spawn()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_dump_invocation() {
        let cmd = DumpCommand::new("capture.gfxtrace").program("/opt/gapit/gapit");
        let command = cmd.command();
        assert_eq!(command.get_program(), "/opt/gapit/gapit");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["dump", "-observations", "capture.gfxtrace"]);
        assert_eq!(cmd.trace(), Path::new("capture.gfxtrace"));
    }

    #[test]
    fn defaults_to_gapit() {
        assert_eq!(DumpCommand::new("t").program_name(), DEFAULT_PROGRAM);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = DumpCommand::new("t")
            .program("/nonexistent/gapit-for-tests")
            .spawn()
            .err()
            .unwrap();
        assert!(matches!(err, TraceReadError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/gapit-for-tests"));
    }
}
