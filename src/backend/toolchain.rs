//! Out-of-process toolchains for foreign-code blocks.
//!
//! A toolchain persists a block's source to the path it is given, runs it and
//! hands back the captured standard output. Children get a null stdin.
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` was not found")]
    NotFound { program: String },
    #[error("could not launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("compiling {} failed ({status}): {stderr}", path.display())]
    CompileFailed {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("`{program}` exited with {status}: {}", output.stderr)]
    NonZeroExit {
        program: String,
        status: ExitStatus,
        output: RunOutput,
    },
    #[error("`{program}` timed out after {}s", timeout.as_secs_f64())]
    TimedOut {
        program: String,
        timeout: Duration,
        output: RunOutput,
    },
}

impl ToolchainError {
    /// Whatever the program printed before it failed.
    pub fn captured_stdout(&self) -> &str {
        match self {
            ToolchainError::NonZeroExit { output, .. } => &output.stdout,
            ToolchainError::TimedOut { output, .. } => &output.stdout,
            _ => "",
        }
    }
}

pub trait Toolchain {
    fn run(&self, source: &str, source_path: &Path) -> Result<RunOutput, ToolchainError>;
}

///////////////////////////////////////////////////////////////////////////////
// HELPERS
///////////////////////////////////////////////////////////////////////////////

pub fn persist(source: &str, path: &Path) -> Result<(), ToolchainError> {
    let mut contents = source.to_owned();
    contents.push('\n');
    fs::write(path, contents).map_err(|source| ToolchainError::Write {
        path: path.to_owned(),
        source,
    })
}

pub fn resolve_program(program: &str) -> Result<PathBuf, ToolchainError> {
    which::which(program).map_err(|_| ToolchainError::NotFound {
        program: program.to_owned(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

/// Puts the child in its own process group so a timeout can take down any
/// processes it spawned; those would otherwise hold the output pipes open.
#[cfg(unix)]
fn isolate(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate(_: &mut Command) {}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // negative pid: the whole group
    unsafe {
        libc::kill(-(child.id() as libc::pid_t), libc::SIGKILL);
    }
    let _ = child.kill();
}

/// Descendants that outlive a timeout keep the pipes open until they exit.
#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn wait(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let timeout = match timeout {
        Some(x) => x,
        None => return child.wait().map(Some),
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_tree(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Runs `command` to completion, capturing both output streams. The child is
/// killed once `timeout` elapses.
pub fn run_captured(
    mut command: Command,
    program: &str,
    timeout: Option<Duration>,
) -> Result<(ExitStatus, RunOutput), ToolchainError> {
    let spawn_error = |source| ToolchainError::Spawn {
        program: program.to_owned(),
        source,
    };
    if timeout.is_some() {
        isolate(&mut command);
    }
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let status = wait(&mut child, timeout).map_err(spawn_error)?;
    let output = RunOutput {
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    };
    match status {
        Some(status) => Ok((status, output)),
        None => Err(ToolchainError::TimedOut {
            program: program.to_owned(),
            timeout: timeout.unwrap_or_default(),
            output,
        }),
    }
}

fn run_checked(
    command: Command,
    program: &str,
    timeout: Option<Duration>,
) -> Result<RunOutput, ToolchainError> {
    let (status, output) = run_captured(command, program, timeout)?;
    if status.success() {
        Ok(output)
    } else {
        Err(ToolchainError::NonZeroExit {
            program: program.to_owned(),
            status,
            output,
        })
    }
}

///////////////////////////////////////////////////////////////////////////////
// NATIVE
///////////////////////////////////////////////////////////////////////////////

/// Compiles the source with a C compiler, then runs the executable.
#[derive(Debug, Clone)]
pub struct NativeToolchain {
    pub compiler: String,
    pub timeout: Option<Duration>,
}

impl Default for NativeToolchain {
    fn default() -> Self {
        NativeToolchain {
            compiler: "gcc".to_owned(),
            timeout: None,
        }
    }
}

impl NativeToolchain {
    /// The executable sits beside its source, minus the extension.
    pub fn executable_path(source_path: &Path) -> PathBuf {
        source_path.with_extension(std::env::consts::EXE_EXTENSION)
    }
}

impl Toolchain for NativeToolchain {
    fn run(&self, source: &str, source_path: &Path) -> Result<RunOutput, ToolchainError> {
        persist(source, source_path)?;
        let compiler = resolve_program(&self.compiler)?;
        let executable = NativeToolchain::executable_path(source_path);
        let mut command = Command::new(&compiler);
        command.arg(source_path).arg("-o").arg(&executable);
        let (status, output) = run_captured(command, &self.compiler, self.timeout)?;
        if !status.success() {
            return Err(ToolchainError::CompileFailed {
                path: source_path.to_owned(),
                status,
                stderr: output.stderr,
            });
        }
        tracing::info!(
            "compiled {} to {}",
            source_path.display(),
            executable.display(),
        );
        let program = executable.display().to_string();
        run_checked(Command::new(&executable), &program, self.timeout)
    }
}

///////////////////////////////////////////////////////////////////////////////
// INTERPRETER
///////////////////////////////////////////////////////////////////////////////

/// Runs the source file with an interpreter, `python3 <file>` by default.
#[derive(Debug, Clone)]
pub struct InterpreterToolchain {
    pub interpreter: String,
    pub timeout: Option<Duration>,
}

impl Default for InterpreterToolchain {
    fn default() -> Self {
        InterpreterToolchain {
            interpreter: "python3".to_owned(),
            timeout: None,
        }
    }
}

impl Toolchain for InterpreterToolchain {
    fn run(&self, source: &str, source_path: &Path) -> Result<RunOutput, ToolchainError> {
        persist(source, source_path)?;
        let interpreter = resolve_program(&self.interpreter)?;
        tracing::info!("launching {} {}", self.interpreter, source_path.display());
        let mut command = Command::new(&interpreter);
        command.arg(source_path);
        run_checked(command, &self.interpreter, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn have(program: &str) -> bool {
        which::which(program).is_ok()
    }

    #[test]
    fn persist_appends_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.py");
        persist("print(1)", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "print(1)\n");
    }

    #[test]
    fn persist_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("a.py");
        let err = persist("x", &path).unwrap_err();
        assert!(matches!(err, ToolchainError::Write { .. }));
    }

    #[test]
    fn missing_interpreter_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = InterpreterToolchain {
            interpreter: "webthon-no-such-interpreter".to_owned(),
            timeout: None,
        };
        let err = toolchain.run("x", &dir.path().join("a.py")).unwrap_err();
        assert!(matches!(err, ToolchainError::NotFound { .. }));
    }

    #[test]
    fn executable_path_drops_extension() {
        let exe = NativeToolchain::executable_path(Path::new("c_code/page_c_1.c"));
        let expected = Path::new("c_code/page_c_1").with_extension(std::env::consts::EXE_EXTENSION);
        assert_eq!(exe, expected);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_exit_status() {
        if !have("sh") {
            return;
        }
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo out; echo err >&2; exit 3");
        let (status, output) = run_captured(command, "sh", None).unwrap();
        assert_eq!(status.code(), Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_the_child() {
        if !have("sh") {
            return;
        }
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo started; exec sleep 5");
        let started = Instant::now();
        let err = run_captured(command, "sh", Some(Duration::from_millis(200))).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(err, ToolchainError::TimedOut { .. }));
        assert_eq!(err.captured_stdout(), "started\n");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_spawned_descendants() {
        if !have("sh") || !have("sleep") {
            return;
        }
        let mut command = Command::new("sh");
        command.arg("-c").arg("sleep 5 & sleep 5; echo never");
        let started = Instant::now();
        let err = run_captured(command, "sh", Some(Duration::from_millis(200))).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(err, ToolchainError::TimedOut { .. }));
        assert_eq!(err.captured_stdout(), "");
    }

    #[test]
    fn python_prints() {
        if !have("python3") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let output = InterpreterToolchain::default()
            .run("print(1)", &dir.path().join("a.py"))
            .unwrap();
        assert_eq!(output.stdout, "1\n");
    }

    #[test]
    fn gcc_compiles_and_runs() {
        if !have("gcc") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let source = "#include <stdio.h>\nint main(void) { printf(\"%d\\n\", 1 < 2); return 0; }";
        let output = NativeToolchain::default()
            .run(source, &dir.path().join("a.c"))
            .unwrap();
        assert_eq!(output.stdout, "1\n");
    }

    #[test]
    fn gcc_reports_compile_errors() {
        if !have("gcc") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let err = NativeToolchain::default()
            .run("int main(void) { return }", &dir.path().join("bad.c"))
            .unwrap_err();
        assert!(matches!(err, ToolchainError::CompileFailed { .. }));
    }
}
