//! Subprocess launch
//!
//! Runs the final Detect command, streams its output to the build console
//! line by line and reports the exit code.

use super::traits::AbortHandle;
use crate::pipeline::DetectError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, BufRead, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A process to launch on an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Program followed by its arguments
    pub command: Vec<String>,

    /// Complete environment of the process
    pub env: HashMap<String, String>,

    /// Working directory
    pub cwd: PathBuf,
}

impl LaunchRequest {
    /// Creates a launch request
    #[must_use]
    pub fn new(
        command: Vec<String>,
        env: HashMap<String, String>,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command,
            env,
            cwd: cwd.into(),
        }
    }
}

/// Build console that collects process output
///
/// Lines are echoed to stdout and kept so the caller can inspect them.
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    lines: Arc<Mutex<Vec<String>>>,
    echo: bool,
}

impl ConsoleLog {
    /// Creates a console that echoes to stdout
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            echo: true,
        }
    }

    /// Creates a console that only records
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    /// Writes a line to the console
    pub fn println(&self, line: &str) {
        if self.echo {
            println!("{line}");
        }
        self.lines.lock().push(line.to_string());
    }

    /// All lines written so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Launches a process and waits for it, streaming output to `console`
///
/// The process sees exactly `request.env`, nothing is inherited. Returns
/// the exit code, or `-1` if the process was terminated by a signal.
///
/// # Errors
///
/// - [`DetectError::EmptyCommand`] if there is nothing to run
/// - [`DetectError::Launch`] if the process cannot be started
/// - [`DetectError::Interrupted`] if `abort` is tripped while it runs; the
///   process is killed
pub fn launch_process(
    request: &LaunchRequest,
    console: &ConsoleLog,
    abort: &AbortHandle,
) -> Result<i32, DetectError> {
    let (program, args) = request
        .command
        .split_first()
        .ok_or(DetectError::EmptyCommand)?;

    if abort.is_aborted() {
        return Err(DetectError::Interrupted);
    }

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.current_dir(&request.cwd);
    cmd.env_clear();
    cmd.envs(&request.env);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!(
        program = %program,
        args = args.len(),
        cwd = %request.cwd.display(),
        "Launching process"
    );

    let mut child = cmd.spawn().map_err(|e| DetectError::Launch {
        program: program.clone(),
        reason: e.to_string(),
    })?;

    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(stream_lines(stdout, console.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(stream_lines(stderr, console.clone()));
    }

    let status = loop {
        if abort.is_aborted() {
            tracing::warn!(program = %program, "Abort requested, killing process");
            terminate(&mut child, readers);
            return Err(DetectError::Interrupted);
        }

        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                tracing::error!(program = %program, error = %e, "Cannot poll process, killing it");
                terminate(&mut child, readers);
                return Err(e.into());
            }
        }
    };

    join_readers(readers);

    let exit_code = status.code().unwrap_or(-1);
    tracing::debug!(program = %program, exit_code, "Process finished");
    Ok(exit_code)
}

/// Kills and reaps `child`
fn terminate(child: &mut Child, readers: Vec<JoinHandle<()>>) {
    let _ = child.kill();
    let _ = child.wait();
    // Grandchildren may still hold the pipes open, so readers are left detached.
    drop(readers);
}

fn stream_lines<R: Read + Send + 'static>(source: R, console: ConsoleLog) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let reader = io::BufReader::new(source);
        for line in reader.lines().map_while(Result::ok) {
            console.println(&line);
        }
    })
}

fn join_readers(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        let _ = reader.join();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn path_env() -> HashMap<String, String> {
        std::env::var("PATH")
            .map(|path| HashMap::from([("PATH".to_string(), path)]))
            .unwrap_or_default()
    }

    #[test]
    fn test_launch_returns_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let console = ConsoleLog::quiet();
        let request =
            LaunchRequest::new(sh("echo scanning; exit 3"), HashMap::new(), temp_dir.path());

        let code = launch_process(&request, &console, &AbortHandle::new()).unwrap();

        assert_eq!(code, 3);
        assert_eq!(console.lines(), vec!["scanning".to_string()]);
    }

    #[test]
    fn test_launch_streams_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let console = ConsoleLog::quiet();
        let request = LaunchRequest::new(sh("echo oops >&2"), HashMap::new(), temp_dir.path());

        let code = launch_process(&request, &console, &AbortHandle::new()).unwrap();

        assert_eq!(code, 0);
        assert_eq!(console.lines(), vec!["oops".to_string()]);
    }

    #[test]
    fn test_launch_uses_only_request_env() {
        // Variables a shell may define on its own
        const SHELL_MANAGED: &[&str] = &[
            "PATH", "PWD", "OLDPWD", "SHLVL", "HOME", "IFS", "PPID", "OPTIND", "HOSTNAME",
            "HOSTTYPE", "MACHTYPE", "OSTYPE", "UID", "EUID", "GROUPS", "COLUMNS", "LINES",
            "MAILCHECK", "TERM", "SHELL", "SHELLOPTS", "OPTERR",
        ];
        let inherited = std::env::vars().map(|(k, _)| k).find(|k| {
            !SHELL_MANAGED.contains(&k.as_str())
                && !k.starts_with("BASH")
                && k.starts_with(|c: char| c.is_ascii_uppercase())
                && k.chars().all(|c| c.is_ascii_uppercase() || c == '_')
        });

        let temp_dir = TempDir::new().unwrap();
        let console = ConsoleLog::quiet();
        let mut env = path_env();
        env.insert("BLACKDUCK_URL".to_string(), "https://bd".to_string());
        let probe = inherited.as_deref().unwrap_or("DETECT_RUNNER_PROBE");
        let request = LaunchRequest::new(
            sh(&format!("echo \"$BLACKDUCK_URL|${{{probe}:-unset}}\"")),
            env,
            temp_dir.path(),
        );

        launch_process(&request, &console, &AbortHandle::new()).unwrap();

        assert_eq!(console.lines(), vec!["https://bd|unset".to_string()]);
    }

    #[test]
    fn test_signal_killed_process_reports_minus_one() {
        let temp_dir = TempDir::new().unwrap();
        let request = LaunchRequest::new(sh("kill -9 $$"), HashMap::new(), temp_dir.path());

        let code = launch_process(&request, &ConsoleLog::quiet(), &AbortHandle::new()).unwrap();

        assert_eq!(code, -1);
    }

    #[test]
    fn test_terminate_reaps_running_child() {
        let mut child = Command::new("/bin/sh")
            .args(["-c", "exec sleep 30"])
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let reader = stream_lines(child.stdout.take().unwrap(), ConsoleLog::quiet());

        terminate(&mut child, vec![reader]);

        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_launch_runs_in_cwd() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "here").unwrap();
        let console = ConsoleLog::quiet();
        let request = LaunchRequest::new(sh("cat marker.txt"), path_env(), temp_dir.path());

        launch_process(&request, &console, &AbortHandle::new()).unwrap();

        assert_eq!(console.lines(), vec!["here".to_string()]);
    }

    #[test]
    fn test_empty_command() {
        let request = LaunchRequest::new(Vec::new(), HashMap::new(), "/");
        let err = launch_process(&request, &ConsoleLog::quiet(), &AbortHandle::new()).unwrap_err();
        assert_eq!(err, DetectError::EmptyCommand);
    }

    #[test]
    fn test_missing_program() {
        let temp_dir = TempDir::new().unwrap();
        let request = LaunchRequest::new(
            vec!["/definitely/not/a/program".to_string()],
            HashMap::new(),
            temp_dir.path(),
        );
        let err = launch_process(&request, &ConsoleLog::quiet(), &AbortHandle::new()).unwrap_err();
        assert!(matches!(err, DetectError::Launch { .. }));
    }

    #[test]
    fn test_abort_kills_process() {
        let temp_dir = TempDir::new().unwrap();
        let abort = AbortHandle::new();
        let request = LaunchRequest::new(sh("exec sleep 30"), path_env(), temp_dir.path());

        let trigger = abort.clone();
        let killer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            trigger.abort();
        });

        let start = std::time::Instant::now();
        let err = launch_process(&request, &ConsoleLog::quiet(), &abort).unwrap_err();
        killer.join().unwrap();

        assert_eq!(err, DetectError::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_already_aborted_does_not_launch() {
        let abort = AbortHandle::new();
        abort.abort();
        let request = LaunchRequest::new(sh("exit 0"), HashMap::new(), "/");
        let err = launch_process(&request, &ConsoleLog::quiet(), &abort).unwrap_err();
        assert_eq!(err, DetectError::Interrupted);
    }
}
