//! External process filter implementation.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use toml::Value;
use tracing::{debug, error, warn};

use super::{FilterArgs, FilterContext, TextFilter};
use crate::domain::{FilterError, FilterOutput};

/// How often a child is polled while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Command to run: a shell string or a direct argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCommand {
    /// Interpreted by the platform shell
    Shell(String),
    /// First element is the executable, the rest are arguments; no shell involved
    Argv(Vec<String>),
}

impl ProcessCommand {
    /// Short form for status messages: the shell string or the executable.
    pub fn short(&self) -> String {
        match self {
            ProcessCommand::Shell(s) => s.clone(),
            ProcessCommand::Argv(argv) => argv.first().cloned().unwrap_or_default(),
        }
    }

    /// Full command line for logs.
    pub fn long(&self) -> String {
        match self {
            ProcessCommand::Shell(s) => s.clone(),
            ProcessCommand::Argv(argv) => argv.join(" "),
        }
    }

    fn to_command(&self) -> Command {
        match self {
            ProcessCommand::Shell(script) => shell_command(script),
            ProcessCommand::Argv(argv) => {
                let mut cmd = Command::new(&argv[0]);
                cmd.args(&argv[1..]);
                cmd
            }
        }
    }
}

#[cfg(not(windows))]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

#[cfg(windows)]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(script);
    cmd
}

/// Filter that pipes text through an external command.
///
/// Each call spawns its own child: input is written to stdin as UTF-8,
/// stdout and stderr are drained concurrently, and stdout becomes the
/// result when the exit code is expected.
#[derive(Debug, Clone)]
pub struct ProcessFilter {
    command: ProcessCommand,
    /// Accepted exit codes; empty accepts any status
    expected_return_codes: Vec<i32>,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl ProcessFilter {
    pub const ID: &'static str = "process";
    const OPTIONS: &'static [&'static str] = &[
        "command",
        "shell",
        "expected_return_codes",
        "cwd",
        "env",
        "timeout_secs",
    ];

    /// Create a new ProcessFilter expecting exit code 0 and no timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the command is empty.
    pub fn new(command: ProcessCommand) -> Result<Self, FilterError> {
        let empty = match &command {
            ProcessCommand::Shell(s) => s.trim().is_empty(),
            ProcessCommand::Argv(argv) => argv.is_empty() || argv[0].is_empty(),
        };
        if empty {
            return Err(FilterError::config("process: command cannot be empty"));
        }
        Ok(Self {
            command,
            expected_return_codes: vec![0],
            cwd: None,
            env: BTreeMap::new(),
            timeout: None,
        })
    }

    /// Filter through a shell command line.
    pub fn shell(script: &str) -> Result<Self, FilterError> {
        Self::new(ProcessCommand::Shell(script.to_string()))
    }

    pub fn with_expected_return_codes(mut self, codes: Vec<i32>) -> Self {
        self.expected_return_codes = codes;
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Kill the child when it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_args(args: &FilterArgs, context: &FilterContext) -> Result<Self, FilterError> {
        args.reject_unknown(Self::ID, Self::OPTIONS)?;

        let shell = args.get_bool("shell")?.unwrap_or(false);
        let command = match args.get("command") {
            None => return Err(FilterError::config("process: missing 'command'")),
            Some(Value::String(s)) => ProcessCommand::Shell(s.clone()),
            Some(Value::Array(_)) => {
                let argv = args.get_str_list("command")?.unwrap_or_default();
                if shell {
                    ProcessCommand::Shell(argv.join(" "))
                } else {
                    ProcessCommand::Argv(argv)
                }
            }
            Some(other) => {
                return Err(FilterError::config(format!(
                    "process: 'command' must be a string or a list of strings, found {}",
                    other.type_str()
                )))
            }
        };

        let mut filter = Self::new(command)?;

        if let Some(codes) = args.get_int_list("expected_return_codes")? {
            let codes = codes
                .into_iter()
                .map(|c| {
                    i32::try_from(c).map_err(|_| {
                        FilterError::config(format!("process: exit code {} out of range", c))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            filter = filter.with_expected_return_codes(codes);
        }
        if let Some(cwd) = args.get_str("cwd")? {
            filter = filter.with_cwd(cwd);
        }
        for (key, value) in args.get_str_map("env")?.unwrap_or_default() {
            filter = filter.with_env(&key, &value);
        }
        let timeout = match args.get_int("timeout_secs")? {
            Some(0) => None,
            Some(secs) if secs > 0 => Some(Duration::from_secs(secs as u64)),
            Some(_) => return Err(FilterError::config("process: timeout_secs must not be negative")),
            None => context.process_timeout,
        };

        Ok(filter.with_timeout(timeout))
    }

    #[cfg(test)]
    pub fn command(&self) -> &ProcessCommand {
        &self.command
    }

    fn accepts(&self, status: &ExitStatus) -> bool {
        if self.expected_return_codes.is_empty() {
            return true;
        }
        status
            .code()
            .is_some_and(|code| self.expected_return_codes.contains(&code))
    }

    /// Run one spawn-write-read-wait round trip.
    fn execute(&self, input: &str) -> Result<String, FilterError> {
        let mut cmd = self.command.to_command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&self.env);
        // Grandchildren hold the output pipes too; give them a group to kill.
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        debug!(
            "Executing filter command: {} cwd={:?} timeout={:?}",
            self.command.long(),
            self.cwd,
            self.timeout
        );

        let mut child = cmd.spawn().map_err(|source| {
            error!(
                "Failed to execute command [{}]: {}",
                self.command.long(),
                source
            );
            FilterError::Spawn {
                command: self.command.short(),
                source,
            }
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (waited, written, stdout, stderr) = thread::scope(|scope| {
            let writer = scope.spawn(move || write_input(stdin, input.as_bytes()));
            let out_reader = scope.spawn(move || read_stdout(stdout));
            let err_reader = scope.spawn(move || read_stderr(stderr));
            let waited = self.wait(&mut child);
            (
                waited,
                join(writer),
                join(out_reader),
                join(err_reader),
            )
        });

        let status = waited?;
        written?;
        let stdout = stdout?;
        let stderr = String::from_utf8_lossy(&stderr?).into_owned();

        if !self.accepts(&status) {
            warn!(
                "Error {} executing command [{}]:\n{}\n",
                status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "(signal)".to_string()),
                self.command.long(),
                stderr
            );
            return Err(FilterError::ProcessFailed {
                command: self.command.short(),
                code: status.code(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            debug!("Filter command stderr: {}", stderr);
        }

        String::from_utf8(stdout).map_err(|_| FilterError::InvalidOutput {
            command: self.command.short(),
        })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, FilterError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                warn!(
                    "Command [{}] exceeded {:?}, killing it",
                    self.command.long(),
                    timeout
                );
                kill_process_tree(child);
                let _ = child.wait();
                return Err(FilterError::Timeout {
                    command: self.command.short(),
                    timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl TextFilter for ProcessFilter {
    fn filter(&self, input: &str) -> Result<FilterOutput, FilterError> {
        let output = self.execute(input)?;
        Ok(FilterOutput::compare(input, output))
    }

    fn success_message(&self) -> String {
        format!("Filtered through: {}", self.command.short())
    }

    fn failure_message(&self, error: Option<&FilterError>) -> String {
        match error {
            Some(e) => e.to_string(),
            None => format!("Failed to filter through: {}", self.command.short()),
        }
    }
}

/// Kill a timed-out child and, on Unix, every process in its group.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Ok(pgid) = i32::try_from(child.id()) {
        if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            debug!("killpg({}) failed: {}", pgid, e);
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
}

fn write_input(stdin: Option<ChildStdin>, input: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    // A child that exits without reading its input closes the pipe early.
    match stdin.write_all(input) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn read_stdout(pipe: Option<ChildStdout>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn read_stderr(pipe: Option<ChildStderr>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, io::Result<T>>) -> Result<T, FilterError> {
    handle
        .join()
        .map_err(|_| FilterError::Io(io::Error::other("pipe thread panicked")))?
        .map_err(FilterError::Io)
}
