use std::io::Read;
use std::path::Path;
use std::process::Child;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crate::DocstripError;
use crate::DocstripResult;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// An external source formatter.
pub trait Formatter: Send + Sync {
	/// Called once before a batch. An error here is fatal for the batch.
	fn ensure_available(&self) -> DocstripResult<()>;

	/// Format `file` using the style file at `style_path` and return the
	/// formatted text. The file on disk is not modified.
	fn format(&self, style_path: &Path, file: &Path) -> DocstripResult<String>;
}

/// Runs `<program> -style=file:<style> <file>` and reads the result from
/// stdout. This is the calling convention of `clang-format`.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
	program: String,
	timeout: Option<Duration>,
}

impl CommandFormatter {
	/// `timeout_secs == 0` disables the timeout.
	pub fn new(program: impl Into<String>, timeout_secs: u64) -> Self {
		Self {
			program: program.into(),
			timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
		}
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	fn unavailable(&self, error: &std::io::Error) -> DocstripError {
		DocstripError::FormatterUnavailable {
			program: self.program.clone(),
			reason: error.to_string(),
		}
	}
}

impl Formatter for CommandFormatter {
	fn ensure_available(&self) -> DocstripResult<()> {
		// Only spawning matters; some wrappers exit non-zero for `--version`.
		Command::new(&self.program)
			.arg("--version")
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.status()
			.map_err(|e| self.unavailable(&e))?;

		Ok(())
	}

	fn format(&self, style_path: &Path, file: &Path) -> DocstripResult<String> {
		let mut child = Command::new(&self.program)
			.arg(format!("-style=file:{}", style_path.display()))
			.arg(file)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| self.unavailable(&e))?;

		let stdout = spawn_reader(child.stdout.take());
		let stderr = spawn_reader(child.stderr.take());

		let Some(status) = wait_with_deadline(&mut child, self.timeout)? else {
			// The reader threads are left to finish on their own; joining them
			// could block on grandchildren that still hold the pipes.
			return Err(DocstripError::FormatterTimeout {
				path: file.display().to_string(),
				seconds: self.timeout.map_or(0, |timeout| timeout.as_secs()),
			});
		};

		let stdout = stdout.join().unwrap_or_default();
		let stderr = stderr.join().unwrap_or_default();

		if !status.success() {
			let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
			let reason = if stderr.is_empty() {
				format!(
					"exited with status {}",
					status
						.code()
						.map_or_else(|| "unknown".to_string(), |code| code.to_string())
				)
			} else {
				stderr
			};

			return Err(DocstripError::FormatterFailed {
				path: file.display().to_string(),
				reason,
			});
		}

		Ok(String::from_utf8_lossy(&stdout).into_owned())
	}
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<Vec<u8>> {
	thread::spawn(move || {
		let mut buffer = Vec::new();
		if let Some(mut source) = source {
			let _ = source.read_to_end(&mut buffer);
		}
		buffer
	})
}

/// Wait for `child`, killing it once `timeout` elapses. `Ok(None)` means the
/// deadline passed.
fn wait_with_deadline(
	child: &mut Child,
	timeout: Option<Duration>,
) -> DocstripResult<Option<ExitStatus>> {
	let Some(timeout) = timeout else {
		return Ok(Some(child.wait()?));
	};

	let deadline = Instant::now() + timeout;
	loop {
		if let Some(status) = child.try_wait()? {
			return Ok(Some(status));
		}

		if Instant::now() >= deadline {
			let _ = child.kill();
			let _ = child.wait();
			return Ok(None);
		}

		thread::sleep(POLL_INTERVAL);
	}
}
