use std::process::Stdio;
use std::time::Duration;

use phia_core::{Tool, ToolError, ToolInput, ToolKind};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Output kept per call, in bytes.
pub const MAX_OUTPUT_SIZE: usize = 8 * 1024;

const DEFAULT_DESCRIPTION: &str =
    "Python interpreter. Executes code on pandas DataFrames (summary_df, activities_df, profile).";
const EMPTY_OUTPUT: &str = "Code executed successfully.";

// Reads the snippet from stdin and runs it with its own local scope. When the
// snippet prints nothing, the last local it assigned is printed instead.
const LAST_VALUE_DRIVER: &str = r#"import contextlib as _phia_contextlib, io as _phia_io, sys as _phia_sys
_phia_scope = {}
_phia_buffer = _phia_io.StringIO()
with _phia_contextlib.redirect_stdout(_phia_buffer):
    exec(compile(_phia_sys.stdin.read(), "<tool_code>", "exec"), globals(), _phia_scope)
_phia_output = _phia_buffer.getvalue()
if not _phia_output and _phia_scope:
    _phia_output = str(list(_phia_scope.values())[-1])
_phia_sys.stdout.write(_phia_output)
"#;

/// Runs model-written code in a fresh interpreter process. A prelude (data
/// loading, imports) is prepended to every snippet.
///
/// By default a snippet that prints nothing reports the last value it
/// assigned, so `avg = summary_df['steps'].mean()` answers with the mean.
/// This relies on Python; turn it off with [`PythonTool::with_last_value`]
/// for other interpreters.
#[derive(Clone, Debug)]
pub struct PythonTool {
    name: String,
    description: String,
    interpreter: String,
    prelude: String,
    timeout: Duration,
    last_value: bool,
}

impl Default for PythonTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonTool {
    pub fn new() -> Self {
        Self {
            name: "tool_code".to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            interpreter: "python3".to_string(),
            prelude: String::new(),
            timeout: Duration::from_secs(30),
            last_value: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Any program accepting `-c <source>`.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_prelude(mut self, prelude: impl Into<String>) -> Self {
        self.prelude = prelude.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report the last assigned value of silent snippets. Python only.
    pub fn with_last_value(mut self, enabled: bool) -> Self {
        self.last_value = enabled;
        self
    }

    fn script(&self, code: &str) -> String {
        if self.prelude.trim().is_empty() {
            code.to_string()
        } else {
            format!("{}\n{}", self.prelude.trim_end(), code)
        }
    }

    async fn run(&self, code: &str) -> Result<std::process::Output, ToolError> {
        let mut command = Command::new(&self.interpreter);
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if self.last_value {
            command
                .arg("-c")
                .arg(self.script(LAST_VALUE_DRIVER))
                .stdin(Stdio::piped());
        } else {
            command.arg("-c").arg(self.script(code)).stdin(Stdio::null());
        }

        let mut child = command.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // An interpreter that died early reports through stderr instead.
            if let Err(err) = stdin.write_all(code.as_bytes()).await {
                if err.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(err.into());
                }
            }
        }
        Ok(child.wait_with_output().await?)
    }
}

#[async_trait::async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Code
    }

    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError> {
        let code = input
            .first_arg()
            .ok_or_else(|| ToolError::InvalidInput("expected code to run".to_string()))?;

        tracing::debug!(interpreter = %self.interpreter, bytes = code.len(), "running code");
        let output = tokio::time::timeout(self.timeout, self.run(code))
            .await
            .map_err(|_| ToolError::Timeout(self.timeout))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                format!("interpreter exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(ToolError::ExecutionFailed(truncate_output(&detail)));
        }
        if stdout.trim().is_empty() {
            if !stderr.trim().is_empty() {
                return Err(ToolError::ExecutionFailed(truncate_output(stderr.trim())));
            }
            return Ok(EMPTY_OUTPUT.to_string());
        }

        Ok(truncate_output(stdout.trim_end()))
    }
}

/// Keeps the head and tail of oversized output with a marker in between.
pub fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_SIZE {
        return output.to_string();
    }

    let head_size = (MAX_OUTPUT_SIZE * 3) / 4;
    let tail_size = MAX_OUTPUT_SIZE / 5;
    let head = prefix_within(output, head_size);
    let tail = suffix_within(output, tail_size);
    let omitted = output.len() - head.len() - tail.len();
    format!("{head}\n\n... [{omitted} bytes omitted] ...\n\n{tail}")
}

fn prefix_within(text: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn suffix_within(text: &str, max_bytes: usize) -> &str {
    let mut start = text.len().saturating_sub(max_bytes);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
