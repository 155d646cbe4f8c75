use std::path::Path;
use std::process::{Child, Command, Output, Stdio};

/// Run `program args...` in `cwd`, capturing stdout and stderr.
pub fn run_captured(program: &str, args: &[&str], cwd: &Path) -> std::io::Result<Output> {
    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    wait_with_output(&mut child)
}

/// Wait for a child process while concurrently draining its stdout and stderr
/// pipes. Reading only after exit deadlocks once output exceeds the pipe
/// buffer: the child blocks on write and never exits.
pub fn wait_with_output(child: &mut Child) -> std::io::Result<Output> {
    use std::io::Read;

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(ref mut pipe) = stdout_pipe {
            pipe.read_to_end(&mut buf).ok();
        }
        buf
    });
    let stderr_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(ref mut pipe) = stderr_pipe {
            pipe.read_to_end(&mut buf).ok();
        }
        buf
    });

    let status = child.wait()?;
    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

/// Append every non-blank stdout and stderr line of `output` to `sink`,
/// indented under the command that produced it.
pub fn capture_lines(output: &Output, sink: &mut Vec<String>) {
    for stream in [&output.stdout, &output.stderr] {
        for line in String::from_utf8_lossy(stream).lines() {
            if !line.trim().is_empty() {
                sink.push(format!("  {}", line));
            }
        }
    }
}

/// The trimmed stderr of a failed command, or its exit status if stderr is empty.
pub fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exit status {}", output.status)
    } else {
        stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_lines_skips_blank_lines() {
        let output = run_captured("sh", &["-c", "echo one; echo; echo two 1>&2"], Path::new("."))
            .unwrap();
        let mut sink = Vec::new();
        capture_lines(&output, &mut sink);
        assert_eq!(sink, vec!["  one", "  two"]);
    }

    #[test]
    fn failure_message_prefers_stderr() {
        let output = run_captured("sh", &["-c", "echo broken 1>&2; exit 3"], Path::new("."))
            .unwrap();
        assert_eq!(failure_message(&output), "broken");

        let silent = run_captured("sh", &["-c", "exit 2"], Path::new(".")).unwrap();
        assert!(failure_message(&silent).starts_with("exit status"));
    }
}
