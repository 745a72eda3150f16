//! Stream-copy remux that skips the decode errors a cut-off live capture
//! tends to contain.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

use crate::error::{RecorderError, RecorderResult};

/// Number of stderr lines kept when reporting a failed repair.
const STDERR_TAIL_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairExit {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr_tail: String,
}

impl RepairExit {
    fn from_output(status: ExitStatus, stderr: &[u8]) -> Self {
        let stderr = String::from_utf8_lossy(stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);

        Self {
            success: status.success(),
            code: status.code(),
            stderr_tail: lines[start..].join("\n"),
        }
    }
}

#[async_trait]
pub trait RepairTool: Send + Sync {
    fn name(&self) -> &str;

    async fn repair(&self, input: &Path, output: &Path) -> RecorderResult<RepairExit>;
}

pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `ffmpeg -nostdin -y -err_detect ignore_err -i <input> -c copy <output>`
    pub fn args(input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-nostdin".into(),
            "-y".into(),
            "-err_detect".into(),
            "ignore_err".into(),
            "-i".into(),
            input.as_os_str().to_os_string(),
            "-c".into(),
            "copy".into(),
            output.as_os_str().to_os_string(),
        ]
    }
}

#[async_trait]
impl RepairTool for Ffmpeg {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn repair(&self, input: &Path, output: &Path) -> RecorderResult<RepairExit> {
        debug!("Running {:?} on {:?}", self.program, input);

        let result = Command::new(&self.program)
            .args(Self::args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RecorderError::subprocess(self.program.to_string_lossy(), e))?;

        Ok(RepairExit::from_output(result.status, &result.stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_argument_contract() {
        let args = Ffmpeg::args(Path::new("/rec/a.mp4"), Path::new("/out/a.mp4"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-nostdin",
                "-y",
                "-err_detect",
                "ignore_err",
                "-i",
                "/rec/a.mp4",
                "-c",
                "copy",
                "/out/a.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_subprocess_error() {
        let ffmpeg = Ffmpeg::new("/nonexistent/ffmpeg");
        let result = ffmpeg
            .repair(Path::new("/tmp/in.mp4"), Path::new("/tmp/out.mp4"))
            .await;
        assert!(matches!(result, Err(RecorderError::Subprocess { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_repair_exit_keeps_stderr_tail() {
        use std::os::unix::process::ExitStatusExt;

        let stderr = b"l1\nl2\nl3\nl4\nl5\nl6\nl7\n";
        let exit = RepairExit::from_output(ExitStatus::from_raw(1 << 8), stderr);
        assert!(!exit.success);
        assert_eq!(exit.code, Some(1));
        assert_eq!(exit.stderr_tail, "l3\nl4\nl5\nl6\nl7");
    }
}
