//! FFmpeg-based media engine implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;
use uuid::Uuid;

use super::error::MediaError;
use super::traits::MediaEngine;
use super::types::{CaptureSpec, ConcatSpec};

/// How many trailing characters of ffmpeg's stderr to keep in errors.
const STDERR_TAIL: usize = 512;

/// Configuration for [`FfmpegEngine`].
#[derive(Debug, Clone)]
pub struct FfmpegEngineConfig {
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: PathBuf,
    /// Directory for concat manifest files.
    pub temp_dir: PathBuf,
}

impl Default for FfmpegEngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// FFmpeg-based implementation of [`MediaEngine`].
pub struct FfmpegEngine {
    config: FfmpegEngineConfig,
}

impl FfmpegEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: FfmpegEngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FfmpegEngineConfig::default())
    }

    /// Builds ffmpeg arguments for a stream capture.
    fn build_capture_args(spec: &CaptureSpec) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-loglevel".to_string(), "error".to_string()];

        for (key, value) in &spec.input_args {
            args.push(format!("-{}", key));
            args.push(value.clone());
        }

        args.extend(["-i".to_string(), spec.stream.clone()]);
        args.extend(["-t".to_string(), spec.length_secs.to_string()]);

        for (key, value) in &spec.output_args {
            args.push(format!("-{}", key));
            args.push(value.clone());
        }

        args.push(spec.output_path.to_string_lossy().to_string());
        args
    }

    /// Builds ffmpeg arguments for a concat merge reading `manifest`.
    fn build_concat_args(spec: &ConcatSpec, manifest: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-loglevel".to_string(), "error".to_string()];

        for (key, value) in &spec.input_args {
            args.push(format!("-{}", key));
            args.push(value.clone());
        }

        args.extend(["-i".to_string(), manifest.to_string_lossy().to_string()]);

        for (key, value) in &spec.output_args {
            args.push(format!("-{}", key));
            args.push(value.clone());
        }

        args.push(spec.output_path.to_string_lossy().to_string());
        args
    }

    /// Concat demuxer manifest: one `file <path>` line per input.
    fn manifest_contents(inputs: &[PathBuf]) -> String {
        inputs
            .iter()
            .map(|path| format!("file {}", path.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Runs ffmpeg with `args`, enforcing `deadline` and removing
    /// `output_path` on any failure.
    async fn run_tool(
        &self,
        args: Vec<String>,
        output_path: &Path,
        deadline: Duration,
    ) -> Result<(), MediaError> {
        debug!(tool = %self.config.ffmpeg_path.display(), ?args, "running media tool");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::ToolNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    MediaError::Io(e)
                }
            })?;

        let stderr = child.stderr.take();
        let waited = timeout(deadline, async {
            let mut detail = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut detail).await;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, detail))
        })
        .await;

        match waited {
            Ok(Ok((status, _))) if status.success() => Ok(()),
            Ok(Ok((status, detail))) => {
                let _ = tokio::fs::remove_file(output_path).await;
                let mut tail_start = detail.len().saturating_sub(STDERR_TAIL);
                while !detail.is_char_boundary(tail_start) {
                    tail_start += 1;
                }
                Err(MediaError::Failed {
                    code: status.code(),
                    detail: detail[tail_start..].trim().to_string(),
                })
            }
            Ok(Err(e)) => {
                let _ = tokio::fs::remove_file(output_path).await;
                Err(MediaError::Io(e))
            }
            Err(_) => {
                let _ = child.kill().await;
                let _ = tokio::fs::remove_file(output_path).await;
                Err(MediaError::Timeout {
                    timeout_secs: deadline.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn capture(&self, spec: CaptureSpec) -> Result<(), MediaError> {
        let args = Self::build_capture_args(&spec);
        self.run_tool(args, &spec.output_path, spec.timeout).await
    }

    async fn concat(&self, spec: ConcatSpec) -> Result<(), MediaError> {
        let manifest = self.config.temp_dir.join(Uuid::new_v4().to_string());
        tokio::fs::write(&manifest, Self::manifest_contents(&spec.inputs)).await?;

        let args = Self::build_concat_args(&spec, &manifest);
        let result = self.run_tool(args, &spec.output_path, spec.timeout).await;

        // The manifest never outlives the invocation, success or not.
        let _ = tokio::fs::remove_file(&manifest).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn capture_spec() -> CaptureSpec {
        CaptureSpec {
            stream: "rtsp://cam.local/stream".to_string(),
            output_path: PathBuf::from("/out/seg.mp4"),
            length_secs: 10,
            input_args: BTreeMap::from([("rtsp_transport".to_string(), "tcp".to_string())]),
            output_args: BTreeMap::from([
                ("c:a".to_string(), "aac".to_string()),
                ("c:v".to_string(), "copy".to_string()),
            ]),
            timeout: Duration::from_secs(20),
        }
    }

    #[test]
    fn test_build_capture_args() {
        let args = FfmpegEngine::build_capture_args(&capture_spec());

        let input_flag = args.iter().position(|a| a == "-i").unwrap();
        let transport_flag = args.iter().position(|a| a == "-rtsp_transport").unwrap();
        let duration_flag = args.iter().position(|a| a == "-t").unwrap();

        // Input args before -i, duration and output args after.
        assert!(transport_flag < input_flag);
        assert!(duration_flag > input_flag);
        assert_eq!(args[input_flag + 1], "rtsp://cam.local/stream");
        assert_eq!(args[duration_flag + 1], "10");
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"copy".to_string()));
        assert_eq!(args.last().unwrap(), "/out/seg.mp4");
    }

    #[test]
    fn test_build_concat_args() {
        let spec = ConcatSpec {
            inputs: vec![PathBuf::from("/out/a.mp4"), PathBuf::from("/out/b.mp4")],
            output_path: PathBuf::from("/out/merged.mp4"),
            input_args: BTreeMap::from([
                ("f".to_string(), "concat".to_string()),
                ("safe".to_string(), "0".to_string()),
            ]),
            output_args: BTreeMap::from([("c:v".to_string(), "h264".to_string())]),
            timeout: Duration::from_secs(30),
        };
        let args = FfmpegEngine::build_concat_args(&spec, Path::new("/tmp/manifest"));

        let input_flag = args.iter().position(|a| a == "-i").unwrap();
        let format_flag = args.iter().position(|a| a == "-f").unwrap();
        assert!(format_flag < input_flag);
        assert_eq!(args[input_flag + 1], "/tmp/manifest");
        assert!(args.contains(&"h264".to_string()));
        assert_eq!(args.last().unwrap(), "/out/merged.mp4");
    }

    #[test]
    fn test_manifest_contents() {
        let contents = FfmpegEngine::manifest_contents(&[
            PathBuf::from("/out/a.mp4"),
            PathBuf::from("/out/b.mp4"),
        ]);
        assert_eq!(contents, "file /out/a.mp4\nfile /out/b.mp4");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let engine = FfmpegEngine::new(FfmpegEngineConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            temp_dir: std::env::temp_dir(),
        });

        let err = engine.capture(capture_spec()).await.unwrap_err();
        assert!(matches!(err, MediaError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_concat_removes_manifest_on_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let engine = FfmpegEngine::new(FfmpegEngineConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            temp_dir: temp_dir.path().to_path_buf(),
        });

        let spec = ConcatSpec {
            inputs: vec![PathBuf::from("/out/a.mp4")],
            output_path: temp_dir.path().join("merged.mp4"),
            input_args: BTreeMap::new(),
            output_args: BTreeMap::new(),
            timeout: Duration::from_secs(5),
        };
        assert!(engine.concat(spec).await.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "manifest file was left behind");
    }
}
