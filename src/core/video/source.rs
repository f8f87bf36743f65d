use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::info;

use super::config::ExtractionConfig;
use super::error::PipelineError;

/// Produces `1.<ext>`, `2.<ext>`, ... in a directory from a video.
pub trait FrameSource: Send + Sync {
    /// Extension of the raster files written to `out_dir`
    fn extension(&self) -> &str;

    /// Blocks until extraction finishes. On failure, whatever was written
    /// before the failure may remain in `out_dir`.
    fn extract(&self, input: &Path, out_dir: &Path) -> Result<(), PipelineError>;
}

/// PNG frames through the system `ffmpeg`.
pub struct FfmpegFrameSource {
    ffmpeg: PathBuf,
    config: ExtractionConfig,
}

impl FfmpegFrameSource {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            config,
        }
    }

    pub fn with_binary(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    fn filter(&self) -> String {
        format!("fps={},scale=-1:{}", self.config.fps, self.config.height)
    }
}

impl FrameSource for FfmpegFrameSource {
    fn extension(&self) -> &str {
        "png"
    }

    fn extract(&self, input: &Path, out_dir: &Path) -> Result<(), PipelineError> {
        info!("🎬 Running ffmpeg on {:?} ({})", input, self.filter());

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-hide_banner").arg("-loglevel").arg("error");
        if let Some(hwaccel) = &self.config.hwaccel {
            cmd.arg("-hwaccel").arg(hwaccel);
        }
        cmd.arg("-i")
            .arg(input)
            .arg("-vf")
            .arg(self.filter())
            .arg("-c:v")
            .arg("png")
            .arg(out_dir.join("%d.png"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let out = cmd
            .output()
            .map_err(|e| PipelineError::Extraction(format!("failed to spawn ffmpeg: {}", e)))?;

        if !out.status.success() {
            return Err(PipelineError::Extraction(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_string() {
        let source = FfmpegFrameSource::new(ExtractionConfig::default());
        assert_eq!(source.filter(), "fps=20,scale=-1:480");
        assert_eq!(source.extension(), "png");
    }

    #[test]
    fn test_missing_binary_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FfmpegFrameSource::new(ExtractionConfig::default())
            .with_binary(dir.path().join("no-such-ffmpeg"));
        let err = source
            .extract(&dir.path().join("input.mp4"), dir.path())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }
}
