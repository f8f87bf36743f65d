use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::imageops::FilterType;

use super::config::{EncodeConfig, HashConfig};
use super::error::FrameError;
use super::frame::PixelBuffer;

/// Per-frame re-encode and decode-for-hash.
pub trait ImageCodec: Send + Sync {
    /// File extension of encoded output, without the dot
    fn extension(&self) -> &str;

    fn encode(&self, input: &Path, output: &Path) -> Result<(), FrameError>;

    /// Decodes `path` to the fixed hash size with alpha stripped.
    fn decode_for_hash(&self, path: &Path) -> Result<PixelBuffer, FrameError>;
}

/// Decode any supported image and cover-fit it to `size` RGB.
///
/// The frame is scaled to cover `size` keeping its aspect ratio, then the
/// overflow is center-cropped.
pub fn decode_normalized(path: &Path, size: HashConfig) -> Result<PixelBuffer, FrameError> {
    let img = image::open(path)?;
    let rgb = img
        .resize_to_fill(size.width, size.height, FilterType::Triangle)
        .to_rgb8();
    let buffer = PixelBuffer::new(size.width, size.height, rgb.into_raw());

    if buffer.data.len() != buffer.expected_len() {
        return Err(FrameError::UnexpectedBuffer {
            expected: buffer.expected_len(),
            actual: buffer.data.len(),
        });
    }
    Ok(buffer)
}

/// Lossy WebP through the system `ffmpeg` (libwebp).
pub struct FfmpegWebpCodec {
    ffmpeg: PathBuf,
    encode: EncodeConfig,
    hash: HashConfig,
}

impl FfmpegWebpCodec {
    pub fn new(encode: EncodeConfig, hash: HashConfig) -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            encode,
            hash,
        }
    }

    pub fn with_binary(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }
}

impl ImageCodec for FfmpegWebpCodec {
    fn extension(&self) -> &str {
        "webp"
    }

    fn encode(&self, input: &Path, output: &Path) -> Result<(), FrameError> {
        let result = Command::new(&self.ffmpeg)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-c:v")
            .arg("libwebp")
            .arg("-quality")
            .arg(self.encode.quality.to_string())
            .arg("-compression_level")
            .arg(self.encode.effort.to_string())
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let out = result.map_err(|e| FrameError::Codec {
            path: input.to_path_buf(),
            message: format!("failed to spawn ffmpeg: {}", e),
        })?;

        if !out.status.success() {
            return Err(FrameError::Codec {
                path: input.to_path_buf(),
                message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn decode_for_hash(&self, path: &Path) -> Result<PixelBuffer, FrameError> {
        decode_normalized(path, self.hash)
    }
}
