use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Largest hash buffer side accepted by [`PipelineConfig::validate`]
pub const MAX_HASH_SIDE: u32 = 1024;

/// Frame source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Target sampling rate in frames per second
    pub fps: u32,
    /// Target raster height; width keeps the aspect ratio
    pub height: u32,
    /// Passed to ffmpeg as `-hwaccel`, e.g. "cuda"
    pub hwaccel: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fps: 20,
            height: 480,
            hwaccel: None,
        }
    }
}

/// Lossy re-encode settings (WebP).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub quality: u8,
    /// 0 (fast) ..= 6 (smallest)
    pub effort: u8,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            quality: 25,
            effort: 6,
        }
    }
}

/// Size every frame is resized to before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub raw_dir: PathBuf,
    pub encoded_dir: PathBuf,
    pub output_dir: PathBuf,
    pub index_file_name: String,
    /// Upper bound on concurrently running units
    pub max_concurrency: usize,
    pub extraction: ExtractionConfig,
    pub encode: EncodeConfig,
    pub hash: HashConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.mp4"),
            raw_dir: PathBuf::from("RawFrames"),
            encoded_dir: PathBuf::from("CompressedFrames"),
            output_dir: PathBuf::from("Output"),
            index_file_name: "data.json".to_string(),
            max_concurrency: 48,
            extraction: ExtractionConfig::default(),
            encode: EncodeConfig::default(),
            hash: HashConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Keeps every intermediate and output directory under `root`.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            input: root.join("input.mp4"),
            raw_dir: root.join("RawFrames"),
            encoded_dir: root.join("CompressedFrames"),
            output_dir: root.join("Output"),
            ..Default::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(&self.index_file_name)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_concurrency == 0 {
            return Err(PipelineError::Config(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.hash.width == 0
            || self.hash.height == 0
            || self.hash.width > MAX_HASH_SIDE
            || self.hash.height > MAX_HASH_SIDE
        {
            return Err(PipelineError::Config(format!(
                "hash size must be within 1..={} per side, got {}x{}",
                MAX_HASH_SIDE, self.hash.width, self.hash.height
            )));
        }
        if self.extraction.fps == 0 || self.extraction.height == 0 {
            return Err(PipelineError::Config(
                "extraction fps and height must be non-zero".into(),
            ));
        }
        if self.encode.quality > 100 {
            return Err(PipelineError::Config(format!(
                "quality {} out of range 0..=100",
                self.encode.quality
            )));
        }
        if self.encode.effort > 6 {
            return Err(PipelineError::Config(format!(
                "effort {} out of range 0..=6",
                self.encode.effort
            )));
        }
        if self.index_file_name.is_empty()
            || self.index_file_name.contains(['/', '\\'])
        {
            return Err(PipelineError::Config(format!(
                "index file name {:?} must be a plain file name",
                self.index_file_name
            )));
        }
        Ok(())
    }
}
