//! 视频帧去重入口

use std::path::Path;

use log::info;

use crate::core::video::{
    FfmpegFrameSource, FfmpegWebpCodec, FramePosition, Pipeline, PipelineConfig, PipelineError,
    RemapArray, RunError, RunReport,
};

/// Video → unique WebP frames plus a `data.json` remap index, using the
/// system `ffmpeg` for extraction and encoding.
///
/// ```no_run
/// use frame_dedup::api::video::VideoDeduplicator;
/// use frame_dedup::core::video::PipelineConfig;
///
/// let dedup = VideoDeduplicator::create(PipelineConfig::default()).unwrap();
/// let report = dedup.run().unwrap();
/// println!("{} unique frames", report.canonical_frames);
/// ```
pub struct VideoDeduplicator {
    pipeline: Pipeline<FfmpegFrameSource, FfmpegWebpCodec>,
}

impl VideoDeduplicator {
    pub fn create(config: PipelineConfig) -> Result<Self, PipelineError> {
        let source = FfmpegFrameSource::new(config.extraction.clone());
        let codec = FfmpegWebpCodec::new(config.encode.clone(), config.hash);
        let pipeline = Pipeline::new(config, source, codec)?;
        info!("🎬 VideoDeduplicator: created");
        Ok(Self { pipeline })
    }

    pub fn config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }

    /// Consumes the deduplicator; one run per instance.
    pub fn run(self) -> Result<RunReport, RunError> {
        let Self { pipeline } = self;
        pipeline.run()
    }
}

/// Looks up which stored frame `frame` resolves to in a written index.
pub fn resolve_frame(index_path: &Path, frame: FramePosition) -> Result<Option<FramePosition>, PipelineError> {
    let remap = RemapArray::load(index_path)?;
    Ok(remap.resolve(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_create_validates_config() {
        let config = PipelineConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(VideoDeduplicator::create(config).is_err());

        let dedup = VideoDeduplicator::create(PipelineConfig::default()).unwrap();
        assert_eq!(dedup.config().max_concurrency, 48);
    }

    #[test]
    fn test_resolve_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[1,2,1,null,5]").unwrap();

        assert_eq!(resolve_frame(&path, 3).unwrap(), Some(1));
        assert_eq!(resolve_frame(&path, 4).unwrap(), None);
        assert_eq!(resolve_frame(&path, 9).unwrap(), None);
        assert!(resolve_frame(&dir.path().join("missing.json"), 1).is_err());
    }
}
