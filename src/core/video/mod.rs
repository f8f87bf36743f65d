//! 视频帧去重流水线
//!
//! 抽帧 → 逐帧编码 → 内容哈希 → 去重 → 写入索引 → 清理
//!
//! Frames are extracted once, then every frame runs an independent
//! encode → hash → claim unit on a bounded pool. The [`ContentIndex`] is the
//! only state shared between units.

pub mod codec;
pub mod config;
pub mod content_index;
pub mod deduplicator;
pub mod error;
pub mod frame;
pub mod hasher;
pub mod pipeline;
pub mod remap;
pub mod source;
pub mod state_machine;
pub mod workspace;

pub use codec::{FfmpegWebpCodec, ImageCodec};
pub use config::{EncodeConfig, ExtractionConfig, HashConfig, PipelineConfig};
pub use content_index::{Claim, ContentIndex};
pub use deduplicator::{FrameOutcome, FrameRemapper};
pub use error::{FrameError, PipelineError};
pub use frame::{FrameFile, FramePosition, PixelBuffer};
pub use hasher::{Digest, FrameHasher};
pub use pipeline::{Pipeline, RunError, RunReport};
pub use remap::RemapArray;
pub use source::{FfmpegFrameSource, FrameSource};
pub use state_machine::{PipelineState, StageOutcome, StateMachine};
pub use workspace::Workspace;
