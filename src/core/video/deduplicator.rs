//! 单帧去重：编码 → 哈希 → 认领 → 保存

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use super::codec::ImageCodec;
use super::content_index::{Claim, ContentIndex};
use super::error::{FrameError, PipelineError};
use super::frame::{FrameFile, FramePosition};
use super::hasher::FrameHasher;

/// What a single unit of work decided for its frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// First to claim its digest; encoded file persisted under its own number
    Canonical { position: FramePosition },
    /// Resolves to an already claimed frame
    Duplicate {
        position: FramePosition,
        owner: FramePosition,
    },
    /// Codec or decode failure; left out of the remap array
    Omitted {
        position: FramePosition,
        reason: String,
    },
}

impl FrameOutcome {
    pub fn position(&self) -> FramePosition {
        match self {
            FrameOutcome::Canonical { position }
            | FrameOutcome::Duplicate { position, .. }
            | FrameOutcome::Omitted { position, .. } => *position,
        }
    }

    /// Frame number this position resolves to, if any.
    pub fn target(&self) -> Option<FramePosition> {
        match self {
            FrameOutcome::Canonical { position } => Some(*position),
            FrameOutcome::Duplicate { owner, .. } => Some(*owner),
            FrameOutcome::Omitted { .. } => None,
        }
    }
}

/// Runs the per-frame unit against a shared [`ContentIndex`].
///
/// Units only share the index; each writes its own encoded file and, when
/// canonical, its own output file.
pub struct FrameRemapper<'a, C: ImageCodec + ?Sized> {
    codec: &'a C,
    hasher: FrameHasher,
    index: &'a ContentIndex,
    encoded_dir: PathBuf,
    output_dir: PathBuf,
}

impl<'a, C: ImageCodec + ?Sized> FrameRemapper<'a, C> {
    pub fn new(codec: &'a C, index: &'a ContentIndex, encoded_dir: &Path, output_dir: &Path) -> Self {
        Self {
            codec,
            hasher: FrameHasher::new(),
            index,
            encoded_dir: encoded_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Codec failures come back as [`FrameOutcome::Omitted`]. Only a failure
    /// to persist a canonical frame is an error, since other frames may
    /// already resolve to it.
    pub fn process(&self, frame: &FrameFile) -> Result<FrameOutcome, PipelineError> {
        let position = frame.position;
        let encoded = FrameFile::path_in(&self.encoded_dir, position, self.codec.extension());

        let claim = match self.encode_and_claim(frame, &encoded) {
            Ok(claim) => claim,
            Err(e) => {
                error!("❌ Frame {} failed: {}", position, e);
                return Ok(FrameOutcome::Omitted {
                    position,
                    reason: e.to_string(),
                });
            }
        };

        if !claim.is_canonical {
            debug!("🔁 Frame {} duplicates frame {}", position, claim.owner);
            return Ok(FrameOutcome::Duplicate {
                position,
                owner: claim.owner,
            });
        }

        let dest = FrameFile::path_in(&self.output_dir, position, self.codec.extension());
        fs::copy(&encoded, &dest).map_err(|source| PipelineError::Persist { position, source })?;
        info!("✨ Unique frame saved: {:?}", dest);

        Ok(FrameOutcome::Canonical { position })
    }

    fn encode_and_claim(
        &self,
        frame: &FrameFile,
        encoded: &Path,
    ) -> Result<Claim, FrameError> {
        self.codec.encode(&frame.path, encoded)?;
        let buffer = self.codec.decode_for_hash(encoded)?;
        let digest = self.hasher.digest(&buffer);
        Ok(self.index.try_claim(digest, frame.position))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::video::frame::PixelBuffer;

    /// Encode copies the file; decode turns the file's bytes into the hash
    /// input. Files whose content is `FAIL` fail to encode.
    pub(crate) struct MockCodec;

    impl ImageCodec for MockCodec {
        fn extension(&self) -> &str {
            "webp"
        }

        fn encode(&self, input: &Path, output: &Path) -> Result<(), FrameError> {
            let bytes = fs::read(input)?;
            if bytes == b"FAIL" {
                return Err(FrameError::Codec {
                    path: input.to_path_buf(),
                    message: "mock encode failure".into(),
                });
            }
            fs::write(output, bytes)?;
            Ok(())
        }

        fn decode_for_hash(&self, path: &Path) -> Result<PixelBuffer, FrameError> {
            let bytes = fs::read(path)?;
            Ok(PixelBuffer::new(bytes.len() as u32, 1, bytes))
        }
    }

    struct Dirs {
        _root: tempfile::TempDir,
        raw: PathBuf,
        encoded: PathBuf,
        output: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let raw = root.path().join("raw");
        let encoded = root.path().join("encoded");
        let output = root.path().join("out");
        for d in [&raw, &encoded, &output] {
            fs::create_dir_all(d).unwrap();
        }
        Dirs {
            _root: root,
            raw,
            encoded,
            output,
        }
    }

    fn frame(dirs: &Dirs, position: FramePosition, content: &str) -> FrameFile {
        let path = FrameFile::path_in(&dirs.raw, position, "png");
        fs::write(&path, content).unwrap();
        FrameFile::new(position, path)
    }

    #[test]
    fn test_canonical_then_duplicate() {
        let d = dirs();
        let index = ContentIndex::new();
        let remapper = FrameRemapper::new(&MockCodec, &index, &d.encoded, &d.output);

        let first = remapper.process(&frame(&d, 1, "X")).unwrap();
        let second = remapper.process(&frame(&d, 2, "X")).unwrap();

        assert_eq!(first, FrameOutcome::Canonical { position: 1 });
        assert_eq!(
            second,
            FrameOutcome::Duplicate {
                position: 2,
                owner: 1
            }
        );
        assert!(d.output.join("1.webp").exists());
        assert!(!d.output.join("2.webp").exists());
        assert_eq!(second.target(), Some(1));
    }

    #[test]
    fn test_codec_failure_is_omitted() {
        let d = dirs();
        let index = ContentIndex::new();
        let remapper = FrameRemapper::new(&MockCodec, &index, &d.encoded, &d.output);

        let outcome = remapper.process(&frame(&d, 3, "FAIL")).unwrap();
        assert!(matches!(outcome, FrameOutcome::Omitted { position: 3, .. }));
        assert_eq!(outcome.target(), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_persist_failure_is_fatal() {
        let d = dirs();
        let index = ContentIndex::new();
        let missing_out = d.output.join("gone");
        let remapper = FrameRemapper::new(&MockCodec, &index, &d.encoded, &missing_out);

        let err = remapper.process(&frame(&d, 1, "X")).unwrap_err();
        assert!(matches!(err, PipelineError::Persist { position: 1, .. }));
    }
}
