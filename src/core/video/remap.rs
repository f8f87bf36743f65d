//! 帧重映射表：原始帧位置 → 实际保存的帧编号

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::debug;

use super::error::PipelineError;
use super::frame::FramePosition;

/// Position-indexed table, slot `p - 1` holds the frame number position `p`
/// resolves to. `None` marks a frame whose unit failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemapArray {
    slots: Vec<Option<FramePosition>>,
}

impl RemapArray {
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn from_slots(slots: Vec<Option<FramePosition>>) -> Self {
        Self { slots }
    }

    /// Total positions covered, including omitted ones.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of positions that resolve to a frame.
    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Position 0 is not a frame and is ignored.
    pub fn set(&mut self, position: FramePosition, target: FramePosition) {
        if position == 0 {
            return;
        }
        let idx = position as usize - 1;
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(target);
    }

    pub fn resolve(&self, position: FramePosition) -> Option<FramePosition> {
        if position == 0 {
            return None;
        }
        self.slots.get(position as usize - 1).copied().flatten()
    }

    pub fn omitted_positions(&self) -> Vec<FramePosition> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i as FramePosition + 1)
            .collect()
    }

    /// Distinct resolved values, i.e. the frames that must exist on disk.
    pub fn canonical_set(&self) -> BTreeSet<FramePosition> {
        self.slots.iter().flatten().copied().collect()
    }

    /// Every resolved value must itself be a canonical position.
    ///
    /// The target may be higher than the position when a later duplicate won
    /// the claim race.
    pub fn check_consistency(&self) -> Result<(), PipelineError> {
        for (i, slot) in self.slots.iter().enumerate() {
            let position = i as FramePosition + 1;
            if let Some(target) = *slot {
                if self.resolve(target) != Some(target) {
                    return Err(PipelineError::Inconsistent { position, target });
                }
            }
        }
        Ok(())
    }

    pub fn as_slots(&self) -> &[Option<FramePosition>] {
        &self.slots
    }

    /// Compact JSON, omitted positions as `null`.
    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string(&self.slots)?)
    }

    /// Writes through a sibling temp file so a failed write never leaves a
    /// partial index behind.
    pub fn write_to(&self, path: &Path) -> Result<(), PipelineError> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");

        let result = fs::write(&tmp, json.as_bytes()).and_then(|_| fs::rename(&tmp, path));
        if let Err(source) = result {
            let _ = fs::remove_file(&tmp);
            return Err(PipelineError::IndexWrite {
                path: path.to_path_buf(),
                source,
            });
        }

        debug!("📄 Wrote {} remap entries to {:?}", self.len(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path)?;
        let slots: Vec<Option<FramePosition>> = serde_json::from_str(&text)?;
        Ok(Self { slots })
    }
}
