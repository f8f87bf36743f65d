use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use super::config::PipelineConfig;
use super::frame::discover_frames;

const REMOVE_RETRIES: u32 = 5;
const REMOVE_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Directories touched by one run. Raw and encoded frames are intermediate;
/// the output directory is kept.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub raw_dir: PathBuf,
    pub encoded_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Workspace {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            raw_dir: config.raw_dir.clone(),
            encoded_dir: config.encoded_dir.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Starts every run from empty intermediate directories and an output
    /// directory without numbered `<n>.<output_extension>` frames or an old
    /// index. Leftovers from a run whose cleanup failed are removed here.
    pub fn prepare(&self, output_extension: &str, index_file_name: &str) -> io::Result<()> {
        for dir in [&self.raw_dir, &self.encoded_dir] {
            remove_dir_with_retry(dir)?;
            fs::create_dir_all(dir)?;
        }

        fs::create_dir_all(&self.output_dir)?;
        let stale = discover_frames(&self.output_dir, output_extension)?;
        if !stale.is_empty() {
            debug!("🧹 Removing {} stale frames from {:?}", stale.len(), self.output_dir);
        }
        for frame in stale {
            remove_file_if_exists(&frame.path)?;
        }

        let index = self.output_dir.join(index_file_name);
        remove_file_if_exists(&index)?;
        remove_file_if_exists(&index.with_extension("json.tmp"))?;
        Ok(())
    }

    /// Removes the intermediate directories. Returns the ones that could not
    /// be removed; failures are logged, never raised.
    pub fn cleanup(&self) -> Vec<PathBuf> {
        let mut left_behind = Vec::new();
        for dir in [&self.raw_dir, &self.encoded_dir] {
            if let Err(e) = remove_dir_with_retry(dir) {
                warn!("❌ Failed to remove {:?}: {}", dir, e);
                left_behind.push(dir.clone());
            }
        }
        left_behind
    }
}

fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn remove_dir_with_retry(dir: &Path) -> io::Result<()> {
    let mut attempt = 0;
    loop {
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!("🧹 Removed {:?}", dir);
                return Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt < REMOVE_RETRIES => {
                debug!("Retrying removal of {:?} after: {}", dir, e);
                attempt += 1;
                thread::sleep(REMOVE_RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
}
