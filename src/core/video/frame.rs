use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// 帧位置，从 1 开始，由抽帧阶段按顺序分配
pub type FramePosition = u32;

static FRAME_FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([1-9][0-9]*)\.([A-Za-z0-9]+)$").expect("valid frame name pattern"));

/// 磁盘上的单帧文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFile {
    pub position: FramePosition,
    pub path: PathBuf,
}

impl FrameFile {
    pub fn new(position: FramePosition, path: PathBuf) -> Self {
        Self { position, path }
    }

    /// `<dir>/<position>.<extension>`
    pub fn path_in(dir: &Path, position: FramePosition, extension: &str) -> PathBuf {
        dir.join(format!("{}.{}", position, extension))
    }
}

/// Lists `<n>.<extension>` files in `dir`, sorted numerically by `n`.
///
/// Anything not matching the numbered pattern is ignored.
pub fn discover_frames(dir: &Path, extension: &str) -> io::Result<Vec<FrameFile>> {
    let mut frames = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(caps) = FRAME_FILE_NAME.captures(name) else {
            continue;
        };
        if !caps[2].eq_ignore_ascii_case(extension) {
            continue;
        }
        let Ok(position) = caps[1].parse::<FramePosition>() else {
            continue;
        };

        frames.push(FrameFile::new(position, entry.path()));
    }

    frames.sort_by_key(|f| f.position);
    Ok(frames)
}

/// Fixed-size, alpha-stripped raw pixels used as hash input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGB 格式
}

impl PixelBuffer {
    pub const CHANNELS: usize = 3;

    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn expected_len(&self) -> usize {
        self.pixel_count() * Self::CHANNELS
    }

    /// Drops the alpha channel of an RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Self {
        let mut rgb = Vec::with_capacity(width as usize * height as usize * Self::CHANNELS);
        for chunk in rgba.chunks_exact(4) {
            rgb.push(chunk[0]); // R
            rgb.push(chunk[1]); // G
            rgb.push(chunk[2]); // B
        }
        Self::new(width, height, rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_sorts_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.png", "2.png", "1.png", "note.txt", "3.webp", "0.png", "01.png"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("4.png")).unwrap();

        let frames = discover_frames(dir.path(), "png").unwrap();
        let positions: Vec<_> = frames.iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![1, 2, 10]);
        assert_eq!(frames[2].path, dir.path().join("10.png"));
    }

    #[test]
    fn test_discover_missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_frames(&dir.path().join("nope"), "png").is_err());
    }

    #[test]
    fn test_path_in() {
        let path = FrameFile::path_in(Path::new("Output"), 42, "webp");
        assert_eq!(path, Path::new("Output").join("42.webp"));
    }

    #[test]
    fn test_from_rgba_strips_alpha() {
        let rgba = vec![1, 2, 3, 255, 4, 5, 6, 0];
        let buf = PixelBuffer::from_rgba(2, 1, &rgba);
        assert_eq!(buf.data, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.expected_len(), buf.data.len());
    }

    #[test]
    fn test_expected_len_does_not_overflow_u32() {
        let buf = PixelBuffer::new(70_000, 70_000, Vec::new());
        assert_eq!(buf.pixel_count(), 4_900_000_000);
        assert_eq!(buf.expected_len(), 14_700_000_000);
    }
}
