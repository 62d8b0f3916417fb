//! Writing compression results to disk.
//!
//! One file per result, named `<base>_compressed.<ext>`, with save-all
//! staggering consecutive writes by a fixed delay.

use std::path::{Path, PathBuf};
use std::time::Duration;

use vidpress_core::{Error, Result};

use crate::batch::CompressionResult;

/// Fixed delay between consecutive saves in [`save_all`], so a batch of
/// outputs does not land on disk in one burst.
const SAVE_STAGGER: Duration = Duration::from_secs(1);

/// Derive the output file name: the `_compressed` suffix goes before the
/// original extension.
pub fn compressed_file_name(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => format!("{base}_compressed.{ext}"),
        _ => format!("{original}_compressed"),
    }
}

/// Write one result into `dir`, returning the path written.
pub fn save(result: &CompressionResult, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(compressed_file_name(&result.original_name));
    std::fs::write(&path, &result.data)
        .map_err(|e| Error::Download(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!("saved {}", path.display());
    Ok(path)
}

/// Write every result into `dir` in order, sleeping [`SAVE_STAGGER`] between
/// consecutive files.
pub async fn save_all(results: &[CompressionResult], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(results.len());
    for (index, result) in results.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(SAVE_STAGGER).await;
        }
        paths.push(save(result, dir)?);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, data: &[u8]) -> CompressionResult {
        CompressionResult {
            original_name: name.to_string(),
            data: data.to_vec(),
            size_bytes: data.len() as u64,
        }
    }

    #[test]
    fn suffix_goes_before_the_extension() {
        assert_eq!(compressed_file_name("clip.mov"), "clip_compressed.mov");
        assert_eq!(compressed_file_name("video.mp4"), "video_compressed.mp4");
        assert_eq!(
            compressed_file_name("archive.tar.mp4"),
            "archive.tar_compressed.mp4"
        );
    }

    #[test]
    fn names_without_extension_get_a_bare_suffix() {
        assert_eq!(compressed_file_name("clip"), "clip_compressed");
        assert_eq!(compressed_file_name(".hidden"), ".hidden_compressed");
    }

    #[test]
    fn save_writes_the_result_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(&result("clip.mov", b"abc"), dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "clip_compressed.mov");
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn save_into_missing_dir_is_a_download_error() {
        let err = save(
            &result("clip.mov", b"abc"),
            Path::new("/nonexistent/vidpress-out"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn save_all_staggers_consecutive_files() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![result("a.mp4", b"a"), result("b.mp4", b"b")];

        let started = tokio::time::Instant::now();
        let paths = save_all(&results, dir.path()).await.unwrap();

        assert_eq!(paths.len(), 2);
        // One stagger between two files; none before the first.
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert!(dir.path().join("a_compressed.mp4").exists());
        assert!(dir.path().join("b_compressed.mp4").exists());
    }
}
