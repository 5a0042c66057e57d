use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::info;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRemoval {
    pub kept: PathBuf,
    pub removed: PathBuf,
}

/// Regular files directly inside `dir`, sorted by path
pub fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Full byte-for-byte comparison of two files
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }

    let mut left = BufReader::new(File::open(a)?);
    let mut right = BufReader::new(File::open(b)?);
    let mut left_buf = vec![0u8; CHUNK_SIZE];
    let mut right_buf = vec![0u8; CHUNK_SIZE];

    loop {
        let read = read_full(&mut left, &mut left_buf)?;
        if read != read_full(&mut right, &mut right_buf)? {
            return Ok(false);
        }
        if read == 0 {
            return Ok(true);
        }
        if left_buf[..read] != right_buf[..read] {
            return Ok(false);
        }
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Delete byte-identical files from `dir`.
///
/// Every unordered pair of files is compared, so the cost grows with the
/// square of the file count. Within a group of identical files the
/// lexicographically smallest path is kept.
pub fn remove_duplicates(dir: &Path) -> Result<Vec<DuplicateRemoval>> {
    let files = regular_files(dir)?;
    let mut removed = vec![false; files.len()];
    let mut removals = Vec::new();

    for i in 0..files.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..files.len() {
            if removed[j] || !files_identical(&files[i], &files[j])? {
                continue;
            }
            fs::remove_file(&files[j]).with_context(|| format!("removing {}", files[j].display()))?;
            removed[j] = true;
            info!(
                "{} and {} were the same, removed duplicate",
                files[i].display(),
                files[j].display()
            );
            removals.push(DuplicateRemoval {
                kept: files[i].clone(),
                removed: files[j].clone(),
            });
        }
    }

    Ok(removals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_of_identical_pair_remains() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        let c = dir.path().join("c.jpg");
        fs::write(&a, b"same image bytes").unwrap();
        fs::write(&b, b"same image bytes").unwrap();
        fs::write(&c, b"same image byteS").unwrap();

        let removals = remove_duplicates(dir.path()).unwrap();

        assert_eq!(removals.len(), 1);
        assert_eq!(a.exists() as u8 + b.exists() as u8, 1);
        assert!(c.exists());
        assert_eq!(fs::read(&c).unwrap(), b"same image byteS");
    }

    #[test]
    fn test_smallest_path_kept_across_group() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["3.png", "1.png", "2.png"] {
            fs::write(dir.path().join(name), b"identical").unwrap();
        }
        fs::write(dir.path().join("4.png"), b"different").unwrap();

        let removals = remove_duplicates(dir.path()).unwrap();

        assert_eq!(removals.len(), 2);
        assert!(removals.iter().all(|r| r.kept == dir.path().join("1.png")));
        let remaining: Vec<_> = regular_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining, vec!["1.png", "4.png"]);
    }

    #[test]
    fn test_subdirectories_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("x"), b"data").unwrap();
        fs::write(dir.path().join("x"), b"data").unwrap();

        assert!(remove_duplicates(dir.path()).unwrap().is_empty());
        assert!(dir.path().join("nested").join("x").exists());
    }

    #[test]
    fn test_files_identical_beyond_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = vec![7u8; CHUNK_SIZE * 2 + 10];
        fs::write(dir.path().join("a"), &data).unwrap();
        fs::write(dir.path().join("b"), &data).unwrap();
        assert!(files_identical(&dir.path().join("a"), &dir.path().join("b")).unwrap());

        let last = data.len() - 1;
        data[last] = 8;
        fs::write(dir.path().join("b"), &data).unwrap();
        assert!(!files_identical(&dir.path().join("a"), &dir.path().join("b")).unwrap());
    }
}
