use async_recursion::async_recursion;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

#[async_recursion]
pub async fn get_all_files(dir_path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dir = fs::read_dir(dir_path).await?;
    let mut files = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();

        if entry.file_type().await?.is_dir() {
            files.append(&mut get_all_files(&path).await?);
        } else {
            files.push(path);
        }
    }

    Ok(files)
}

/// Every `.cue` file below `folder_path`, sorted by path.
pub async fn find_cue_files(folder_path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut cue_files: Vec<_> = get_all_files(folder_path)
        .await?
        .into_iter()
        .filter(|file| {
            file.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("cue"))
        })
        .collect();

    cue_files.sort();
    Ok(cue_files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_cue_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("b").join("disc 2");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("a.cue"), "").unwrap();
        std::fs::write(dir.path().join("a.flac"), "").unwrap();
        std::fs::write(nested.join("image.CUE"), "").unwrap();

        let found = find_cue_files(dir.path()).await.unwrap();
        assert_eq!(found, vec![dir.path().join("a.cue"), nested.join("image.CUE")]);
    }

    #[tokio::test]
    async fn empty_directory_has_no_cue_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_cue_files(dir.path()).await.unwrap().is_empty());
    }
}
