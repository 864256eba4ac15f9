use std::path::Path;
use tokio::fs;
use crate::utils::FetchResult;

/// Check if directory exists
pub async fn dir_exists(path: impl AsRef<Path>) -> bool {
    fs::metadata(path.as_ref())
        .await
        .is_ok_and(|m| m.is_dir())
}

/// Create a directory and all missing parents. No-op when it already exists.
pub async fn ensure_dir(path: impl AsRef<Path>) -> FetchResult<()> {
    let path = path.as_ref();
    if dir_exists(path).await {
        return Ok(());
    }
    fs::create_dir_all(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn ensure_dir_creates_parents() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");

        ensure_dir(&nested).await.unwrap();

        assert!(dir_exists(&nested).await);
        // second call is a no-op
        ensure_dir(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_dir_fails_when_a_file_is_in_the_way() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        assert!(ensure_dir(blocker.join("out")).await.is_err());
        assert!(!dir_exists(&blocker).await);
        assert!(blocker.is_file());
    }
}
