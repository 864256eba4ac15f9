use std::path::{Path, PathBuf};
use crate::core::Task;
use crate::utils::{ValidationError, dir_exists, is_supported_format};

/// Validates a task before it is added or an edit is applied
pub async fn validate_task(task: &Task) -> Result<(), ValidationError> {
    if task.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    validate_folder("Watch", &task.watch_folder).await?;
    validate_folder("Output", &task.output_folder).await?;
    validate_distinct_folders(&task.watch_folder, &task.output_folder).await?;
    validate_settings(task)
}

/// Validates dimensions and output format
pub fn validate_settings(task: &Task) -> Result<(), ValidationError> {
    if task.width == 0 || task.height == 0 {
        return Err(ValidationError::Dimensions {
            width: task.width,
            height: task.height,
        });
    }

    if !is_supported_format(&task.format) {
        return Err(ValidationError::Format(task.format.clone()));
    }

    Ok(())
}

async fn validate_folder(role: &'static str, path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() || !dir_exists(path).await {
        return Err(ValidationError::FolderMissing {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

async fn validate_distinct_folders(watch: &Path, output: &Path) -> Result<(), ValidationError> {
    if resolve(watch).await == resolve(output).await {
        return Err(ValidationError::SameFolder(watch.to_path_buf()));
    }
    Ok(())
}

// Both folders exist at this point, so canonicalize only fails on permissions.
async fn resolve(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn task_in(root: &TempDir) -> Task {
        let watch = root.path().join("in");
        let output = root.path().join("out");
        std::fs::create_dir_all(&watch).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        Task::new("screens", watch, output, 640, 480, "jpg")
    }

    #[tokio::test]
    async fn accepts_a_well_formed_task() {
        let root = TempDir::new().unwrap();
        assert_eq!(validate_task(&task_in(&root)).await, Ok(()));
    }

    #[tokio::test]
    async fn rejects_same_watch_and_output_folder() {
        let root = TempDir::new().unwrap();
        let mut task = task_in(&root);
        // same folder spelled differently
        task.output_folder = task.watch_folder.join("..").join("in");

        assert!(matches!(
            validate_task(&task).await,
            Err(ValidationError::SameFolder(_))
        ));
    }

    #[tokio::test]
    async fn rejects_missing_folders() {
        let root = TempDir::new().unwrap();
        let mut task = task_in(&root);
        task.watch_folder = root.path().join("nowhere");

        assert!(matches!(
            validate_task(&task).await,
            Err(ValidationError::FolderMissing { role: "Watch", .. })
        ));
    }

    #[tokio::test]
    async fn rejects_bad_settings() {
        let root = TempDir::new().unwrap();

        let mut task = task_in(&root);
        task.name = "  ".into();
        assert_eq!(validate_task(&task).await, Err(ValidationError::EmptyName));

        let mut task = task_in(&root);
        task.height = 0;
        assert!(matches!(
            validate_task(&task).await,
            Err(ValidationError::Dimensions { width: 640, height: 0 })
        ));

        let mut task = task_in(&root);
        task.format = "gif".into();
        assert_eq!(
            validate_task(&task).await,
            Err(ValidationError::Format("gif".into()))
        );
    }
}
