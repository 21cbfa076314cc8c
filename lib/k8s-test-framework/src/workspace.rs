//! Scratch directories shared with tool containers.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use snafu::ResultExt;
use tempfile::TempDir;
use tracing::{debug, error};

use crate::{
    Result,
    container::ContainerTool,
    error::FilesystemSnafu,
    util::{run_command_blocking, run_command_output},
};

const RESULTS_DIR: &str = "results";

/// UID the tool images run as.
const CONTAINER_UID: &str = "1000";

/// A temporary directory mounted into a tool container, with a `results`
/// directory the container writes to.
///
/// The directory tree is removed on [`ScanWorkspace::close`], or on drop if
/// the workspace was never closed, whatever the outcome of the run.
#[derive(Debug)]
pub struct ScanWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
    results: PathBuf,
    tool: ContainerTool,
    needs_ownership_restore: bool,
}

impl ScanWorkspace {
    /// Create the workspace under the system temp directory.
    ///
    /// With podman the results directory is handed over to the container
    /// user inside the rootless user namespace, so the tool can write there.
    pub async fn create(prefix: &str, tool: &ContainerTool) -> Result<Self> {
        Self::create_in(env::temp_dir(), prefix, tool).await
    }

    pub async fn create_in(
        parent: impl AsRef<Path>,
        prefix: &str,
        tool: &ContainerTool,
    ) -> Result<Self> {
        let parent = parent.as_ref();
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .context(FilesystemSnafu { path: parent })?;
        let path = dir.path().to_path_buf();
        let results = path.join(RESULTS_DIR);

        let mut workspace = Self {
            dir: Some(dir),
            path,
            results,
            tool: tool.clone(),
            needs_ownership_restore: false,
        };

        set_mode(&workspace.path)?;
        fs::create_dir_all(&workspace.results).context(FilesystemSnafu {
            path: &workspace.results,
        })?;
        set_mode(&workspace.results)?;

        if tool.is_podman() {
            let mut command = tool.command(["unshare", "chown", CONTAINER_UID]);
            command.arg(&workspace.results);
            run_command_output(command).await?;
            workspace.needs_ownership_restore = true;
        }

        debug!(message = "Created scan workspace.", path = %workspace.path.display());
        Ok(workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn results_dir(&self) -> &Path {
        &self.results
    }

    /// Hand the results back to the invoking user and remove the workspace.
    pub async fn close(mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let restored = match self.restore_command() {
            Some(command) => run_command_output(command).await.map(drop),
            None => Ok(()),
        };
        self.remove(dir, restored)
    }

    fn close_blocking(&mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let restored = match self.restore_command() {
            Some(command) => run_command_blocking(command).map(drop),
            None => Ok(()),
        };
        self.remove(dir, restored)
    }

    /// UID 0 inside the rootless namespace is the invoking user outside.
    fn restore_command(&self) -> Option<Command> {
        self.needs_ownership_restore.then(|| {
            let mut command = self.tool.command(["unshare", "chown", "-R", "0:0"]);
            command.arg(&self.results);
            command
        })
    }

    fn remove(&self, dir: TempDir, restored: Result<()>) -> Result<()> {
        let removed = dir.close().context(FilesystemSnafu { path: &self.path });
        debug!(message = "Removed scan workspace.", path = %self.path.display());
        restored.and(removed)
    }
}

impl Drop for ScanWorkspace {
    fn drop(&mut self) {
        if let Err(error) = self.close_blocking() {
            error!(
                message = "Failed to clean up scan workspace.",
                path = %self.path.display(),
                %error,
            );
        }
    }
}

#[cfg(unix)]
fn set_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).context(FilesystemSnafu { path })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;

        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[tokio::test]
    async fn creates_results_dir() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = ScanWorkspace::create_in(parent.path(), "case00000_", &ContainerTool::Docker)
            .await
            .unwrap();

        let name = workspace.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("case00000_"), "{name}");
        assert!(workspace.path().starts_with(parent.path()));
        assert_eq!(workspace.results_dir(), workspace.path().join("results"));
        assert!(workspace.results_dir().is_dir());

        #[cfg(unix)]
        {
            assert_eq!(mode(workspace.path()), 0o755);
            assert_eq!(mode(workspace.results_dir()), 0o755);
        }
    }

    #[tokio::test]
    async fn close_removes_everything() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = ScanWorkspace::create_in(parent.path(), "case00000_", &ContainerTool::Docker)
            .await
            .unwrap();
        let path = workspace.path().to_path_buf();
        fs::write(workspace.results_dir().join("report.json"), "{}").unwrap();

        workspace.close().await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_removes_everything() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let workspace =
                ScanWorkspace::create_in(parent.path(), "case00000_", &ContainerTool::Docker)
                    .await
                    .unwrap();
            workspace.path().to_path_buf()
        };

        assert!(!path.exists());
    }

    #[cfg(unix)]
    fn fake_podman(dir: &Path) -> (ContainerTool, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("calls.log");
        let script = dir.join("podman");
        fs::write(
            &script,
            format!("#!/bin/sh\nsleep 0.2\necho \"$@\" >> '{}'\n", log.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        (ContainerTool::Other(script.into_os_string()), log)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn podman_ownership_handover_keeps_runtime_responsive() {
        use std::{
            sync::{
                Arc,
                atomic::{AtomicUsize, Ordering},
            },
            time::Duration,
        };

        let bin = tempfile::tempdir().unwrap();
        let parent = tempfile::tempdir().unwrap();
        let (tool, log) = fake_podman(bin.path());
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        let workspace = ScanWorkspace::create_in(parent.path(), "case00000_", &tool)
            .await
            .unwrap();
        let ticks_during_create = ticks.load(Ordering::Relaxed);
        let results = workspace.results_dir().to_path_buf();
        workspace.close().await.unwrap();
        ticker.abort();

        assert!(ticks_during_create > 0);
        assert!(ticks.load(Ordering::Relaxed) > ticks_during_create);
        assert_eq!(
            fs::read_to_string(log).unwrap(),
            format!(
                "unshare chown 1000 {0}\nunshare chown -R 0:0 {0}\n",
                results.display()
            )
        );
        assert!(!results.exists());
    }

    #[tokio::test]
    async fn missing_parent_is_an_error() {
        let parent = tempfile::tempdir().unwrap();
        let missing = parent.path().join("does-not-exist");

        let error = ScanWorkspace::create_in(&missing, "case00000_", &ContainerTool::Docker)
            .await
            .unwrap_err();

        assert!(matches!(error, crate::Error::Filesystem { .. }), "{error}");
    }
}
