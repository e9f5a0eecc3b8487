//! Staging and promotion of generated component files.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::component::{ComponentFile, ComponentName};
use crate::error::PipelineError;
use crate::parse::GeneratedArtifact;
use crate::remover::{DirectoryRemover, RemovalOutcome};

/// One file written to the staging area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Moves generated files from the staging area into the live component tree.
pub struct Publisher {
    staging_dir: PathBuf,
    components_dir: PathBuf,
    remover: Box<dyn DirectoryRemover>,
}

impl Publisher {
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        components_dir: impl Into<PathBuf>,
        remover: Box<dyn DirectoryRemover>,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            components_dir: components_dir.into(),
            remover,
        }
    }

    pub fn staged_dir(&self, component: &ComponentName) -> PathBuf {
        self.staging_dir.join(component.as_str())
    }

    pub fn promoted_dir(&self, component: &ComponentName) -> PathBuf {
        self.components_dir.join(component.as_str())
    }

    /// Write the three files under `{staging_dir}/{component}/`, replacing
    /// whatever was there.
    pub fn stage(
        &self,
        component: &ComponentName,
        artifact: &GeneratedArtifact,
    ) -> Result<Vec<StagedFile>, PipelineError> {
        let dir = self.staged_dir(component);
        std::fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

        let mut staged = Vec::with_capacity(ComponentFile::ALL.len());
        for file in ComponentFile::ALL {
            let body = match file {
                ComponentFile::Script => &artifact.script,
                ComponentFile::Markup => &artifact.markup,
                ComponentFile::Stylesheet => &artifact.stylesheet,
            };
            let path = dir.join(component.file_name(file));
            std::fs::write(&path, body).map_err(|e| PipelineError::io(&path, e))?;
            staged.push(StagedFile {
                size_bytes: body.len() as u64,
                path,
            });
        }

        tracing::info!(dir = %dir.display(), "files staged");
        Ok(staged)
    }

    /// Mirror the staged component into `{components_dir}/{component}/`.
    ///
    /// An existing destination is cleared through the remover first; if it
    /// survives, staged files are copied over it one by one.
    pub fn promote(&self, component: &ComponentName) -> Result<PathBuf, PipelineError> {
        let src = self.staged_dir(component);
        let dest = self.promoted_dir(component);

        if dest.exists() {
            let outcome = self
                .remover
                .remove(&dest)
                .map_err(|e| PipelineError::io(&dest, e))?;
            tracing::debug!(?outcome, "cleared previous promotion");
        }
        if dest.exists() {
            tracing::warn!(dest = %dest.display(), "overwriting files in place");
        }
        copy_tree(&src, &dest)?;

        tracing::info!(dest = %dest.display(), "component promoted");
        Ok(dest)
    }

    /// Remove the promoted component directory.
    pub fn unpromote(&self, component: &ComponentName) -> Result<RemovalOutcome, PipelineError> {
        let dest = self.promoted_dir(component);
        let outcome = self
            .remover
            .remove(&dest)
            .map_err(|e| PipelineError::io(&dest, e))?;
        match &outcome {
            RemovalOutcome::Failed => tracing::warn!(
                dest = %dest.display(),
                "could not fully remove component; routes will still be reverted"
            ),
            other => tracing::info!(dest = %dest.display(), outcome = ?other, "component removed"),
        }
        Ok(outcome)
    }
}

/// Copy every file under `src` into `dest`, creating directories and
/// overwriting existing files.
fn copy_tree(src: &Path, dest: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dest).map_err(|e| PipelineError::io(dest, e))?;
    let entries = std::fs::read_dir(src).map_err(|e| PipelineError::io(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(src, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if from.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).map_err(|e| PipelineError::io(&to, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remover::RetryingRemover;
    use std::io;

    struct StuckRemover;

    impl DirectoryRemover for StuckRemover {
        fn remove(&self, _path: &Path) -> io::Result<RemovalOutcome> {
            Ok(RemovalOutcome::Failed)
        }
    }

    fn artifact() -> GeneratedArtifact {
        GeneratedArtifact {
            script: "export class HeroBannerComponent {}".to_string(),
            markup: "<div class=\"card\"></div>".to_string(),
            stylesheet: String::new(),
        }
    }

    fn component() -> ComponentName {
        ComponentName::parse("hero-banner").unwrap()
    }

    fn publisher(root: &Path, remover: Box<dyn DirectoryRemover>) -> Publisher {
        Publisher::new(root.join("staging"), root.join("app/components"), remover)
    }

    #[test]
    fn test_stage_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), Box::new(RetryingRemover::default()));

        let staged = p.stage(&component(), &artifact()).unwrap();
        let names: Vec<String> = staged
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "hero-banner.component.ts",
                "hero-banner.component.html",
                "hero-banner.component.scss"
            ]
        );
        assert_eq!(staged[2].size_bytes, 0);
        assert!(staged[2].path.exists());
    }

    #[test]
    fn test_stage_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), Box::new(RetryingRemover::default()));
        p.stage(&component(), &artifact()).unwrap();

        let mut second = artifact();
        second.markup = "<p>v2</p>".to_string();
        p.stage(&component(), &second).unwrap();

        let html = std::fs::read_to_string(
            p.staged_dir(&component()).join("hero-banner.component.html"),
        )
        .unwrap();
        assert_eq!(html, "<p>v2</p>");
    }

    #[test]
    fn test_promote_replaces_previous_tree() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), Box::new(RetryingRemover::default()));
        let dest = p.promoted_dir(&component());
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("stale.txt"), "old").unwrap();

        p.stage(&component(), &artifact()).unwrap();
        let promoted = p.promote(&component()).unwrap();

        assert_eq!(promoted, dest);
        assert!(!dest.join("stale.txt").exists());
        assert_eq!(
            std::fs::read_to_string(dest.join("hero-banner.component.ts")).unwrap(),
            "export class HeroBannerComponent {}"
        );
    }

    #[test]
    fn test_promote_overwrites_when_removal_fails() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), Box::new(StuckRemover));
        let dest = p.promoted_dir(&component());
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("hero-banner.component.ts"), "old").unwrap();
        std::fs::write(dest.join("stale.txt"), "old").unwrap();

        p.stage(&component(), &artifact()).unwrap();
        p.promote(&component()).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("hero-banner.component.ts")).unwrap(),
            "export class HeroBannerComponent {}"
        );
        assert!(dest.join("stale.txt").exists());
    }

    #[test]
    fn test_promote_without_staging_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), Box::new(RetryingRemover::default()));
        assert!(matches!(
            p.promote(&component()),
            Err(PipelineError::Io { .. })
        ));
    }

    #[test]
    fn test_unpromote() {
        let dir = tempfile::tempdir().unwrap();
        let p = publisher(dir.path(), Box::new(RetryingRemover::default()));
        p.stage(&component(), &artifact()).unwrap();
        p.promote(&component()).unwrap();

        assert_eq!(p.unpromote(&component()).unwrap(), RemovalOutcome::Removed);
        assert!(!p.promoted_dir(&component()).exists());
        assert_eq!(p.unpromote(&component()).unwrap(), RemovalOutcome::Absent);
    }
}
