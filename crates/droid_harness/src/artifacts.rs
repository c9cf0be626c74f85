//! Result-tree layout and dated artifact names
//!
//! Artifacts live under `<root>/<category dir>/<YYYY-MM-DD>/<name>.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::time_util::{self, TimeFormat};

/// Kind of artifact, which fixes its directory and file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactCategory {
    Log,
    Html,
    Img,
    /// Element crops
    CutImg,
}

impl ArtifactCategory {
    pub const ALL: [ArtifactCategory; 4] = [
        ArtifactCategory::Log,
        ArtifactCategory::Html,
        ArtifactCategory::Img,
        ArtifactCategory::CutImg,
    ];

    pub fn directory(self) -> &'static str {
        match self {
            ArtifactCategory::Log => "log",
            ArtifactCategory::Html => "report",
            ArtifactCategory::Img => "img",
            ArtifactCategory::CutImg => "cut_img",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactCategory::Log => "log",
            ArtifactCategory::Html => "html",
            ArtifactCategory::Img | ArtifactCategory::CutImg => "png",
        }
    }
}

/// Directories making up the result tree for one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTree {
    pub root: PathBuf,
    pub log_dir: PathBuf,
    pub report_dir: PathBuf,
    pub img_dir: PathBuf,
    pub cut_img_dir: PathBuf,
    pub day_log_dir: PathBuf,
    pub day_report_dir: PathBuf,
    pub day_img_dir: PathBuf,
    pub day_cut_img_dir: PathBuf,
}

impl DirectoryTree {
    /// Every directory in creation order, parents first
    pub fn all(&self) -> Vec<&Path> {
        vec![
            &self.root,
            &self.log_dir,
            &self.report_dir,
            &self.img_dir,
            &self.cut_img_dir,
            &self.day_log_dir,
            &self.day_report_dir,
            &self.day_img_dir,
            &self.day_cut_img_dir,
        ]
    }
}

/// Produces dated paths inside a result root
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    root: PathBuf,
}

impl ArtifactNamer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn day_dir(&self, category: ArtifactCategory, day: &str) -> PathBuf {
        self.root.join(category.directory()).join(day)
    }

    fn tree_for(&self, day: &str) -> DirectoryTree {
        DirectoryTree {
            root: self.root.clone(),
            log_dir: self.root.join(ArtifactCategory::Log.directory()),
            report_dir: self.root.join(ArtifactCategory::Html.directory()),
            img_dir: self.root.join(ArtifactCategory::Img.directory()),
            cut_img_dir: self.root.join(ArtifactCategory::CutImg.directory()),
            day_log_dir: self.day_dir(ArtifactCategory::Log, day),
            day_report_dir: self.day_dir(ArtifactCategory::Html, day),
            day_img_dir: self.day_dir(ArtifactCategory::Img, day),
            day_cut_img_dir: self.day_dir(ArtifactCategory::CutImg, day),
        }
    }

    /// Compute today's tree, creating missing directories when `create` is set.
    ///
    /// Calling it repeatedly is harmless.
    pub fn ensure_directory_tree(&self, create: bool) -> Result<DirectoryTree> {
        let tree = self.tree_for(&time_util::timestamp(TimeFormat::Day));
        if create {
            for dir in tree.all() {
                if !dir.exists() {
                    debug!("Creating {}", dir.display());
                }
                fs::create_dir_all(dir)?;
            }
        }
        Ok(tree)
    }

    /// Path for a new artifact; unnamed artifacts are stamped with the current time
    pub fn name_artifact(&self, category: ArtifactCategory, basename: Option<&str>) -> Result<PathBuf> {
        let path = self.name_artifact_at(category, basename, Local::now());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Path for an artifact at `instant`, without touching the filesystem
    pub fn name_artifact_at(
        &self,
        category: ArtifactCategory,
        basename: Option<&str>,
        instant: DateTime<Local>,
    ) -> PathBuf {
        let day = time_util::format_at(TimeFormat::Day, instant);
        let file = match basename {
            Some(name) => format!("{}.{}", name, category.extension()),
            None => format!(
                "{}.{}",
                time_util::format_at(TimeFormat::Now, instant),
                category.extension()
            ),
        };
        self.day_dir(category, &day).join(file)
    }

    /// Lexicographically last file name in today's bucket of `category`
    pub fn latest_artifact(&self, category: ArtifactCategory) -> Result<String> {
        let dir = self.day_dir(category, &time_util::timestamp(TimeFormat::Day));
        latest_in(&dir)
    }
}

fn latest_in(dir: &Path) -> Result<String> {
    let entries = fs::read_dir(dir).map_err(|_| HarnessError::ArtifactNotFound(dir.to_path_buf()))?;

    let mut latest: Option<String> = None;
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if latest.as_ref().map_or(true, |current| name > *current) {
            latest = Some(name);
        }
    }

    latest.ok_or_else(|| HarnessError::ArtifactNotFound(dir.to_path_buf()))
}
