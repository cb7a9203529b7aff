//! A markup tree bound to the file it was read from or will be written to.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::XmlTree;
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::xml;

#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub tree: XmlTree,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, tree: XmlTree) -> Self {
        Self {
            path: path.into(),
            tree,
        }
    }

    /// Read and parse `path`.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> ApplicationResult<Self> {
        let source = fs.read_to_string(path).or_read_failure(path)?;
        let tree = parse(path, &source)?;
        debug!("loaded {} ({} nodes)", path.display(), tree.len());
        Ok(Self::new(path, tree))
    }

    /// Serialize to `path`, creating parent directories.
    pub fn save(&self, fs: &dyn FileSystem) -> ApplicationResult<()> {
        let content = xml::to_string(&self.tree).map_err(|e| ApplicationError::Parse {
            path: self.path.clone(),
            message: e.message,
        })?;
        fs.ensure_parent(&self.path).or_write_failure(&self.path)?;
        fs.write(&self.path, &content).or_write_failure(&self.path)?;
        debug!("wrote {}", self.path.display());
        Ok(())
    }

    /// Directory against which references in this document resolve.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn parse(path: &Path, source: &str) -> ApplicationResult<XmlTree> {
    xml::parse_str(source).map_err(|e| ApplicationError::Parse {
        path: path.to_path_buf(),
        message: e.message,
    })
}
