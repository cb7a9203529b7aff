//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{BookService, ResolverService, SplitterService};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{AsciiRomanizer, ChapterNormalizer, Romanizer, RuleStylesheet, Stylesheet};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding shared collaborators; services are built on demand.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Title transliteration for file names
    pub romanizer: Arc<dyn Romanizer>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(AsciiRomanizer))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        romanizer: Arc<dyn Romanizer>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            romanizer,
        }
    }

    /// The configured stylesheet, or the built-in one.
    pub fn stylesheet(&self) -> ApplicationResult<Arc<dyn Stylesheet>> {
        let sheet = match &self.settings.stylesheet {
            Some(path) => {
                debug!("stylesheet: {}", path.display());
                let source = self
                    .fs
                    .read_to_string(path)
                    .with_path_context("read stylesheet", path)
                    .map_err(|e| ApplicationError::Config {
                        message: e.to_string(),
                    })?;
                RuleStylesheet::from_toml(&source)?
            }
            None => RuleStylesheet::builtin()?,
        };
        Ok(Arc::new(sheet))
    }

    /// Resolver that inlines references unchanged.
    pub fn resolver(&self) -> ResolverService {
        ResolverService::new(Arc::clone(&self.fs), Arc::clone(&self.settings))
    }

    /// Resolver that normalizes chapter content on the way in.
    pub fn normalizing_resolver(&self) -> ApplicationResult<ResolverService> {
        let normalizer = ChapterNormalizer::new(self.stylesheet()?);
        Ok(self.resolver().with_normalizer(Arc::new(normalizer)))
    }

    pub fn splitter(&self) -> SplitterService {
        SplitterService::new(
            Arc::clone(&self.fs),
            Arc::clone(&self.settings),
            Arc::clone(&self.romanizer),
        )
    }

    pub fn book_service(&self) -> BookService {
        BookService::new(Arc::clone(&self.fs))
    }
}
