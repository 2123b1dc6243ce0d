//! Path → engine binding

use crate::engine::FileEngine;
use crate::native::NativeEngine;
use crate::path::{self, CleanFlags};
use crate::registry::HandlerRegistry;
use crate::resource::{ResourceBundle, ResourceEngine};
use std::sync::Arc;
use vfe_config::PathConfig;

const TARGET: &str = "vfe::registry";

/// Binds paths to engines.
///
/// The path is normalized, then offered to the handler chain; paths no
/// handler claims go to the resource bundle (`:/...`) or the native file
/// system. Cheap to clone; clones share registry and bundle.
#[derive(Debug, Clone)]
pub struct EngineResolver {
    registry: Arc<HandlerRegistry>,
    resources: Arc<ResourceBundle>,
    flags: CleanFlags,
}

impl EngineResolver {
    pub fn new(registry: Arc<HandlerRegistry>, resources: Arc<ResourceBundle>) -> Self {
        Self {
            registry,
            resources,
            flags: CleanFlags::native(),
        }
    }

    /// Resolver over the process-wide registry and resource bundle
    pub fn global() -> Self {
        Self::new(HandlerRegistry::global(), ResourceBundle::global())
    }

    /// Resolver with its own, empty registry and bundle
    pub fn isolated() -> Self {
        Self::new(Arc::new(HandlerRegistry::new()), Arc::new(ResourceBundle::new()))
    }

    pub fn with_clean_flags(mut self, flags: CleanFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_path_config(self, cfg: &PathConfig) -> Self {
        self.with_clean_flags(CleanFlags::from_config(cfg))
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn resources(&self) -> &Arc<ResourceBundle> {
        &self.resources
    }

    pub fn clean_flags(&self) -> CleanFlags {
        self.flags
    }

    /// `path` normalized with this resolver's syntax
    pub fn clean(&self, path: &str) -> String {
        path::clean_path_with(path, self.flags)
    }

    /// Engine for `path`. Always succeeds: the native engine is the
    /// fallback.
    pub fn create(&self, path: &str) -> Box<dyn FileEngine> {
        let cleaned = self.clean(path);
        if let Some(engine) = self.registry.resolve(&cleaned) {
            return engine;
        }
        if path::is_resource_path(&cleaned) {
            tracing::trace!(target: TARGET, path = %cleaned, "resource engine");
            return Box::new(ResourceEngine::new(Arc::clone(&self.resources), &cleaned));
        }
        tracing::trace!(target: TARGET, path = %cleaned, "native engine");
        Box::new(NativeEngine::new(&cleaned))
    }
}

impl Default for EngineResolver {
    fn default() -> Self {
        Self::global()
    }
}
