//! Module registry: factories registered at startup, instances built lazily.
//!
//! The registry exclusively owns every constructed module. The app only
//! borrows the active one for the duration of a single message.
//!
//! Two failure modes are kept apart:
//! - the factory fails: nothing is cached, the next access constructs again;
//! - `initialize` fails: the instance is cached in its error state and the
//!   next access retries `initialize` on it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{ModuleError, RegistryError};
use crate::module::{Module, ModuleContext};

/// Builds a module for the given context.
pub type ModuleFactory =
    Arc<dyn Fn(&ModuleContext) -> Result<Box<dyn Module>, ModuleError> + Send + Sync>;

/// Cheap read-only query used by the Home overview.
pub type SummaryQuery =
    Arc<dyn Fn(&ModuleContext) -> BoxFuture<'static, Result<String, ModuleError>> + Send + Sync>;

/// Registration record for one module.
#[derive(Clone)]
pub struct ModuleDescriptor {
    pub key: String,
    pub title: String,
    factory: ModuleFactory,
    summary: Option<SummaryQuery>,
}

impl ModuleDescriptor {
    pub fn new<F>(key: impl Into<String>, title: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ModuleContext) -> Result<Box<dyn Module>, ModuleError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            title: title.into(),
            factory: Arc::new(factory),
            summary: None,
        }
    }

    pub fn with_summary<F>(mut self, query: F) -> Self
    where
        F: Fn(&ModuleContext) -> BoxFuture<'static, Result<String, ModuleError>>
            + Send
            + Sync
            + 'static,
    {
        self.summary = Some(Arc::new(query));
        self
    }

    pub fn has_summary(&self) -> bool {
        self.summary.is_some()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("summary", &self.summary.is_some())
            .finish()
    }
}

struct Slot {
    module: Box<dyn Module>,
    /// Whether the last `initialize`/`reinitialize` succeeded.
    initialized: bool,
}

#[derive(Default)]
pub struct Registry {
    descriptors: Vec<ModuleDescriptor>,
    index: HashMap<String, usize>,
    instances: HashMap<String, Slot>,
    failures: HashMap<String, RegistryError>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("descriptors", &self.descriptors)
            .field("constructed", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Keys are unique; a duplicate is a startup error.
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
        if self.index.contains_key(&descriptor.key) {
            return Err(RegistryError::DuplicateKey(descriptor.key));
        }
        self.index
            .insert(descriptor.key.clone(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Descriptors in registration (navigation) order.
    pub fn descriptors(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, key: &str) -> Option<&ModuleDescriptor> {
        self.index.get(key).map(|&idx| &self.descriptors[idx])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn is_constructed(&self, key: &str) -> bool {
        self.instances.contains_key(key)
    }

    /// Whether `key` is constructed and its last initialization succeeded.
    pub fn is_initialized(&self, key: &str) -> bool {
        self.instances.get(key).is_some_and(|slot| slot.initialized)
    }

    /// Last construction or initialization failure for `key`, cleared on
    /// success.
    pub fn last_error(&self, key: &str) -> Option<&RegistryError> {
        self.failures.get(key)
    }

    /// Borrow a constructed module without constructing it.
    pub fn get(&self, key: &str) -> Option<&dyn Module> {
        self.instances.get(key).map(|slot| slot.module.as_ref())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut dyn Module> {
        match self.instances.get_mut(key) {
            Some(slot) => Some(slot.module.as_mut()),
            None => None,
        }
    }

    /// Return the module for `key`, constructing and initializing it on first
    /// access.
    pub fn get_or_initialize(
        &mut self,
        key: &str,
        ctx: &ModuleContext,
    ) -> Result<&mut dyn Module, RegistryError> {
        let Some(&idx) = self.index.get(key) else {
            return Err(RegistryError::UnknownKey(key.to_string()));
        };

        if !self.instances.contains_key(key) {
            let module = match (self.descriptors[idx].factory)(ctx) {
                Ok(module) => module,
                Err(source) => {
                    tracing::warn!(module = key, error = %source, "module construction failed");
                    let err = RegistryError::Construction {
                        key: key.to_string(),
                        source,
                    };
                    self.failures.insert(key.to_string(), err.clone());
                    return Err(err);
                }
            };
            tracing::info!(module = key, project = %ctx.project, "module constructed");
            self.instances.insert(
                key.to_string(),
                Slot {
                    module,
                    initialized: false,
                },
            );
        }

        let Some(slot) = self.instances.get_mut(key) else {
            return Err(RegistryError::UnknownKey(key.to_string()));
        };

        if !slot.initialized {
            if let Err(source) = slot.module.initialize(ctx) {
                tracing::warn!(module = key, error = %source, "module initialization failed");
                let err = RegistryError::Initialization {
                    key: key.to_string(),
                    source,
                };
                self.failures.insert(key.to_string(), err.clone());
                return Err(err);
            }
            slot.initialized = true;
        }

        self.failures.remove(key);
        Ok(slot.module.as_mut())
    }

    /// Re-point every constructed module at `ctx.project`.
    ///
    /// Never-constructed modules are left alone; they pick up the new
    /// project on first access. One module failing does not stop the
    /// others; every failure is returned.
    pub fn reinitialize_all(&mut self, ctx: &ModuleContext) -> Vec<RegistryError> {
        let mut errors = Vec::new();

        for descriptor in &self.descriptors {
            let key = descriptor.key.as_str();
            let Some(slot) = self.instances.get_mut(key) else {
                continue;
            };

            match slot.module.reinitialize(ctx) {
                Ok(()) => {
                    slot.initialized = true;
                    self.failures.remove(key);
                }
                Err(source) => {
                    tracing::warn!(module = key, project = %ctx.project, error = %source, "reinitialize failed");
                    slot.initialized = false;
                    let err = RegistryError::Initialization {
                        key: key.to_string(),
                        source,
                    };
                    self.failures.insert(key.to_string(), err.clone());
                    errors.push(err);
                }
            }
        }

        errors
    }

    /// Summary queries of every descriptor that provides one, labelled by
    /// module key, in registration order.
    pub fn summary_queries(
        &self,
        ctx: &ModuleContext,
    ) -> Vec<(String, BoxFuture<'static, Result<String, ModuleError>>)> {
        self.descriptors
            .iter()
            .filter_map(|d| d.summary.as_ref().map(|query| (d.key.clone(), query(ctx))))
            .collect()
    }
}
