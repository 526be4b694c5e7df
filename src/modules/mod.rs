//! Built-in resource modules.

pub mod resource;

pub use resource::{ResourceClient, ResourceKind, ResourceModule, BUCKETS, DATABASES, INSTANCES, QUEUES};

use crate::error::RegistryError;
use crate::module::Module;
use crate::registry::{ModuleDescriptor, Registry};

/// Kinds registered by [`register_builtin`], in sidebar order.
pub const BUILTIN_KINDS: [ResourceKind; 4] = [INSTANCES, DATABASES, BUCKETS, QUEUES];

pub fn descriptor(kind: ResourceKind) -> ModuleDescriptor {
    ModuleDescriptor::new(kind.key, kind.title, move |_ctx| {
        Ok(Box::new(ResourceModule::new(kind)) as Box<dyn Module>)
    })
    .with_summary(resource::summary_query(kind))
}

/// Register every built-in module.
pub fn register_builtin(registry: &mut Registry) -> Result<(), RegistryError> {
    for kind in BUILTIN_KINDS {
        registry.register(descriptor(kind))?;
    }
    Ok(())
}
