//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use cloudeck::app::{App, AppMessage};
use cloudeck::error::ModuleError;
use cloudeck::module::Module;
use cloudeck::registry::{ModuleDescriptor, Registry};
use cloudeck::testing::{test_context, FakeModule, FakeProbe};
use tokio::sync::mpsc::UnboundedReceiver;

/// Descriptor for a [`FakeModule`] reporting to `probe`.
pub fn fake(key: &str, probe: &FakeProbe) -> ModuleDescriptor {
    let probe = probe.clone();
    let module_key = key.to_string();
    ModuleDescriptor::new(key, key.to_uppercase(), move |_ctx| {
        Ok(Box::new(FakeModule::new(&module_key, probe.clone())) as Box<dyn Module>)
    })
}

/// Descriptor whose factory fails the first `failures` calls. The returned
/// counter counts every factory call.
pub fn flaky(key: &str, probe: &FakeProbe, failures: u32) -> (ModuleDescriptor, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let probe = probe.clone();
    let module_key = key.to_string();
    let descriptor = ModuleDescriptor::new(key, key.to_uppercase(), move |_ctx| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        if n < failures {
            Err(ModuleError::init(module_key.clone(), "client not ready"))
        } else {
            Ok(Box::new(FakeModule::new(&module_key, probe.clone())) as Box<dyn Module>)
        }
    });
    (descriptor, calls)
}

/// App on project "alpha" over the given descriptors, with its receiver.
pub fn app_with(descriptors: Vec<ModuleDescriptor>) -> (App, UnboundedReceiver<AppMessage>) {
    let mut registry = Registry::new();
    for descriptor in descriptors {
        registry.register(descriptor).unwrap();
    }
    let mut app = App::with_context(registry, test_context("alpha"));
    let rx = app.message_rx.take().unwrap();
    (app, rx)
}

/// Receive and handle `n` messages.
pub async fn pump(app: &mut App, rx: &mut UnboundedReceiver<AppMessage>, n: usize) {
    for _ in 0..n {
        let msg = rx.recv().await.expect("message channel closed");
        app.handle_message(msg);
    }
}
