//! Effects a module hands back to the event loop.
//!
//! Modules never spawn work or touch focus state themselves. They return
//! [`Commands`]: futures to run off the loop (their results come back as a
//! [`ModuleMessage`]) and [`UiMessage`]s for the orchestrator.

use std::any::Any;
use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

/// Result of a module's async work, opaque to the orchestrator.
///
/// Only the module that issued the work knows the concrete type and
/// downcasts it back.
pub struct ModuleMessage(Box<dyn Any + Send>);

impl ModuleMessage {
    pub fn new<T: Any + Send>(payload: T) -> Self {
        Self(Box::new(payload))
    }

    /// Recover the concrete payload, or get the message back untouched.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.0.downcast::<T>() {
            Ok(payload) => Ok(*payload),
            Err(other) => Err(Self(other)),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for ModuleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModuleMessage(..)")
    }
}

/// Requests to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    /// Show a transient message in the status bar.
    Toast(String),
    /// Make another module active.
    SwitchModule(String),
    /// Open the command palette with a pre-filled filter.
    OpenPalette { filter: String },
    /// Leave the module and return to the Home view.
    GoHome,
    /// Set the module's client up again after initialization failed.
    Reinitialize,
}

/// Future whose output is delivered back to the issuing module.
pub type Work = BoxFuture<'static, ModuleMessage>;

pub enum Command {
    Spawn(Work),
    Ui(UiMessage),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Spawn(_) => f.write_str("Spawn(..)"),
            Command::Ui(msg) => f.debug_tuple("Ui").field(msg).finish(),
        }
    }
}

/// Ordered batch of commands.
#[derive(Debug, Default)]
pub struct Commands(Vec<Command>);

impl Commands {
    pub fn none() -> Self {
        Self::default()
    }

    /// Run `fut` off the loop; its output is routed back to the module.
    pub fn spawn<F, T>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Any + Send,
    {
        Self::none().and_spawn(fut)
    }

    pub fn ui(msg: UiMessage) -> Self {
        Self::none().and_ui(msg)
    }

    pub fn and_spawn<F, T>(mut self, fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Any + Send,
    {
        self.0.push(Command::Spawn(fut.map(ModuleMessage::new).boxed()));
        self
    }

    pub fn and_ui(mut self, msg: UiMessage) -> Self {
        self.0.push(Command::Ui(msg));
        self
    }

    pub fn extend(&mut self, other: Commands) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// UI messages in the batch, for assertions.
    pub fn ui_messages(&self) -> impl Iterator<Item = &UiMessage> {
        self.0.iter().filter_map(|command| match command {
            Command::Ui(msg) => Some(msg),
            Command::Spawn(_) => None,
        })
    }

    pub fn spawn_count(&self) -> usize {
        self.0
            .iter()
            .filter(|command| matches!(command, Command::Spawn(_)))
            .count()
    }
}

impl IntoIterator for Commands {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_downcast_roundtrip() {
        let msg = ModuleMessage::new(42u32);
        assert!(msg.is::<u32>());
        let msg = msg.downcast::<String>().unwrap_err();
        assert_eq!(msg.downcast::<u32>().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_spawned_work_yields_module_message() {
        let commands = Commands::spawn(async { "done".to_string() }).and_ui(UiMessage::GoHome);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands.spawn_count(), 1);
        assert_eq!(commands.ui_messages().collect::<Vec<_>>(), vec![&UiMessage::GoHome]);

        for command in commands {
            if let Command::Spawn(work) = command {
                let msg = work.await;
                assert_eq!(msg.downcast::<String>().unwrap(), "done");
            }
        }
    }
}
