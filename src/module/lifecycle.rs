//! Per-module state machine.
//!
//! ```text
//! Uninitialized --initialize--> Ready            (Error on failure)
//! Ready | Loaded | Error --refresh--> Loading --> Loaded | Error
//! Loaded --action--> Confirming --confirm--> Loading
//!                               --cancel---> Loaded
//! any --reset--> Ready (once initialized)
//! ```

use std::fmt;

/// Observable state of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleState {
    #[default]
    Uninitialized,
    Ready,
    Loading,
    Loaded,
    Error,
    Confirming,
}

impl ModuleState {
    pub fn label(&self) -> &'static str {
        match self {
            ModuleState::Uninitialized => "uninitialized",
            ModuleState::Ready => "ready",
            ModuleState::Loading => "loading",
            ModuleState::Loaded => "loaded",
            ModuleState::Error => "error",
            ModuleState::Confirming => "confirming",
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Guarded transitions over [`ModuleState`].
///
/// Every transition method returns whether it applied; callers drop the
/// triggering event when it did not (e.g. a fetch result arriving after a
/// reset).
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: ModuleState,
    initialized: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Whether the client behind the module is set up.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn initialized(&mut self) {
        self.initialized = true;
        self.state = ModuleState::Ready;
    }

    pub fn init_failed(&mut self) {
        self.initialized = false;
        self.state = ModuleState::Error;
    }

    /// Drop the client; the next `initialize` starts from scratch.
    pub fn teardown(&mut self) {
        self.initialized = false;
        self.state = ModuleState::Uninitialized;
    }

    /// Ready/Loaded (or Error after a failed fetch) -> Loading.
    pub fn begin_refresh(&mut self) -> bool {
        let allowed = self.initialized
            && matches!(
                self.state,
                ModuleState::Ready | ModuleState::Loaded | ModuleState::Error
            );
        if allowed {
            self.state = ModuleState::Loading;
        }
        allowed
    }

    pub fn load_succeeded(&mut self) -> bool {
        self.finish_load(ModuleState::Loaded)
    }

    pub fn load_failed(&mut self) -> bool {
        self.finish_load(ModuleState::Error)
    }

    fn finish_load(&mut self, next: ModuleState) -> bool {
        if self.state == ModuleState::Loading {
            self.state = next;
            true
        } else {
            false
        }
    }

    pub fn request_confirmation(&mut self) -> bool {
        if self.state == ModuleState::Loaded {
            self.state = ModuleState::Confirming;
            true
        } else {
            false
        }
    }

    pub fn confirm(&mut self) -> bool {
        if self.state == ModuleState::Confirming {
            self.state = ModuleState::Loading;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) -> bool {
        if self.state == ModuleState::Confirming {
            self.state = ModuleState::Loaded;
            true
        } else {
            false
        }
    }

    /// Back to Ready. A module whose initialization never succeeded keeps its
    /// state so the failure stays visible.
    pub fn reset(&mut self) {
        if self.initialized {
            self.state = ModuleState::Ready;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> Lifecycle {
        let mut lifecycle = Lifecycle::new();
        lifecycle.initialized();
        lifecycle
    }

    #[test]
    fn test_starts_uninitialized() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), ModuleState::Uninitialized);
        assert!(!lifecycle.is_initialized());
    }

    #[test]
    fn test_refresh_cycle() {
        let mut lifecycle = ready();
        assert!(lifecycle.begin_refresh());
        assert_eq!(lifecycle.state(), ModuleState::Loading);
        assert!(!lifecycle.begin_refresh(), "already loading");
        assert!(lifecycle.load_succeeded());
        assert_eq!(lifecycle.state(), ModuleState::Loaded);

        assert!(lifecycle.begin_refresh());
        assert!(lifecycle.load_failed());
        assert_eq!(lifecycle.state(), ModuleState::Error);

        // A failed fetch can be retried.
        assert!(lifecycle.begin_refresh());
    }

    #[test]
    fn test_refresh_requires_initialization() {
        let mut lifecycle = Lifecycle::new();
        assert!(!lifecycle.begin_refresh());

        lifecycle.init_failed();
        assert_eq!(lifecycle.state(), ModuleState::Error);
        assert!(!lifecycle.begin_refresh());
    }

    #[test]
    fn test_confirmation_flow() {
        let mut lifecycle = ready();
        assert!(!lifecycle.request_confirmation(), "nothing loaded yet");

        lifecycle.begin_refresh();
        lifecycle.load_succeeded();
        assert!(lifecycle.request_confirmation());
        assert_eq!(lifecycle.state(), ModuleState::Confirming);
        assert!(lifecycle.cancel());
        assert_eq!(lifecycle.state(), ModuleState::Loaded);

        lifecycle.request_confirmation();
        assert!(lifecycle.confirm());
        assert_eq!(lifecycle.state(), ModuleState::Loading);
    }

    #[test]
    fn test_late_result_after_reset_is_rejected() {
        let mut lifecycle = ready();
        lifecycle.begin_refresh();
        lifecycle.reset();
        assert_eq!(lifecycle.state(), ModuleState::Ready);
        assert!(!lifecycle.load_succeeded());
        assert_eq!(lifecycle.state(), ModuleState::Ready);
    }

    #[test]
    fn test_reset_keeps_init_failure_visible() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.init_failed();
        lifecycle.reset();
        assert_eq!(lifecycle.state(), ModuleState::Error);
    }
}
