//! Panic hook for terminal restoration.

use std::io;
use std::panic;

/// Restore the terminal before the previous hook prints the panic.
///
/// Call once, early in `main`, before entering the terminal session.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        super::restore(&mut io::stdout());
        tracing::error!(%info, "panic");
        previous(info);
    }));
}
