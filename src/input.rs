//! Cancel-key handling for the acquisition loop.
//!
//! The loop polls the terminal for ESC with a short timeout each iteration.
//! The terminal runs in raw mode while the preview is live so keypresses
//! arrive unbuffered; a guard restores the terminal on exit and on panic.

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Static flag to track if raw mode is active (for the panic handler)
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Global flag for handling Ctrl+C across the application
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been received.
pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        // The terminal may be in raw mode when the signal lands, so the
        // line needs an explicit carriage return.
        eprint!("\r\nReceived Ctrl+C, shutting down...\r\n");
    })
}

/// Poll the terminal for the cancel key, waiting at most `timeout`.
///
/// Returns `Ok(true)` on ESC. Ctrl+C pressed inside a raw-mode terminal
/// arrives as a key event rather than SIGINT, so it cancels here too.
pub fn poll_cancel_key(timeout: Duration) -> io::Result<bool> {
    if !event::poll(timeout)? {
        return Ok(false);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        if key.code == KeyCode::Esc {
            return Ok(true);
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Guard that ensures the terminal is restored to normal mode on drop.
/// This handles both normal exits and panics.
pub struct RawModeGuard {
    /// Whether this guard is responsible for cleanup
    active: bool,
}

impl RawModeGuard {
    /// Enter raw mode and return a guard that will restore it on drop.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        Ok(Self { active: true })
    }

    /// Manually exit raw mode without dropping the guard.
    /// After calling this, the guard's drop is a no-op.
    pub fn exit(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
            disable_raw_mode()?;
        }
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
            // Best-effort cleanup - ignore errors during drop
            let _ = disable_raw_mode();
        }
    }
}

/// Install a panic hook that restores terminal state before panicking.
fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return; // Already installed
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if RAW_MODE_ACTIVE.load(Ordering::SeqCst) {
            let _ = disable_raw_mode();
            RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
        }
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrlc_flag_starts_clear() {
        assert!(!ctrlc_received());
    }
}
