use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status after a second Ctrl-C
pub const INTERRUPTED: i32 = 130;

/// Route Ctrl-C to `cancel`.
///
/// The first interrupt raises the flag so an in-flight download stops and its
/// temporary file is dropped; a second one exits immediately.
pub fn cancel_on_interrupt(cancel: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if !raise(&cancel) {
            process::exit(INTERRUPTED);
        }
    })
}

/// Raise the flag; `false` if it was already raised
fn raise(cancel: &AtomicBool) -> bool {
    let first = !cancel.swap(true, Ordering::SeqCst);
    if first {
        tracing::warn!("interrupted, cancelling (press Ctrl-C again to exit)");
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_interrupt_raises_flag() {
        let cancel = AtomicBool::new(false);
        assert!(raise(&cancel));
        assert!(cancel.load(Ordering::SeqCst));
    }

    #[test]
    fn test_second_interrupt_requests_exit() {
        let cancel = AtomicBool::new(false);
        raise(&cancel);
        assert!(!raise(&cancel));
        assert!(cancel.load(Ordering::SeqCst));
    }
}
