//! SIGINT handling for the moments the terminal is not in raw mode.
//!
//! While a key is being read, Ctrl-C arrives as a plain byte. Outside of that
//! (sleeping, talking to the bus) it is a real signal, which only raises a flag
//! here so the main loop can shut down the same way it does for the exit key.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Installs the SIGINT handler. `SA_RESTART` is left off, so a blocked read
/// returns early with `EINTR`.
pub fn install() -> io::Result<()> {
    let handler: extern "C" fn(libc::c_int) = on_sigint;
    let result = unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut())
    };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Gets whether SIGINT was received since the handler was installed.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigint_raises_the_flag() {
        install().unwrap();
        assert_eq!(unsafe { libc::raise(libc::SIGINT) }, 0);
        assert!(interrupted());
    }
}
