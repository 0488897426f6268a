use std::fmt::{Debug, Formatter};
use std::io::{self, Read, Stdin};
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, RawFd};
use log::trace;
use crate::HalResult;
use crate::keyboard::{Key, Keyboard};

/// Reads single keystrokes from standard input.
///
/// When stdin is a terminal, it is switched to raw mode for the duration of
/// each read only, so nothing is echoed and no newline is needed, while output
/// between reads behaves normally. Keys typed while no read was pending are
/// discarded on entry, so a held key does not queue up commands.
pub struct TerminalKeyboard {
    stdin: Stdin,
    tty: bool,
}

impl TerminalKeyboard {
    pub fn new() -> Self {
        let stdin = io::stdin();
        let tty = unsafe { libc::isatty(stdin.as_raw_fd()) } == 1;
        Self { stdin, tty }
    }

    /// Gets whether stdin is an interactive terminal.
    pub fn is_tty(&self) -> bool {
        self.tty
    }
}

/// Reads one key from `reader`.
///
/// A read cut short by a signal counts as [Key::Interrupt], so a SIGINT that
/// arrives while blocked here ends the session instead of being retried.
fn read_key_from(reader: &mut impl Read) -> HalResult<Key> {
    let mut buf = [0u8; 1];
    match reader.read(&mut buf) {
        Ok(0) => Ok(Key::EndOfInput),
        Ok(_) => Ok(Key::from_byte(buf[0])),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Key::Interrupt),
        Err(e) => Err(e.into()),
    }
}

impl Default for TerminalKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TerminalKeyboard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TerminalKeyboard(stdin, tty: {})", self.tty)
    }
}

impl Keyboard for TerminalKeyboard {
    fn read_key(&mut self) -> HalResult<Key> {
        let _guard = if self.tty {
            Some(RawModeGuard::enter(self.stdin.as_raw_fd())?)
        } else {
            None
        };

        let key = read_key_from(&mut self.stdin.lock())?;
        trace!("Read key: {:?}", key);
        Ok(key)
    }
}

/// Puts a terminal in raw mode and restores its previous attributes on drop.
struct RawModeGuard {
    fd: RawFd,
    saved: libc::termios,
}

impl RawModeGuard {
    fn enter(fd: RawFd) -> io::Result<Self> {
        let mut saved = MaybeUninit::<libc::termios>::uninit();
        if unsafe { libc::tcgetattr(fd, saved.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let saved = unsafe { saved.assume_init() };

        let mut raw = saved;
        unsafe { libc::cfmakeraw(&mut raw) };
        // Drops input typed since the last read.
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { fd, saved })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Let pending output drain before the attributes change back.
        unsafe { libc::tcsetattr(self.fd, libc::TCSADRAIN, &self.saved) };
    }
}
