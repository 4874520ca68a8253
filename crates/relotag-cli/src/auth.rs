//! Security key acquisition: key file or masked terminal prompt.
//!
//! The interactive prompt disables echo, so the saved terminal state must
//! survive an interrupt: a `ctrlc` handler restores it before the process
//! terminates. Restoration also happens on the normal return path via a
//! scoped guard.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use relotag_core::SecurityKey;
use relotag_core::error::KeySourceError;
use relotag_core::relocate::KeySource;

/// Key source backed by an optional key file, falling back to an
/// interactive masked prompt labeled with the project's token name.
pub struct CliKeySource {
    pub key_file: Option<std::path::PathBuf>,
}

impl KeySource for CliKeySource {
    fn resolve(&self, token_name: &str) -> Result<SecurityKey, KeySourceError> {
        match &self.key_file {
            Some(path) => read_key_file(path),
            None => prompt_security_key(token_name),
        }
    }
}

/// Read the key from a file, trimming only a trailing line break.
pub fn read_key_file(path: &Path) -> Result<SecurityKey, KeySourceError> {
    let raw = fs::read_to_string(path)?;
    let material = raw.trim_end_matches('\n').trim_end_matches('\r');
    if material.is_empty() {
        return Err(KeySourceError::Empty);
    }
    Ok(SecurityKey::new(material))
}

/// Prompt for the key with hidden input.
pub fn prompt_security_key(token_name: &str) -> Result<SecurityKey, KeySourceError> {
    let _guard = terminal::Guard::install();

    eprint!("Enter security key ({token_name}): ");
    io::stderr().flush()?;

    let key = rpassword::read_password()?;
    eprintln!();
    if key.is_empty() {
        return Err(KeySourceError::Empty);
    }
    Ok(SecurityKey::new(key))
}

#[cfg(unix)]
mod terminal {
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use nix::sys::termios::{self, SetArg, Termios};

    static SAVED: OnceLock<Mutex<Option<Termios>>> = OnceLock::new();

    fn saved() -> &'static Mutex<Option<Termios>> {
        SAVED.get_or_init(|| Mutex::new(None))
    }

    /// Scoped capture of the terminal state. While a guard is live, an
    /// interrupt restores the captured state before exiting.
    pub struct Guard;

    impl Guard {
        pub fn install() -> Self {
            if let Ok(state) = termios::tcgetattr(io::stdin()) {
                if let Ok(mut slot) = saved().lock() {
                    *slot = Some(state);
                }
                // Only one handler may ever be registered; later installs
                // reuse it through the shared slot.
                static HANDLER: OnceLock<()> = OnceLock::new();
                HANDLER.get_or_init(|| {
                    let _ = ctrlc::set_handler(restore_and_exit);
                });
            }
            Guard
        }
    }

    impl Drop for Guard {
        fn drop(&mut self) {
            if let Ok(mut slot) = saved().lock() {
                *slot = None;
            }
        }
    }

    fn restore_and_exit() {
        if let Ok(slot) = saved().lock()
            && let Some(state) = slot.as_ref()
        {
            let _ = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, state);
        }
        std::process::exit(i32::from(crate::exit_code::CANCELLED));
    }
}

#[cfg(not(unix))]
mod terminal {
    /// No terminal state to restore off-Unix; rpassword handles echo.
    pub struct Guard;

    impl Guard {
        pub fn install() -> Self {
            Guard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn key_file_is_read_with_trailing_newline_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "c2VjcmV0a2V5").unwrap();
        let key = read_key_file(file.path());
        assert!(key.is_ok());
    }

    #[test]
    fn empty_key_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file).unwrap();
        assert!(matches!(
            read_key_file(file.path()),
            Err(KeySourceError::Empty)
        ));
    }

    #[test]
    fn missing_key_file_is_an_io_error() {
        assert!(matches!(
            read_key_file(std::path::Path::new("/nonexistent/key")),
            Err(KeySourceError::Io(_))
        ));
    }
}
