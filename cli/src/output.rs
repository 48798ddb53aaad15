//! Terminal output, browser and clipboard shims.
//!
//! URLs asked for with `--print` go to stdout; everything else goes to
//! stderr so `pro open -p | pbcopy` stays clean.

mod error;

pub use error::OutputError;

use anstream::{eprintln, println};
use anstyle::{AnsiColor, Color, Style};
#[cfg(target_os = "linux")]
use std::path::Path;
use std::process::{Command, ExitCode, Stdio};

/// Error style (red).
pub const ERROR: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Success style (green).
pub const SUCCESS: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

/// URL style (blue).
pub const URL: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));

/// Hint style (dimmed).
pub const HINT: Style = Style::new().dimmed();

/// What to do with a resolved URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Open it in the default browser.
    Browser,
    /// Write it to stdout.
    Print,
    /// Copy it to the clipboard.
    Copy,
}

impl Delivery {
    pub fn from_flags(print: bool, copy: bool) -> Self {
        if print {
            Self::Print
        } else if copy {
            Self::Copy
        } else {
            Self::Browser
        }
    }
}

/// Prints an error line followed by an optional hint.
pub fn error(message: &str, hint: Option<&str>) {
    eprintln!("{ERROR}{message}{ERROR:#}");
    if let Some(hint) = hint {
        eprintln!("{HINT}{hint}{HINT:#}");
    }
}

/// Prints an informational line.
pub fn info(message: &str) {
    eprintln!("{message}");
}

/// Prints a success line.
pub fn success(message: &str) {
    eprintln!("{SUCCESS}{message}{SUCCESS:#}");
}

/// Delivers a URL according to the chosen mode.
pub fn deliver(url: &str, delivery: Delivery) -> Result<(), OutputError> {
    match delivery {
        Delivery::Print => {
            println!("{URL}{url}{URL:#}");
            Ok(())
        }
        Delivery::Copy => {
            copy_to_clipboard(url)?;
            eprintln!("Copied to clipboard: {URL}{url}{URL:#}");
            Ok(())
        }
        Delivery::Browser => {
            eprintln!("Opening {URL}{url}{URL:#}");
            open_browser(url)
        }
    }
}

/// Copies text to the system clipboard.
#[cfg(target_os = "linux")]
pub fn copy_to_clipboard(text: &str) -> Result<(), OutputError> {
    // Fails here when no display server is reachable
    arboard::Clipboard::new()?;

    let exe = std::env::current_exe().map_err(OutputError::ClipboardOwner)?;
    clipboard_owner_command(&exe, text)
        .spawn()
        .map(|_| ())
        .map_err(OutputError::ClipboardOwner)
}

/// Copies text to the system clipboard.
#[cfg(not(target_os = "linux"))]
pub fn copy_to_clipboard(text: &str) -> Result<(), OutputError> {
    arboard::Clipboard::new()?.set_text(text.to_string())?;
    Ok(())
}

/// Environment variable carrying the text a clipboard owner process serves.
#[cfg(target_os = "linux")]
const CLIPBOARD_OWNER_ENV: &str = "PRO_CLIPBOARD_OWNER";

#[cfg(target_os = "linux")]
fn clipboard_owner_command(exe: &Path, text: &str) -> Command {
    let mut command = Command::new(exe);
    command
        .env(CLIPBOARD_OWNER_ENV, text)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

/// Runs as the clipboard owner when started by [`copy_to_clipboard`].
///
/// X11 and Wayland selections disappear with the process that set them, so
/// on Linux the copy is served by a background `pro` until another
/// application takes the selection. Returns `None` for a regular run.
#[cfg(target_os = "linux")]
pub fn serve_clipboard() -> Option<ExitCode> {
    use arboard::SetExtLinux;

    let text = std::env::var(CLIPBOARD_OWNER_ENV).ok()?;
    let result =
        arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set().wait().text(text));
    Some(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Clipboard contents outlive the process here; nothing to serve.
#[cfg(not(target_os = "linux"))]
pub fn serve_clipboard() -> Option<ExitCode> {
    None
}

/// Opens a URL with the platform's default handler.
pub fn open_browser(url: &str) -> Result<(), OutputError> {
    let mut command = opener_command(url)?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(OutputError::Browser)
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Result<Command, OutputError> {
    let mut command = Command::new("open");
    command.arg(url);
    Ok(command)
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Result<Command, OutputError> {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", url]);
    Ok(command)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(url: &str) -> Result<Command, OutputError> {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    Ok(command)
}

#[cfg(not(any(unix, target_os = "windows")))]
fn opener_command(_url: &str) -> Result<Command, OutputError> {
    Err(OutputError::UnsupportedPlatform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_wins_over_copy() {
        assert_eq!(Delivery::from_flags(true, true), Delivery::Print);
        assert_eq!(Delivery::from_flags(false, true), Delivery::Copy);
        assert_eq!(Delivery::from_flags(false, false), Delivery::Browser);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn clipboard_owner_gets_text_through_environment() {
        use std::ffi::OsStr;

        let url = "https://github.com/wowu/pro/pull/12";
        let command = clipboard_owner_command(Path::new("/usr/bin/pro"), url);

        assert_eq!(command.get_program(), "/usr/bin/pro");
        assert_eq!(command.get_args().count(), 0);
        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(
            envs,
            vec![(
                OsStr::new(CLIPBOARD_OWNER_ENV),
                Some(OsStr::new(url))
            )]
        );
    }
}
