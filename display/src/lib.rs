//! # dwmstatus-rs-display
//!
//! The X11 side of dwmstatus-rs: dwm shows the root window's `WM_NAME` in its
//! bar, so publishing a status line means setting that property, and reading
//! it back means fetching it.

use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt as _, PropMode, Window};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

/// Errors talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// The display named by `DISPLAY` could not be opened.
    #[error("Could not open display: {0}")]
    Connect(#[from] ConnectError),

    /// The connection failed while sending a request.
    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The server answered a request with an error.
    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),

    /// The server has no screen with the default screen number.
    #[error("Display has no screen {screen}")]
    NoScreen { screen: usize },
}

/// Destination for assembled status lines.
pub trait StatusSink {
    /// Make `status` the visible status line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line could not be delivered.
    fn publish(&mut self, status: &str) -> Result<(), DisplayError>;
}

/// Connection to the X server plus the default screen's root window.
pub struct RootWindow {
    conn: RustConnection,
    root: Window,
}

impl std::fmt::Debug for RootWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootWindow").field("root", &self.root).finish()
    }
}

impl RootWindow {
    /// Connect to the display named by `DISPLAY`.
    pub fn open() -> Result<Self, DisplayError> {
        let (conn, screen) = x11rb::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen)
            .map(|s| s.root)
            .ok_or(DisplayError::NoScreen { screen })?;

        log::debug!("display: connected, root window {:#x}", root);
        Ok(Self { conn, root })
    }

    /// Replace the root window's name and wait until the server has applied it.
    ///
    /// The request is checked, which costs one round trip and keeps the change
    /// from sitting in the output buffer.
    pub fn set_title(&self, title: &str) -> Result<(), DisplayError> {
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.root,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                title.as_bytes(),
            )?
            .check()?;
        Ok(())
    }

    /// Fetch the raw bytes of the root window's name, or `None` if it has none.
    pub fn fetch_title(&self) -> Result<Option<Vec<u8>>, DisplayError> {
        let reply = self
            .conn
            .get_property(false, self.root, AtomEnum::WM_NAME, AtomEnum::ANY, 0, u32::MAX)?
            .reply()?;

        if reply.type_ == u32::from(AtomEnum::NONE) {
            return Ok(None);
        }
        Ok(Some(reply.value))
    }
}

impl StatusSink for RootWindow {
    fn publish(&mut self, status: &str) -> Result<(), DisplayError> {
        self.set_title(status)
    }
}

/// Why the current title could not be read back.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("{0}")]
    Connect(DisplayError),
    #[error("Could not fetch the root window name: {0}")]
    Fetch(DisplayError),
    #[error("The root window has no name")]
    Absent,
}

impl ReadError {
    /// Process exit status reported for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connect(_) => 1,
            Self::Fetch(_) => 2,
            Self::Absent => 3,
        }
    }
}

/// Connect, fetch the root window's name and disconnect.
pub fn read_root_title() -> Result<Vec<u8>, ReadError> {
    let window = RootWindow::open().map_err(ReadError::Connect)?;
    window
        .fetch_title()
        .map_err(ReadError::Fetch)?
        .ok_or(ReadError::Absent)
}
