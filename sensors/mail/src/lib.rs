//! Unread-mail flag for dwmstatus-rs.
//!
//! Asks a mail indexer (notmuch by default) how many messages match its query
//! and shows a marker when there are any.

pub mod mail;

pub use mail::{MailSampler, MAIL_MARKER};
