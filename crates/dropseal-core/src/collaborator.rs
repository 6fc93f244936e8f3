//! Seams to the outside world used by [`ShareManager`](crate::ShareManager).
//!
//! Each trait stands in for a piece of UI or I/O: the file layer, the person
//! answering dialogs, and the clipboard.

use std::{io, path::Path, path::PathBuf};

use crate::code::ShareCode;

/// Raw byte file I/O.
pub trait FileSystem: Send + Sync {
    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or replace a file with `contents`.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The person driving a redemption.
pub trait Operator: Send + Sync {
    /// Address of the sending peer, if the operator knows one.
    fn peer_address(&self) -> Option<String>;

    /// Where to write the decrypted file. `None` cancels the save.
    fn save_destination(&self, suggested_name: &str) -> Option<PathBuf>;
}

/// Receives freshly published share codes (a clipboard, a terminal).
pub trait CodeSink: Send + Sync {
    /// Hand the code over for out-of-band distribution.
    fn offer(&self, code: &ShareCode) -> io::Result<()>;
}
