//! Local file access.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
};

use dropseal_core::FileSystem;

/// [`FileSystem`] over `std::fs`.
///
/// Refuses to replace an existing file unless built with
/// [`overwriting`](Self::overwriting).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs {
    overwrite: bool,
}

impl LocalFs {
    /// File access that never replaces existing files.
    pub fn new() -> Self {
        Self::default()
    }

    /// File access that replaces existing files.
    pub fn overwriting() -> Self {
        Self { overwrite: true }
    }
}

impl FileSystem for LocalFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }
}
