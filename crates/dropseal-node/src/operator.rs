//! Command-line stand-ins for the interactive collaborators.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use dropseal_core::{CodeSink, Operator, ShareCode};

/// Answers prompts from command-line arguments.
///
/// The peer address comes from `--peer`. The save destination is `--out`
/// when that names a file, `--out` joined with the suggested name when it
/// names a directory, and the suggested name in the working directory
/// otherwise.
#[derive(Debug, Clone, Default)]
pub struct CliOperator {
    peer: Option<String>,
    out: Option<PathBuf>,
}

impl CliOperator {
    /// Operator for one `receive` invocation.
    pub fn new(peer: Option<String>, out: Option<PathBuf>) -> Self {
        Self { peer, out }
    }
}

impl Operator for CliOperator {
    fn peer_address(&self) -> Option<String> {
        self.peer.clone().filter(|peer| !peer.trim().is_empty())
    }

    fn save_destination(&self, suggested_name: &str) -> Option<PathBuf> {
        // The name comes from the sender; never let it pick a directory
        let name = Path::new(suggested_name).file_name().map(PathBuf::from);

        match &self.out {
            Some(out) if out.is_dir() => name.map(|name| out.join(name)),
            Some(out) => Some(out.clone()),
            None => name,
        }
    }
}

/// Prints published codes to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl CodeSink for StdoutSink {
    fn offer(&self, code: &ShareCode) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "share code: {code}")?;
        stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn explicit_file_wins() {
        let operator = CliOperator::new(None, Some(PathBuf::from("/tmp/definitely/out.bin")));
        assert_eq!(
            operator.save_destination("report.pdf"),
            Some(PathBuf::from("/tmp/definitely/out.bin"))
        );
    }

    #[test]
    fn directory_gets_suggested_name() {
        let dir = tempdir().unwrap();
        let operator = CliOperator::new(None, Some(dir.path().to_path_buf()));
        assert_eq!(operator.save_destination("report.pdf"), Some(dir.path().join("report.pdf")));
    }

    #[test]
    fn sender_cannot_escape_the_directory() {
        let dir = tempdir().unwrap();
        let operator = CliOperator::new(None, Some(dir.path().to_path_buf()));

        assert_eq!(
            operator.save_destination("../../etc/passwd"),
            Some(dir.path().join("passwd"))
        );
        assert_eq!(operator.save_destination(".."), None);
    }

    #[test]
    fn default_is_working_directory() {
        let operator = CliOperator::default();
        assert_eq!(operator.save_destination("a.txt"), Some(PathBuf::from("a.txt")));
        assert_eq!(operator.save_destination(""), None);
    }

    #[test]
    fn blank_peer_is_no_peer() {
        assert_eq!(CliOperator::new(Some("  ".into()), None).peer_address(), None);
        assert_eq!(
            CliOperator::new(Some("10.0.0.5".into()), None).peer_address().as_deref(),
            Some("10.0.0.5")
        );
    }
}
