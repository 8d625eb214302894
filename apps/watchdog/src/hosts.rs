//! Host list loading.
//!
//! The host list is a plain text file with one host name or IP address per
//! line. Leading and trailing whitespace is stripped, and lines that are blank
//! or start with `#` are skipped. Nothing is resolved here; a bad name is only
//! discovered by the worker that monitors it.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Initial capacity of a [`HostList`], sized for the common case.
pub const DEFAULT_CAPACITY: usize = 25;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("host list {} is unavailable: {source}", .path.display())]
    ConfigurationUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("out of memory while growing the host list past {len} entries")]
    ResourceExhausted { len: usize },
}

/// A single monitored host, as written in the host list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostEntry(String);

impl HostEntry {
    /// Normalize one raw line. Returns `None` for blank lines and comments.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        // Anything after embedded whitespace is not part of the host name.
        let identifier = trimmed.split_whitespace().next()?;
        Some(Self(identifier.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hosts in file order. Append only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostList {
    entries: Vec<HostEntry>,
}

impl Default for HostList {
    fn default() -> Self {
        Self { entries: Vec::with_capacity(DEFAULT_CAPACITY) }
    }
}

impl HostList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, doubling the storage when it is full.
    pub fn push(&mut self, entry: HostEntry) -> Result<(), LoadError> {
        if self.entries.len() == self.entries.capacity() {
            let additional = self.entries.capacity().max(DEFAULT_CAPACITY);
            self.entries
                .try_reserve_exact(additional)
                .map_err(|_| LoadError::ResourceExhausted { len: self.entries.len() })?;
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HostEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for HostList {
    type Item = HostEntry;
    type IntoIter = std::vec::IntoIter<HostEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a HostList {
    type Item = &'a HostEntry;
    type IntoIter = std::slice::Iter<'a, HostEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Read a host list from any buffered source.
///
/// Lines are decoded lossily, so stray non-UTF-8 bytes never make an
/// otherwise readable source fail. `origin` is only used to label errors.
pub fn load(mut reader: impl BufRead, origin: &Path) -> Result<HostList, LoadError> {
    let mut hosts = HostList::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|source| {
            LoadError::ConfigurationUnavailable { path: origin.to_path_buf(), source }
        })?;
        if read == 0 {
            break;
        }

        if let Some(entry) = HostEntry::parse(&String::from_utf8_lossy(&buf)) {
            hosts.push(entry)?;
        }
    }

    Ok(hosts)
}

/// Open and read the host list at `path`.
pub fn load_file(path: impl AsRef<Path>) -> Result<HostList, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::ConfigurationUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    load(BufReader::new(file), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn load_str(input: &str) -> HostList {
        load(Cursor::new(input), Path::new("<memory>")).unwrap()
    }

    fn identifiers(hosts: &HostList) -> Vec<&str> {
        hosts.iter().map(HostEntry::as_str).collect()
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let hosts = load_str("   # not a host   \n\n   \t  \nexample.com\n#another\n10.0.0.1\n");
        assert_eq!(identifiers(&hosts), ["example.com", "10.0.0.1"]);
    }

    #[test]
    fn test_surrounding_whitespace_is_stripped() {
        let hosts = load_str("  example.com  \n\tlocalhost\r\n");
        assert_eq!(identifiers(&hosts), ["example.com", "localhost"]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let once = HostEntry::parse("  example.com  \n").unwrap();
        let twice = HostEntry::parse(once.as_str()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.as_str(), "example.com");
    }

    #[test]
    fn test_embedded_whitespace_truncates() {
        let entry = HostEntry::parse("example.com  trailing words").unwrap();
        assert_eq!(entry.as_str(), "example.com");
    }

    #[test]
    fn test_hash_after_text_is_not_a_comment() {
        let entry = HostEntry::parse("host#1").unwrap();
        assert_eq!(entry.as_str(), "host#1");
    }

    #[test]
    fn test_non_utf8_bytes_do_not_abort_loading() {
        let input: &[u8] = b"# caf\xe9 hosts\nexample.com\n  \xff\xfe  \nlast.example";
        let hosts = load(Cursor::new(input), Path::new("<memory>")).unwrap();
        assert_eq!(identifiers(&hosts), ["example.com", "\u{fffd}\u{fffd}", "last.example"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let hosts = load_str("a.example\na.example\n");
        assert_eq!(identifiers(&hosts), ["a.example", "a.example"]);
    }

    #[test]
    fn test_order_survives_growth() {
        let expected: Vec<String> =
            (0..DEFAULT_CAPACITY * 9 + 3).map(|i| format!("host-{i}.example")).collect();
        let input = expected.iter().fold(String::new(), |mut acc, host| {
            acc.push_str("# comment\n");
            acc.push_str(host);
            acc.push('\n');
            acc
        });

        let hosts = load_str(&input);
        assert_eq!(hosts.len(), expected.len());
        assert!(hosts.iter().map(HostEntry::as_str).eq(expected.iter().map(String::as_str)));
    }

    #[test]
    fn test_push_grows_storage() {
        let mut hosts = HostList::new();
        for i in 0..DEFAULT_CAPACITY * 4 {
            hosts.push(HostEntry(format!("h{i}"))).unwrap();
        }
        assert_eq!(hosts.len(), DEFAULT_CAPACITY * 4);
        assert_eq!(hosts.iter().next().unwrap().as_str(), "h0");
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# hosts to watch").unwrap();
        writeln!(file, "example.com").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  127.0.0.1 ").unwrap();

        let hosts = load_file(file.path()).unwrap();
        assert_eq!(identifiers(&hosts), ["example.com", "127.0.0.1"]);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("watchdog.dat");

        match load_file(&missing) {
            Err(LoadError::ConfigurationUnavailable { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected ConfigurationUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_source() {
        assert!(load_str("").is_empty());
        assert!(load_str("# only comments\n   \n").is_empty());
    }
}
