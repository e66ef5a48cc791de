//! # Composite
//!
//! Tries several dialects for servers which may list in more than one format

use super::ListParser;
use crate::list::FileEntry;

/// Wraps an ordered list of parsers.
///
/// The parser which matched last is tried first; when it fails, the others are tried in order
/// and the first one to succeed is remembered instead.
#[derive(Debug, Clone)]
pub struct CompositeParser {
    parsers: Vec<ListParser>,
    cached: Option<usize>,
}

impl CompositeParser {
    pub fn new(parsers: Vec<ListParser>) -> Self {
        Self {
            parsers,
            cached: None,
        }
    }

    /// Member parsers, in the order they're tried
    pub fn parsers(&self) -> &[ListParser] {
        &self.parsers
    }

    pub fn parse(&mut self, line: &str) -> Option<FileEntry> {
        if let Some(index) = self.cached {
            if let Some(entry) = self.parsers[index].parse(line) {
                return Some(entry);
            }
        }
        let cached = self.cached;
        for (index, parser) in self.parsers.iter_mut().enumerate() {
            if Some(index) == cached {
                continue;
            }
            if let Some(entry) = parser.parse(line) {
                trace!("listing parser #{index} matched; caching it");
                self.cached = Some(index);
                return Some(entry);
            }
        }
        None
    }
}
