//! # Engine
//!
//! Reads a whole listing from a data stream and turns it into entries

use std::io::{BufReader, Read};

use super::filter::FileFilter;
use super::parser::ListParser;
use super::{factory, FileEntry, ParserConfig};
use crate::{Encoding, FtpResult};

/// Parses a listing with a [`ListParser`] and gives access to the entries,
/// either all at once or in pages.
#[derive(Debug, Clone)]
pub struct ListEngine {
    parser: ListParser,
    keep_unparseable: bool,
    entries: Vec<FileEntry>,
    position: usize,
}

impl ListEngine {
    /// Lines `parser` can't understand are kept as invalid entries when `keep_unparseable` is set
    pub fn new(parser: ListParser, keep_unparseable: bool) -> Self {
        Self {
            parser,
            keep_unparseable,
            entries: Vec::new(),
            position: 0,
        }
    }

    /// Instantiates an engine with the parser and options of `config`
    pub fn from_config(config: &ParserConfig) -> FtpResult<Self> {
        Ok(Self::new(
            factory::parser_for_config(config)?,
            config.keep_unparseable_entries(),
        ))
    }

    /// Read the whole listing from `stream` and parse it.
    /// Previously read entries are discarded.
    pub fn read_server_list<R: Read>(
        &mut self,
        stream: R,
        encoding: Encoding,
    ) -> std::io::Result<()> {
        let mut reader = BufReader::new(stream);
        let mut lines = Vec::new();
        while let Some(line) = self.parser.read_next_entry(&mut reader, encoding)? {
            lines.push(line);
        }
        let lines = self.parser.pre_parse(lines);
        debug!("read {} listing entries", lines.len());

        self.entries = Vec::with_capacity(lines.len());
        self.position = 0;
        for line in lines {
            match self.parser.parse(&line) {
                Some(entry) => self.entries.push(entry),
                None if self.keep_unparseable => {
                    trace!("keeping unparseable listing line: {line}");
                    self.entries.push(FileEntry::unparseable(&line));
                }
                None => trace!("discarding unparseable listing line: {line}"),
            }
        }
        Ok(())
    }

    /// All the entries
    pub fn get_files(&self) -> Vec<FileEntry> {
        self.entries.clone()
    }

    /// The entries accepted by `filter`
    pub fn get_files_filtered(&self, filter: &impl FileFilter) -> Vec<FileEntry> {
        self.entries
            .iter()
            .filter(|e| filter.accept(e))
            .cloned()
            .collect()
    }

    /// The next `quantity` entries from the current position, moving it forward.
    /// `0` means all the remaining ones.
    pub fn get_next(&mut self, quantity: usize) -> Vec<FileEntry> {
        let remaining = self.entries.len() - self.position;
        let count = if quantity == 0 {
            remaining
        } else {
            quantity.min(remaining)
        };
        let page = self.entries[self.position..self.position + count].to_vec();
        self.position += count;
        page
    }

    /// The `quantity` entries before the current position, moving it backward.
    /// `0` means all the previous ones. Entries keep the listing order.
    pub fn get_previous(&mut self, quantity: usize) -> Vec<FileEntry> {
        let count = if quantity == 0 {
            self.position
        } else {
            quantity.min(self.position)
        };
        let page = self.entries[self.position - count..self.position].to_vec();
        self.position -= count;
        page
    }

    pub fn has_next(&self) -> bool {
        self.position < self.entries.len()
    }

    pub fn has_previous(&self) -> bool {
        self.position > 0
    }

    /// Move back to the first entry
    pub fn reset_iterator(&mut self) {
        self.position = 0;
    }
}
