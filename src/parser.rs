use tracing::{debug, warn};

use crate::errors::{MacroError, SyntaxError};
use crate::grammar;
use crate::macros::MacroTable;
use crate::resolver;
use crate::stringify;
use crate::types::{Entry, ParseOptions};

/// Source label used when the caller does not name the input
pub const DEFAULT_SOURCE_LABEL: &str = "string input";

/// Parser session turning `.bib` source text into `Entry` instances.
///
/// A parser owns a macro table. Macros defined by `@string` entries in one
/// call stay visible to later calls on the same parser until they are
/// deleted or cleared; separate parsers never share macros.
#[derive(Debug, Default, Clone)]
pub struct Parser {
    pub(crate) macros: MacroTable,
}

impl Parser {
    pub fn new() -> Parser {
        Parser::default()
    }

    /// Parse `content` with the default source label and no options.
    pub fn parse(&mut self, content: &str) -> Vec<Entry> {
        self.parse_string(content, DEFAULT_SOURCE_LABEL, ParseOptions::default())
    }

    /// Parse a complete source buffer.
    ///
    /// A syntax error anywhere in `content` is logged and yields no entries
    /// at all; the macro table is left untouched in that case.
    pub fn parse_string(
        &mut self,
        content: &str,
        source_label: &str,
        options: ParseOptions,
    ) -> Vec<Entry> {
        match self.try_parse_string(content, source_label, options) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    source = source_label,
                    line = err.line,
                    column = err.column,
                    "error parsing BibTeX: {}",
                    err
                );
                Vec::new()
            }
        }
    }

    /// Like `parse_string`, but hands the syntax error to the caller.
    pub fn try_parse_string(
        &mut self,
        content: &str,
        source_label: &str,
        options: ParseOptions,
    ) -> Result<Vec<Entry>, SyntaxError> {
        let raw = grammar::parse(content, source_label)?;
        let entries = resolver::resolve(raw, &mut self.macros, options.expand_macros());
        debug!(
            source = source_label,
            entries = entries.len(),
            macros = self.macros.len(),
            "parsed BibTeX source"
        );
        Ok(entries)
    }

    /// Define a macro directly. Redefining an existing macro this way is an
    /// error, unlike `@string` entries which may redefine freely.
    pub fn define_macro(
        &mut self,
        name: &str,
        text: &str,
        source_label: Option<&str>,
        line: usize,
    ) -> Result<bool, MacroError> {
        self.macros
            .define(name, text, source_label.unwrap_or(DEFAULT_SOURCE_LABEL), line)?;
        Ok(true)
    }

    pub fn lookup_macro(&self, name: &str) -> Option<&str> {
        self.macros.lookup(name)
    }

    pub fn delete_macro(&mut self, name: &str) -> bool {
        self.macros.delete(name)
    }

    pub fn macro_exists(&self, name: &str) -> bool {
        self.macros.exists(name)
    }

    pub fn clear_macros(&mut self) {
        self.macros.clear();
    }

    pub fn macro_names(&self) -> Vec<String> {
        self.macros.names()
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn stringify_entry(&self, entry: &Entry) -> String {
        stringify::stringify_entry(entry)
    }

    pub fn stringify_entries(&self, entries: &[Entry]) -> String {
        stringify::stringify_entries(entries)
    }
}
