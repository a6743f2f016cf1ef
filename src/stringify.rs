use std::fmt;

use crate::lexer::BraceBalance;
use crate::types::{Entry, Metatype};

/// Whether `text` can be wrapped in a pair of braces and read back unchanged,
/// using the lexer's own brace bookkeeping
fn is_brace_balanced(text: &str) -> bool {
    let mut braces = BraceBalance::default();
    let mut out = String::with_capacity(text.len() + 1);
    for chr in text.chars() {
        if braces.feed(chr, &mut out, false).is_some() {
            return false;
        }
    }
    braces.feed('}', &mut out, false).is_some()
}

fn write_regular(f: &mut fmt::Formatter<'_>, entry: &Entry) -> fmt::Result {
    write!(f, "@{}{{{}", entry.kind, entry.key)?;
    for (name, value) in entry.fields.iter() {
        write!(f, ", {} = {{{}}}", name, value)?;
    }
    write!(f, "}}")
}

fn write_macros(f: &mut fmt::Formatter<'_>, entry: &Entry) -> fmt::Result {
    write!(f, "@{}{{", entry.kind)?;
    for (idx, (name, value)) in entry.fields.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} = \"{}\"", name, value.replace('"', "\\\""))?;
    }
    write!(f, "}}")
}

fn write_comment(f: &mut fmt::Formatter<'_>, entry: &Entry) -> fmt::Result {
    let content = entry.content().unwrap_or_default();
    if is_brace_balanced(content) {
        write!(f, "@{}{{{}}}", entry.kind, content)
    } else {
        write!(f, "@{}({})", entry.kind, content)
    }
}

fn write_preamble(f: &mut fmt::Formatter<'_>, entry: &Entry) -> fmt::Result {
    write!(f, "@{}{{{{{}}}}}", entry.kind, entry.content().unwrap_or_default())
}

impl fmt::Display for Entry {
    /// Render the entry in `.bib` syntax, e.g.
    /// `@article{key, title = {Title}}` or `@string{j = "Journal"}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.metatype {
            Metatype::Regular | Metatype::Unknown => write_regular(f, self),
            Metatype::MacroDef => write_macros(f, self),
            Metatype::Comment => write_comment(f, self),
            Metatype::Preamble => write_preamble(f, self),
        }
    }
}

/// Render one entry back into `.bib` source text.
pub fn stringify_entry(entry: &Entry) -> String {
    entry.to_string()
}

/// Render several entries, separated by blank lines.
pub fn stringify_entries(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(stringify_entry)
        .collect::<Vec<_>>()
        .join("\n\n")
}
