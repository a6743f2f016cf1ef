use std::mem;

use crate::errors::SyntaxError;
use crate::lexer;
use crate::types::{Metatype, CONTENT_FIELD};

/// Field value as written in the source, before macro resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Value {
    /// quoted, braced or numeric text with its delimiters stripped
    Literal(String),
    /// `#`-joined parts in source order
    Concat(Vec<Value>),
    /// a bare word, lowercased
    MacroRef(String),
}

impl Value {
    fn from_token(token: lexer::Token) -> Option<Value> {
        use lexer::Token as T;

        match token {
            T::Quoted(s) | T::Braced(s) | T::Number(s) => Some(Value::Literal(s)),
            T::Word(w) => Some(Value::MacroRef(w.to_lowercase())),
            _ => None,
        }
    }
}

/// One entry as produced by the grammar, field values still unresolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub(crate) kind: String,
    pub(crate) key: String,
    pub(crate) metatype: Metatype,
    pub(crate) fields: Vec<(String, Value)>,
}

impl RawEntry {
    fn new(kind: &str) -> RawEntry {
        RawEntry {
            kind: kind.to_lowercase(),
            key: String::new(),
            metatype: Metatype::from_type(kind),
            fields: Vec::new(),
        }
    }

    /// Later assignments to the same name replace the value but keep its position.
    fn set(&mut self, name: String, value: Value) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }
}

/// Assembles tokens into raw entries
#[derive(Default)]
struct EntryBuilder {
    entries: Vec<RawEntry>,
    current: Option<RawEntry>,
    name_cached: Option<String>,
    parts: Vec<Value>,
}

impl EntryBuilder {
    fn finish_value(&mut self) {
        let name = match self.name_cached.take() {
            Some(name) => name,
            None => return,
        };
        let value = match self.parts.len() {
            0 => return,
            1 => self.parts.remove(0),
            _ => Value::Concat(mem::take(&mut self.parts)),
        };
        self.parts.clear();
        if let Some(entry) = self.current.as_mut() {
            entry.set(name, value);
        }
    }

    fn feed(&mut self, token: lexer::Token) {
        use lexer::Token as T;

        match token {
            T::EntryType(kind) => self.current = Some(RawEntry::new(&kind)),
            T::OpenEntry(_) => {
                if let Some(entry) = &self.current {
                    if entry.metatype == Metatype::Preamble {
                        self.name_cached = Some(CONTENT_FIELD.to_string());
                    }
                }
            }
            T::EntryKey(key) => {
                if let Some(entry) = self.current.as_mut() {
                    entry.key = key;
                }
            }
            T::FieldName(name) => {
                self.finish_value();
                self.name_cached = Some(name.to_lowercase());
            }
            T::Concat => {}
            T::CommentBody(body) => {
                if let Some(entry) = self.current.as_mut() {
                    entry.set(CONTENT_FIELD.to_string(), Value::Literal(body));
                }
            }
            T::CloseEntry => {
                self.finish_value();
                if let Some(entry) = self.current.take() {
                    self.entries.push(entry);
                }
            }
            T::EndOfFile => {}
            part => {
                if let Some(value) = Value::from_token(part) {
                    self.parts.push(value);
                }
            }
        }
    }
}

/// Parse a complete source buffer into raw entries.
/// The whole buffer fails together: either every entry or the first syntax error is returned.
pub(crate) fn parse(src: &str, source_label: &str) -> Result<Vec<RawEntry>, SyntaxError> {
    let mut builder = EntryBuilder::default();
    for result in lexer::Lexer::new(src).iter() {
        match result {
            Ok((token, _info)) => builder.feed(token),
            Err(e) => return Err(SyntaxError::from_lexing(e, src, source_label)),
        }
    }
    Ok(builder.entries)
}
