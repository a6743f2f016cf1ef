use tracing::trace;

use crate::grammar::{RawEntry, Value};
use crate::lexer::is_word_char;
use crate::macros::MacroTable;
use crate::types::{Entry, Fields, Metatype};

/// Reduce a value tree to its final text, consulting the current macro table.
/// Undefined macro names stand for themselves.
pub(crate) fn reduce(value: &Value, macros: &MacroTable) -> String {
    match value {
        Value::Literal(text) => text.clone(),
        Value::MacroRef(name) => macros.lookup(name).unwrap_or(name).to_string(),
        Value::Concat(parts) => parts.iter().map(|part| reduce(part, macros)).collect(),
    }
}

/// Reduce the right-hand side of a `@string` assignment.
///
/// A lone bare word stores the referenced name itself, not its current
/// value; concatenations are resolved eagerly.
pub(crate) fn reduce_definition(value: &Value, macros: &MacroTable) -> String {
    match value {
        Value::MacroRef(name) => name.clone(),
        other => reduce(other, macros),
    }
}

/// Replace `text` by a macro's value if all of it is a single defined macro name.
fn expand_word(text: &mut String, macros: &MacroTable) {
    if text.is_empty() || !text.chars().all(is_word_char) {
        return;
    }
    if let Some(value) = macros.lookup(text) {
        *text = value.to_string();
    }
}

fn resolve_entry(raw: RawEntry, macros: &mut MacroTable, expand: bool) -> Option<Entry> {
    if raw.kind.is_empty() {
        return None;
    }

    if raw.metatype == Metatype::MacroDef {
        for (name, value) in raw.fields.iter() {
            let text = reduce_definition(value, macros);
            trace!(name = name.as_str(), value = text.as_str(), "defining macro");
            macros.redefine(name, text);
        }
    }

    let mut fields: Fields = raw
        .fields
        .iter()
        .map(|(name, value)| (name, reduce(value, macros)))
        .collect();

    if expand {
        for value in fields.values_mut() {
            expand_word(value, macros);
        }
    }

    Some(Entry {
        key: raw.key,
        kind: raw.kind,
        metatype: raw.metatype,
        fields,
    })
}

/// Turn raw entries into resolved entries, in source order. `@string`
/// entries update `macros` as they are met, so later entries see them.
pub(crate) fn resolve(raw: Vec<RawEntry>, macros: &mut MacroTable, expand: bool) -> Vec<Entry> {
    raw.into_iter()
        .filter_map(|entry| resolve_entry(entry, macros, expand))
        .collect()
}
