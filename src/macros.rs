use std::collections::HashMap;

use crate::errors::MacroError;

/// Named replacement texts defined through `@string` entries.
///
/// Names are case-insensitive and stored lowercased. Values keep their
/// original case and escaping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MacroTable {
    macro_hash: HashMap<String, String>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable::default()
    }

    /// Define a new macro. Fails on an empty name and on a name that is
    /// already defined; `source_label` and `line` only label the error.
    pub fn define(
        &mut self,
        name: &str,
        value: &str,
        source_label: &str,
        line: usize,
    ) -> Result<(), MacroError> {
        if name.is_empty() {
            return Err(MacroError::EmptyName {
                source_label: source_label.to_string(),
                line,
            });
        }
        let name = name.to_lowercase();
        if self.macro_hash.contains_key(&name) {
            return Err(MacroError::AlreadyDefined {
                name,
                source_label: source_label.to_string(),
                line,
            });
        }
        self.macro_hash.insert(name, value.to_string());
        Ok(())
    }

    /// Define a macro, silently replacing any previous definition.
    /// Returns the previous value.
    pub fn redefine(&mut self, name: &str, value: String) -> Option<String> {
        self.macro_hash.insert(name.to_lowercase(), value)
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        if name.is_empty() {
            return None;
        }
        self.macro_hash
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    /// Remove a macro. Returns whether it was defined.
    pub fn delete(&mut self, name: &str) -> bool {
        !name.is_empty() && self.macro_hash.remove(&name.to_lowercase()).is_some()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn clear(&mut self) {
        self.macro_hash.clear();
    }

    /// Names of all defined macros, in no particular order
    pub fn names(&self) -> Vec<String> {
        self.macro_hash.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.macro_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macro_hash.is_empty()
    }
}
