use std::fmt;
use std::ops;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coarse classification of an entry, derived from its type word
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Metatype {
    /// a bibliographic record, e.g. `@article` or `@book`
    Regular,
    /// `@comment`
    Comment,
    /// `@preamble`
    Preamble,
    /// `@string`, a set of macro definitions
    MacroDef,
    #[default]
    Unknown,
}

impl Metatype {
    /// Map an entry type word onto its metatype.
    /// The comparison is case-insensitive; anything that is not one of
    /// the three special words is a regular entry.
    pub fn from_type(kind: &str) -> Metatype {
        if kind.eq_ignore_ascii_case("string") {
            Metatype::MacroDef
        } else if kind.eq_ignore_ascii_case("comment") {
            Metatype::Comment
        } else if kind.eq_ignore_ascii_case("preamble") {
            Metatype::Preamble
        } else {
            Metatype::Regular
        }
    }
}

impl fmt::Display for Metatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Regular => "REGULAR",
                Self::Comment => "COMMENT",
                Self::Preamble => "PREAMBLE",
                Self::MacroDef => "MACRODEF",
                Self::Unknown => "UNKNOWN",
            }
        )
    }
}

/// Ordered map of field names to field values.
///
/// Names are canonicalized to lowercase on insertion and lookup. Iteration
/// follows the order in which names were first inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn new() -> Fields {
        Fields(Vec::new())
    }

    /// Insert a field. If the name already exists, the value is replaced
    /// in place and the previous value is returned.
    pub fn insert<N: AsRef<str>, V: Into<String>>(&mut self, name: N, value: V) -> Option<String> {
        let name = name.as_ref().to_lowercase();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.0
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        let idx = self.0.iter().position(|(n, _)| *n == name)?;
        Some(self.0.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.0.iter_mut().map(|(_, v)| v)
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

impl ops::Index<&str> for Fields {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no field named '{}'", name),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for Fields {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> serde::de::Visitor<'de> for FieldsVisitor {
            type Value = Fields;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("fields map")
            }

            fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
            where
                M: serde::de::MapAccess<'de>,
            {
                let mut fields = Fields::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    fields.insert(name, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// One entry in a `.bib` source, with every field value fully resolved
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entry {
    /// entry name as written, e.g. “DBLP:books/lib/Knuth97”; empty for
    /// `@string`, `@comment` and `@preamble`
    pub key: String,
    /// lowercased entry type, e.g. “article”
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: String,
    pub metatype: Metatype,
    /// map of fields, e.g. “author” mapped to “Donald Ervin Knuth”.
    /// `@comment` and `@preamble` carry a single field named `content`.
    pub fields: Fields,
}

impl Entry {
    /// Generate a new, empty instance of Entry. Can also be called through the `Default` implementation.
    pub fn new() -> Entry {
        Entry::default()
    }

    /// Create an entry of the given type. The type word is lowercased and
    /// the metatype derived from it.
    pub fn with_type(kind: &str) -> Entry {
        Entry {
            key: String::new(),
            kind: kind.to_lowercase(),
            metatype: Metatype::from_type(kind),
            fields: Fields::new(),
        }
    }

    /// The `content` field of a `@comment` or `@preamble`
    pub fn content(&self) -> Option<&str> {
        self.fields.get(CONTENT_FIELD)
    }
}

/// Field name under which `@comment` and `@preamble` bodies are stored
pub const CONTENT_FIELD: &str = "content";

/// Option bits accepted by [`crate::Parser::parse_string`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParseOptions(u32);

impl ParseOptions {
    /// Replace field values which are exactly the name of a defined macro
    /// by the macro's text, after regular resolution.
    pub const EXPAND_MACROS: ParseOptions = ParseOptions(2);

    pub const fn from_bits(bits: u32) -> ParseOptions {
        ParseOptions(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: ParseOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn expand_macros(self) -> bool {
        self.contains(Self::EXPAND_MACROS)
    }
}

impl ops::BitOr for ParseOptions {
    type Output = ParseOptions;

    fn bitor(self, rhs: ParseOptions) -> ParseOptions {
        ParseOptions(self.0 | rhs.0)
    }
}

impl From<u32> for ParseOptions {
    fn from(bits: u32) -> Self {
        ParseOptions(bits)
    }
}
