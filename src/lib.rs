//! This crate reads and writes `.bib` sources in pure, safe rust,
//! including `@string` macro definitions and their use in field values.
//!
//! `.bib` files are popular in reference management since many resources
//! allow to export metadata in a BibTeχ file. A small source can look like this:
//!
//! ```tex
//! @string{aw = "Addison-Wesley"}
//!
//! @book{DBLP:books/aw/Knuth73a,
//!     author    = {Donald E. Knuth},
//!     title     = {The Art of Computer Programming, Volume {I:} Fundamental Algorithms},
//!     publisher = aw,
//!     year      = 1973,
//!     note      = "2nd" # { } # "Edition",
//! }
//! ```
//!
//! We call `book` the `type` of the entry and `DBLP:books/aw/Knuth73a` its `key`.
//! Then we have a sequence of fields with a `name` (like `year`) and a value
//! (like `1973`). Values are quoted strings, braced strings, numbers or bare
//! words naming a macro, optionally joined with `#`.
//! The formal grammar is not well-specified, but
//! [Tame the BeaST](https://ftp.rrze.uni-erlangen.de/ctan/info/bibtex/tamethebeast/ttb_en.pdf)
//! provides some insights.
//!
//! Parsing happens in three steps: a lexer turns the text into tokens, a
//! grammar assembles tokens into raw entries holding value trees, and a
//! resolver reduces every value tree to a plain string using the parser's
//! macro table. The API looks as follows:
//!
//! ```rust
//! use bibmacro::{Parser, ParseOptions, Metatype};
//!
//! let mut p = Parser::new();
//! let entries = p.parse_string(
//!     r#"@string{jrr = "J. R. R."} @book{tolkien1937, author = jrr # " Tolkien"}"#,
//!     "string input",
//!     ParseOptions::default(),
//! );
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0].metatype, Metatype::MacroDef);
//! assert_eq!(entries[1].kind, "book");
//! assert_eq!(entries[1].key, "tolkien1937");
//! assert_eq!(entries[1].fields.get("author"), Some("J. R. R. Tolkien"));
//! assert_eq!(p.lookup_macro("JRR"), Some("J. R. R."));
//!
//! // and back again
//! assert_eq!(
//!     p.stringify_entry(&entries[1]),
//!     "@book{tolkien1937, author = {J. R. R. Tolkien}}"
//! );
//! ```
//!
//! The entire source string is parsed at once. A syntax error anywhere makes
//! `parse_string` return no entries (the error is logged through `tracing`);
//! use `try_parse_string` to receive the error instead.

mod errors;
mod grammar;
mod lexer;
mod macros;
mod parser;
mod resolver;
mod stringify;
mod types;

pub use crate::errors::{MacroError, SyntaxError, SyntaxErrorKind};
pub use crate::macros::MacroTable;
pub use crate::parser::{Parser, DEFAULT_SOURCE_LABEL};
pub use crate::stringify::{stringify_entries, stringify_entry};
pub use crate::types::{Entry, Fields, Metatype, ParseOptions, CONTENT_FIELD};
