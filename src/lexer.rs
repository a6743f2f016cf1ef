use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::str;

use crate::errors::LexingError;
use crate::types::Metatype;

/// A token is one semantic unit read from the bib source.
/// Remember, that bib file entry looks as follows:
///
/// ```tex
/// @Book{works:4,
///   author     = {Shakespeare, William},
///   title      = "Sonnets" # { } # series,
/// }
/// ```
///
/// In this case, the lexer would emit the following Token instances:
/// (EntryType("Book"), OpenEntry('{'), EntryKey("works:4"),
/// FieldName("author"), Braced("Shakespeare, William"), FieldName("title"),
/// Quoted("Sonnets"), Concat, Braced(" "), Concat, Word("series"),
/// CloseEntry, EndOfFile). Be aware that Token is just the
/// data contract between lexer and grammar and not meant to be externally
/// visible.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    EntryType(String),
    OpenEntry(char),
    EntryKey(String),
    FieldName(String),
    Quoted(String),
    Braced(String),
    Number(String),
    Word(String),
    Concat,
    CommentBody(String),
    CloseEntry,
    EndOfFile,
}

/// Additional source code information attached to a Token
/// for improved error messages
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TokenInfo {
    pub(crate) lineno: usize,
    pub(crate) colno: usize,
    pub(crate) current_key: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LexingState {
    Default,
    LineComment,
    ReadingType,
    WaitForOpen,
    ReadingKey,
    ReadingName,
    WaitForAssign,
    ReadingValueStart,
    ReadingQuoted,
    ReadingBraced,
    ReadingWord,
    WaitForConcat,
    ReadingComment,
}

impl fmt::Display for LexingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Default => "waiting for next entry",
                Self::LineComment => "skipping a '%' comment",
                Self::ReadingType => "reading entry type",
                Self::WaitForOpen => "expecting '{' or '(' for entry data",
                Self::ReadingKey => "reading entry key",
                Self::ReadingName => "reading field name",
                Self::WaitForAssign => "expecting '=' for field assignment",
                Self::ReadingValueStart => "reading start of field value",
                Self::ReadingQuoted => "reading quoted string",
                Self::ReadingBraced => "reading braced string",
                Self::ReadingWord => "reading macro name or number",
                Self::WaitForConcat => "expecting '#', ',' or end of entry",
                Self::ReadingComment => "reading comment body",
            }
        )
    }
}

/// Characters allowed in a bare word (macro name or number)
pub(crate) fn is_word_char(chr: char) -> bool {
    chr.is_ascii_alphanumeric() || "!$&*+-./:<>?[]^_`|".contains(chr)
}

/// Brace bookkeeping shared by braced strings, quoted strings and comment bodies.
///
/// `\{` never changes the depth and opens an escaped pair. `\}` never changes
/// the depth while an escaped pair is open or inside a quoted string;
/// otherwise its backslash is plain text and the brace counts as usual.
#[derive(Debug, Default)]
pub(crate) struct BraceBalance {
    pub(crate) depth: usize,
    escaped: usize,
    backslash: bool,
}

impl BraceBalance {
    fn reset(&mut self) {
        *self = BraceBalance::default();
    }

    /// Emit a backslash that is still waiting for its successor.
    fn flush(&mut self, out: &mut String) {
        if mem::take(&mut self.backslash) {
            out.push('\\');
        }
    }

    /// Feed one character of text into `out`. Returns the character instead of
    /// appending it if it is structural at depth 0, i.e. an unbalanced `}` or
    /// (with `quoted`) an unescaped `"`.
    pub(crate) fn feed(&mut self, chr: char, out: &mut String, quoted: bool) -> Option<char> {
        if mem::take(&mut self.backslash) {
            match chr {
                '{' => {
                    self.escaped += 1;
                    out.push_str("\\{");
                    return None;
                }
                '}' if quoted || self.escaped > 0 => {
                    self.escaped = self.escaped.saturating_sub(1);
                    out.push_str("\\}");
                    return None;
                }
                '"' if quoted => {
                    out.push('"');
                    return None;
                }
                _ => out.push('\\'),
            }
        }

        match chr {
            '\\' => self.backslash = true,
            '{' => {
                self.depth += 1;
                out.push(chr);
            }
            '}' if self.depth == 0 => return Some(chr),
            '}' => {
                self.depth -= 1;
                out.push(chr);
            }
            '"' if quoted && self.depth == 0 => return Some(chr),
            _ => out.push(chr),
        }
        None
    }
}

pub(crate) struct LexingIterator<'s> {
    pub(crate) chars: str::Chars<'s>,
    pub(crate) next_tokens: VecDeque<(Token, TokenInfo)>,
    pub(crate) lineno: usize,
    pub(crate) colno: usize,
    pub(crate) state: LexingState,
    pub(crate) resume: LexingState, // state to return to after a '%' comment
    pub(crate) metatype: Metatype,  // kind of the entry currently being read
    pub(crate) closing: char,       // delimiter closing the current entry, '}' or ')'
    pub(crate) current_key: Option<String>, // the key of the current entry, e.g. “DBLP:books/lib/Knuth97”
    pub(crate) arg_cache: String,           // accumulates token arguments which are strings
    pub(crate) braces: BraceBalance,
    pub(crate) eof: bool, // did the input end?
}

impl<'s> LexingIterator<'s> {
    fn info(&self) -> TokenInfo {
        TokenInfo {
            lineno: self.lineno,
            colno: self.colno,
            current_key: self.current_key.clone(),
        }
    }

    fn emit(&mut self, token: Token) {
        let info = self.info();
        self.next_tokens.push_back((token, info));
    }

    fn unexpected(&self, chr: char, action: &'static str) -> Result<(), LexingError> {
        Err(LexingError::UnexpectedChar(chr, action, self.info()))
    }

    fn skip_comment(&mut self) {
        self.resume = self.state;
        self.state = LexingState::LineComment;
    }

    fn open_entry(&mut self, chr: char) {
        let kind = mem::take(&mut self.arg_cache);
        self.metatype = Metatype::from_type(&kind);
        self.closing = if chr == '(' { ')' } else { '}' };
        self.current_key = None;
        self.emit(Token::EntryType(kind));
        self.emit(Token::OpenEntry(chr));
        self.braces.reset();
        self.state = match self.metatype {
            Metatype::MacroDef => LexingState::ReadingName,
            Metatype::Preamble => LexingState::ReadingValueStart,
            Metatype::Comment => LexingState::ReadingComment,
            Metatype::Regular | Metatype::Unknown => LexingState::ReadingKey,
        };
    }

    fn close_entry(&mut self) {
        self.emit(Token::CloseEntry);
        self.current_key = None;
        self.state = LexingState::Default;
    }

    /// step() advances the state machine by one character.
    fn step(&mut self, chr: char) -> Result<(), LexingError> {
        match self.state {
            // skipping anything up to '@'
            LexingState::Default => {
                if chr == '@' {
                    self.arg_cache.clear();
                    self.state = LexingState::ReadingType;
                } else if chr == '%' {
                    self.skip_comment();
                }
            }
            LexingState::LineComment => {
                if chr == '\n' || chr == '\r' {
                    self.state = self.resume;
                }
            }
            // expecting entry type, e.g. “book”
            LexingState::ReadingType => {
                if chr.is_alphanumeric() {
                    self.arg_cache.push(chr);
                } else if chr.is_whitespace() {
                    if !self.arg_cache.is_empty() {
                        self.state = LexingState::WaitForOpen;
                    }
                } else if (chr == '{' || chr == '(') && !self.arg_cache.is_empty() {
                    self.open_entry(chr);
                } else if chr == '@' {
                    self.arg_cache.clear();
                } else {
                    // not an entry after all, e.g. an e-mail address in free text
                    self.state = LexingState::Default;
                }
            }
            // expecting “{” or “(”
            LexingState::WaitForOpen => {
                if chr.is_whitespace() {
                    // ignore
                } else if chr == '{' || chr == '(' {
                    self.open_entry(chr);
                } else if chr == '@' {
                    self.arg_cache.clear();
                    self.state = LexingState::ReadingType;
                } else {
                    self.state = LexingState::Default;
                }
            }
            // expecting e.g. “DBLP:books/lib/Knuth97”
            LexingState::ReadingKey => {
                if chr == ',' || chr == self.closing {
                    let key = mem::take(&mut self.arg_cache).trim().to_string();
                    self.emit(Token::EntryKey(key.clone()));
                    self.current_key = Some(key);
                    if chr == ',' {
                        self.state = LexingState::ReadingName;
                    } else {
                        self.close_entry();
                    }
                } else {
                    self.arg_cache.push(chr);
                }
            }
            LexingState::ReadingName => {
                if chr.is_whitespace() {
                    if !self.arg_cache.is_empty() {
                        self.state = LexingState::WaitForAssign;
                    }
                } else if self.arg_cache.is_empty() && chr == '%' {
                    self.skip_comment();
                } else if self.arg_cache.is_empty() && chr == ',' {
                    // ignore
                } else if self.arg_cache.is_empty() && chr == self.closing {
                    self.close_entry();
                } else if chr == '=' {
                    if self.arg_cache.is_empty() {
                        return self.unexpected(chr, "reading field name");
                    }
                    let name = mem::take(&mut self.arg_cache);
                    self.emit(Token::FieldName(name));
                    self.state = LexingState::ReadingValueStart;
                } else if chr == ',' || chr == self.closing {
                    return self.unexpected(chr, "expecting '=' for field assignment");
                } else if chr == '{' || chr == '}' {
                    return self.unexpected(chr, "reading field name");
                } else {
                    self.arg_cache.push(chr);
                }
            }
            LexingState::WaitForAssign => {
                if chr.is_whitespace() {
                    // ignore
                } else if chr == '%' {
                    self.skip_comment();
                } else if chr == '=' {
                    let name = mem::take(&mut self.arg_cache);
                    self.emit(Token::FieldName(name));
                    self.state = LexingState::ReadingValueStart;
                } else {
                    return self.unexpected(chr, "expecting '=' for field assignment");
                }
            }
            LexingState::ReadingValueStart => {
                if chr.is_whitespace() {
                    // ignore
                } else if chr == '%' {
                    self.skip_comment();
                } else if chr == '{' {
                    self.braces.reset();
                    self.state = LexingState::ReadingBraced;
                } else if chr == '"' {
                    self.braces.reset();
                    self.state = LexingState::ReadingQuoted;
                } else if is_word_char(chr) {
                    self.arg_cache.push(chr);
                    self.state = LexingState::ReadingWord;
                } else {
                    return self.unexpected(chr, "reading start of field value");
                }
            }
            LexingState::ReadingBraced => {
                if self.braces.feed(chr, &mut self.arg_cache, false).is_some() {
                    let text = mem::take(&mut self.arg_cache);
                    self.emit(Token::Braced(text));
                    self.state = LexingState::WaitForConcat;
                }
            }
            LexingState::ReadingQuoted => match self.braces.feed(chr, &mut self.arg_cache, true) {
                Some('"') => {
                    let text = mem::take(&mut self.arg_cache);
                    self.emit(Token::Quoted(text));
                    self.state = LexingState::WaitForConcat;
                }
                Some(_) => return Err(LexingError::UnbalancedBrace(self.info())),
                None => {}
            },
            LexingState::ReadingWord => {
                if is_word_char(chr) {
                    self.arg_cache.push(chr);
                } else {
                    let word = mem::take(&mut self.arg_cache);
                    if word.chars().all(|c| c.is_ascii_digit()) {
                        self.emit(Token::Number(word));
                    } else {
                        self.emit(Token::Word(word));
                    }
                    self.state = LexingState::WaitForConcat;
                    return self.step(chr);
                }
            }
            LexingState::WaitForConcat => {
                if chr.is_whitespace() {
                    // ignore
                } else if chr == '%' {
                    self.skip_comment();
                } else if chr == '#' {
                    self.emit(Token::Concat);
                    self.state = LexingState::ReadingValueStart;
                } else if chr == self.closing {
                    self.close_entry();
                } else if chr == ',' && self.metatype != Metatype::Preamble {
                    self.state = LexingState::ReadingName;
                } else {
                    return self.unexpected(chr, "expecting '#', ',' or end of entry");
                }
            }
            LexingState::ReadingComment => {
                let end = if self.closing == ')' && chr == ')' && self.braces.depth == 0 {
                    self.braces.flush(&mut self.arg_cache);
                    true
                } else {
                    match self.braces.feed(chr, &mut self.arg_cache, false) {
                        Some(_) if self.closing == '}' => true,
                        Some(stray) => {
                            self.arg_cache.push(stray);
                            false
                        }
                        None => false,
                    }
                };
                if end {
                    let body = mem::take(&mut self.arg_cache);
                    self.emit(Token::CommentBody(body));
                    self.close_entry();
                }
            }
        }
        Ok(())
    }

    /// lex() continues its lexing process until at least one token is available
    /// or the input is exhausted. The generated tokens are pushed to `self.next_tokens`.
    fn lex(&mut self) -> Result<(), LexingError> {
        while self.next_tokens.is_empty() {
            let chr = match self.chars.next() {
                Some(chr) => chr,
                None => return self.finish(),
            };
            self.step(chr)?;
            if chr == '\n' {
                self.lineno += 1;
                self.colno = 0;
            } else {
                self.colno += 1;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LexingError> {
        let state = if self.state == LexingState::LineComment {
            self.resume
        } else {
            self.state
        };
        match state {
            LexingState::Default | LexingState::ReadingType | LexingState::WaitForOpen => {}
            _ => return Err(LexingError::UnexpectedEOF(state.to_string(), self.info())),
        }

        self.current_key = None;
        self.emit(Token::EndOfFile);
        self.eof = true;
        Ok(())
    }
}

impl<'s> Iterator for LexingIterator<'s> {
    type Item = Result<(Token, TokenInfo), LexingError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.next_tokens.pop_front() {
                return Some(Ok(tok));
            }
            if self.eof {
                return None;
            }

            // try to generate new tokens
            if let Err(e) = self.lex() {
                self.eof = true;
                self.next_tokens.clear();
                return Some(Err(e));
            }
        }
    }
}

pub(crate) struct Lexer<'s> {
    src: &'s str,
}

impl<'s> Lexer<'s> {
    /// Use a string as source for the lexing process.
    pub(crate) fn new(src: &'s str) -> Lexer<'s> {
        Lexer { src }
    }

    pub(crate) fn iter(&self) -> LexingIterator<'s> {
        LexingIterator {
            chars: self.src.chars(),
            next_tokens: VecDeque::new(),
            lineno: 0,
            colno: 0,
            state: LexingState::Default,
            resume: LexingState::Default,
            metatype: Metatype::Unknown,
            closing: '}',
            current_key: None,
            arg_cache: String::new(),
            braces: BraceBalance::default(),
            eof: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error;

    fn tokens(src: &str) -> Result<Vec<Token>, LexingError> {
        Lexer::new(src)
            .iter()
            .map(|t| t.map(|(token, _info)| token))
            .collect()
    }

    fn text(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_tolkien() -> Result<(), Box<dyn error::Error>> {
        let seq = tokens("@book{tolkien1937, author = {J. R. R. Tolkien}}")?;
        assert_eq!(
            seq,
            vec![
                Token::EntryType(text("book")),
                Token::OpenEntry('{'),
                Token::EntryKey(text("tolkien1937")),
                Token::FieldName(text("author")),
                Token::Braced(text("J. R. R. Tolkien")),
                Token::CloseEntry,
                Token::EndOfFile,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_values() -> Result<(), Box<dyn error::Error>> {
        let seq = tokens("@misc(k, t = \"a\" # 12 #Jan,)")?;
        assert_eq!(
            seq,
            vec![
                Token::EntryType(text("misc")),
                Token::OpenEntry('('),
                Token::EntryKey(text("k")),
                Token::FieldName(text("t")),
                Token::Quoted(text("a")),
                Token::Concat,
                Token::Number(text("12")),
                Token::Concat,
                Token::Word(text("Jan")),
                Token::CloseEntry,
                Token::EndOfFile,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_special_bodies() -> Result<(), Box<dyn error::Error>> {
        let seq = tokens("@STRING{j = \"J\"}@comment{any {thing}, here}@preamble{\"p\"}")?;
        assert_eq!(
            seq,
            vec![
                Token::EntryType(text("STRING")),
                Token::OpenEntry('{'),
                Token::FieldName(text("j")),
                Token::Quoted(text("J")),
                Token::CloseEntry,
                Token::EntryType(text("comment")),
                Token::OpenEntry('{'),
                Token::CommentBody(text("any {thing}, here")),
                Token::CloseEntry,
                Token::EntryType(text("preamble")),
                Token::OpenEntry('{'),
                Token::Quoted(text("p")),
                Token::CloseEntry,
                Token::EndOfFile,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_paren_comment_ends_at_first_paren() -> Result<(), Box<dyn error::Error>> {
        let seq = tokens("@comment(it (as long\n as) rest)")?;
        assert_eq!(seq[2], Token::CommentBody(text("it (as long\n as")));
        Ok(())
    }

    #[test]
    fn test_escapes() -> Result<(), Box<dyn error::Error>> {
        let seq = tokens(r#"@a{k, x = "say \"hi\" \&", y = {Escaped \{braces\} here}, z = {Trailing \}}"#)?;
        assert_eq!(seq[4], Token::Quoted(text(r#"say "hi" \&"#)));
        assert_eq!(seq[6], Token::Braced(text(r"Escaped \{braces\} here")));
        assert_eq!(seq[8], Token::Braced(text(r"Trailing \")));
        Ok(())
    }

    #[test]
    fn test_quoted_keeps_escaped_closing_brace() -> Result<(), Box<dyn error::Error>> {
        let seq = tokens(r#"@a{k, x = "Set \}", y = "\{ a \} b \}"}"#)?;
        assert_eq!(seq[4], Token::Quoted(text(r"Set \}")));
        assert_eq!(seq[6], Token::Quoted(text(r"\{ a \} b \}")));
        Ok(())
    }

    #[test]
    fn test_word_chars_are_ascii() {
        assert!(is_word_char('a'));
        assert!(is_word_char('7'));
        assert!(is_word_char('-'));
        assert!(!is_word_char('é'));
        assert!(!is_word_char('#'));
    }

    #[test]
    fn test_quoted_protects_quotes_in_braces() -> Result<(), Box<dyn error::Error>> {
        let seq = tokens(r#"@a{k, x = "a {"} b"}"#)?;
        assert_eq!(seq[4], Token::Quoted(text(r#"a {"} b"#)));
        Ok(())
    }

    #[test]
    fn test_junk_and_comments() -> Result<(), Box<dyn error::Error>> {
        let src = "junk me@example.org\n% @fake{x}\n@a{k, % note\n t = {v} % more\n}";
        let seq = tokens(src)?;
        assert_eq!(
            seq,
            vec![
                Token::EntryType(text("a")),
                Token::OpenEntry('{'),
                Token::EntryKey(text("k")),
                Token::FieldName(text("t")),
                Token::Braced(text("v")),
                Token::CloseEntry,
                Token::EndOfFile,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            tokens("@article{key, title = {Title}"),
            Err(LexingError::UnexpectedEOF(..))
        ));
        assert!(matches!(
            tokens("@article{key, title = {Unbalanced { brace}"),
            Err(LexingError::UnexpectedEOF(..))
        ));
        assert!(matches!(
            tokens("@article{key, title {Title}}"),
            Err(LexingError::UnexpectedChar('{', _, _))
        ));
        assert!(matches!(
            tokens("@article{key, title = \"a}\"}"),
            Err(LexingError::UnbalancedBrace(_))
        ));
    }

    #[test]
    fn test_error_position() {
        match tokens("@article{key,\n  title = = x}") {
            Err(LexingError::UnexpectedChar('=', _, info)) => {
                assert_eq!(info.lineno, 1);
                assert_eq!(info.colno, 10);
                assert_eq!(info.current_key.as_deref(), Some("key"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    use proptest::prelude::*;
    proptest! {
        #[test]
        fn no_panic(s in "\\PC*") {
            let _ = tokens(&s);
        }
    }
}
