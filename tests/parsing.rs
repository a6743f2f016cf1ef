use bibmacro::{Metatype, ParseOptions, Parser, DEFAULT_SOURCE_LABEL};

fn parse(src: &str) -> Vec<bibmacro::Entry> {
    Parser::new().parse(src)
}

fn parse_expanded(p: &mut Parser, src: &str) -> Vec<bibmacro::Entry> {
    p.parse_string(src, DEFAULT_SOURCE_LABEL, ParseOptions::EXPAND_MACROS)
}

#[test]
fn test_regular_entry_with_comments() {
    let src = r#"
% a sample "regular" entry (ie. not a @comment, @preamble, or @string

@book{abook,
title = {A } # "Book",                   % an in-entry comment
editor = {  John Q.  Random} # junk,
publisher = {Foo Bar \& Sons},
year = 1922
}
"#;
    let entries = parse(src);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.kind, "book");
    assert_eq!(entry.key, "abook");
    assert_eq!(entry.metatype, Metatype::Regular);
    assert_eq!(entry.fields.get("title"), Some("A Book"));
    assert_eq!(entry.fields.get("editor"), Some("  John Q.  Randomjunk"));
    assert_eq!(entry.fields.get("publisher"), Some(r"Foo Bar \& Sons"));
    assert_eq!(entry.fields.get("year"), Some("1922"));
}

#[test]
fn test_mixed_file() {
    let src = r#"
@book{abook, title = {A Book}}

@string{macro = "macro  text ",
        foo   = "blah blah   " # "ding dong "}

@comment(this is a comment entry, anything at all can go in it (as long
         as parentheses are balanced), even {braces})

@preamble{" This is   a preamble" # "---the concatenation of several strings"}
"#;
    let mut p = Parser::new();
    let entries = p.parse(src);
    assert_eq!(entries.len(), 4);
    let metatypes: Vec<Metatype> = entries.iter().map(|e| e.metatype).collect();
    assert_eq!(
        metatypes,
        vec![
            Metatype::Regular,
            Metatype::MacroDef,
            Metatype::Comment,
            Metatype::Preamble
        ]
    );

    assert_eq!(entries[1].key, "");
    assert_eq!(entries[1].fields.get("macro"), Some("macro  text "));
    assert_eq!(entries[1].fields.get("foo"), Some("blah blah   ding dong "));
    assert_eq!(p.lookup_macro("foo"), Some("blah blah   ding dong "));

    assert_eq!(
        entries[2].content(),
        Some("this is a comment entry, anything at all can go in it (as long\n         as parentheses are balanced")
    );
    assert_eq!(
        entries[3].content(),
        Some(" This is   a preamble---the concatenation of several strings")
    );
}

#[test]
fn test_escapes() {
    let entries = parse(r#"@string{publisher = "Foo Bar \& Sons"}"#);
    assert_eq!(entries[0].fields.get("publisher"), Some(r"Foo Bar \& Sons"));

    let entries = parse(r#"@article{key123, title = "Quotes \"inside\" string"}"#);
    assert_eq!(entries[0].fields.get("title"), Some(r#"Quotes "inside" string"#));

    let entries = parse(r"@article{key123, title = {Escaped \{braces\} in string}}");
    assert_eq!(entries[0].fields.get("title"), Some(r"Escaped \{braces\} in string"));

    let entries = parse(r#"@article{k, title = "Set \}"}"#);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fields.get("title"), Some(r"Set \}"));

    let entries = parse(r"@article{key123, title = {Trailing backslash \}}");
    assert_eq!(entries[0].fields.get("title"), Some(r"Trailing backslash \"));

    let entries = parse(r"@article{key123, title = {Complex $\mathcal{O}(n^2)$ notation}}");
    assert_eq!(
        entries[0].fields.get("title"),
        Some(r"Complex $\mathcal{O}(n^2)$ notation")
    );

    let entries = parse(r"@article{key, title = {Special $ # % & _ ^ ~ \ { } characters}}");
    assert_eq!(
        entries[0].fields.get("title"),
        Some(r"Special $ # % & _ ^ ~ \ { } characters")
    );
}

#[test]
fn test_values() {
    let entries = parse(
        r##"@article{key, a = {A {B} C}, b = "First" # " " # "Second", c = "First" # 123 # {Last},
        d = "First"#"Second", e = 10--20, f = {}, g = "", TITLE = {x}}"##,
    );
    let fields = &entries[0].fields;
    assert_eq!(fields.get("a"), Some("A {B} C"));
    assert_eq!(fields.get("b"), Some("First Second"));
    assert_eq!(fields.get("c"), Some("First123Last"));
    assert_eq!(fields.get("d"), Some("FirstSecond"));
    assert_eq!(fields.get("e"), Some("10--20"));
    assert_eq!(fields.get("f"), Some(""));
    assert_eq!(fields.get("g"), Some(""));
    assert_eq!(fields.get("title"), Some("x"));
    let names: Vec<&str> = fields.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["a", "b", "c", "d", "e", "f", "g", "title"]);
}

#[test]
fn test_entry_structure() {
    let entries = parse("@article(key123)");
    assert_eq!(entries[0].key, "key123");
    assert!(entries[0].fields.is_empty());

    let entries = parse("@ArTiClE{Smith-Jones_2020:paper.1, title = {T},}");
    assert_eq!(entries[0].kind, "article");
    assert_eq!(entries[0].key, "Smith-Jones_2020:paper.1");

    let entries = parse("@customentrya{key, title = {Custom Entry}}");
    assert_eq!(entries[0].kind, "customentrya");
    assert_eq!(entries[0].metatype, Metatype::Regular);

    let entries = parse("@article{key1}@article{key2}");
    assert_eq!(entries.len(), 2);

    let entries = parse("@article{key1,\ntitle = {Title1}\n}\r\n@article{key2,\rtitle = {Title2}\r}");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].fields.get("title"), Some("Title2"));

    let entries = parse("\n  @article { key123,\n  title = {Multiline \n    Title},\n  author = \"Some Author\"\n}\n");
    assert_eq!(entries[0].key, "key123");
    assert_eq!(entries[0].fields.get("title"), Some("Multiline \n    Title"));
}

#[test]
fn test_macro_resolution() {
    let mut p = Parser::new();
    let entries = p.parse("@string{j = \"J\"}\n@a{k, journal = j, p = unknownpub}");
    assert_eq!(entries[1].fields.get("journal"), Some("J"));
    assert_eq!(entries[1].fields.get("p"), Some("unknownpub"));

    let mut p = Parser::new();
    p.parse("@string{first = \"First\"}");
    p.parse("@string{second = first # \" Second\"}");
    let entries = parse_expanded(&mut p, "@article{key, title = second}");
    assert_eq!(entries[0].fields.get("title"), Some("First Second"));

    let mut p = Parser::new();
    let entries = parse_expanded(
        &mut p,
        "@string{prefix = \"The \"}\n@article{complex, title = prefix # {Journal of {Complex} Parsing}}",
    );
    assert_eq!(
        entries[1].fields.get("title"),
        Some("The Journal of {Complex} Parsing")
    );
}

#[test]
fn test_macro_api() {
    let mut p = Parser::new();
    p.parse("@string{journal = \"Test Journal\"}");
    p.parse("@STRING{publisher = \"Test Publisher\"}");
    assert!(p.macro_exists("journal"));
    assert!(p.macro_exists("PUBLISHER"));
    assert!(p.delete_macro("journal"));
    assert!(!p.macro_exists("journal"));
    assert!(!p.delete_macro("nonexistent"));
    assert!(p.delete_macro("PUBLISHER"));
    assert!(p.macro_names().is_empty());
}

#[test]
fn test_malformed_input() {
    let mut p = Parser::new();
    assert!(p.parse("@article{key, title = {Title}").is_empty());
    assert!(p.parse("@article{key, title = {Unbalanced { brace}").is_empty());
    assert!(p.parse("@article{key, title {Title}}").is_empty());
    assert!(p.parse("").is_empty());
}
