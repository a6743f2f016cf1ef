use std::error;
use std::fs;

use bibmacro::{Entry, ParseOptions, Parser};

use clap;
use clap::Parser as CLIParser;

#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Filepath to file to parse
    #[clap(short, long)]
    input: String,

    /// Return only entries with this key
    #[clap(short, long)]
    query_key: Option<String>,

    /// Replace field values naming a macro by the macro's text
    #[clap(short, long)]
    expand: bool,

    /// Print the entries as .bib source again
    #[clap(short, long)]
    stringify: bool,

    #[cfg(feature = "serde_json")]
    #[clap(long)]
    json: bool,
}

fn read_entries(s: &Settings) -> Result<Vec<Entry>, Box<dyn error::Error>> {
    let content = fs::read_to_string(&s.input)?;
    let options = if s.expand {
        ParseOptions::EXPAND_MACROS
    } else {
        ParseOptions::default()
    };
    let mut p = Parser::new();
    let entries = p.try_parse_string(&content, &s.input, options)?;
    Ok(entries
        .into_iter()
        .filter(|entry| match &s.query_key {
            Some(query) => query == &entry.key,
            None => true,
        })
        .collect())
}

fn print_human_readable(entries: &[Entry]) {
    for entry in entries {
        println!("type = {} ({})", entry.kind, entry.metatype);
        println!("key = {}", entry.key);
        for (name, data) in entry.fields.iter() {
            println!("\t{}\t= {}", name, data);
        }
    }
}

#[cfg(feature = "serde_json")]
fn print_json(entries: &[Entry]) -> Result<(), Box<dyn error::Error>> {
    println!("{}", serde_json::to_string(entries)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::parse();
    let entries = read_entries(&settings)?;

    #[cfg(feature = "serde_json")]
    {
        if settings.json {
            return print_json(&entries);
        }
    }

    if settings.stringify {
        println!("{}", bibmacro::stringify_entries(&entries));
    } else {
        print_human_readable(&entries);
    }

    Ok(())
}
