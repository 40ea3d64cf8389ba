//! Command-line tool for inspecting YAML concrete syntax trees.
//!
//! Usage: yamcst [OPTIONS] [FILE]
//!
//! Options:
//!   --tree                 Print an indented outline of the tree [default]
//!   --json                 Print the tree as JSON
//!   --check                Check if input parses (exit 0 if valid, 1 if invalid)
//!   --roundtrip            Print the input as rendered back from the tree
//!                          (exit 1 if it differs from the input)
//!   --max-bytes <N>        Refuse inputs longer than N bytes
//!   -h, --help             Print help
//!   -V, --version          Print version

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use libyamcst::{parse_with_filename, Document, NodeId, Tree};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Tree,
    Json,
    Check,
    RoundTrip,
}

#[derive(Debug)]
struct Config {
    mode: Mode,
    input_path: Option<String>,
    max_bytes: Option<usize>,
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn parse_max_bytes(s: &str) -> Result<usize, String> {
    s.parse()
        .map_err(|_| format!("Invalid byte count: {}", s))
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let mut mode = Mode::Tree;
    let mut input_path = None;
    let mut max_bytes = match env::var("YAMCST_MAX_BYTES") {
        Ok(value) => Some(parse_max_bytes(&value)?),
        Err(_) => None,
    };

    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("yamcst {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "--tree" => mode = Mode::Tree,
            "--json" => mode = Mode::Json,
            "--check" => mode = Mode::Check,
            "--roundtrip" => mode = Mode::RoundTrip,
            "--max-bytes" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "--max-bytes requires an argument".to_string())?;
                max_bytes = Some(parse_max_bytes(value)?);
            }
            "-" => {
                // Explicit stdin
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if input_path.is_some() {
                    return Err("Multiple input files specified".to_string());
                }
                input_path = Some(arg.clone());
            }
        }
        i += 1;
    }

    Ok(Config {
        mode,
        input_path,
        max_bytes,
    })
}

fn read_input(config: &Config) -> Result<String, String> {
    let input = match &config.input_path {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buffer
        }
    };
    if let Some(max) = config.max_bytes {
        if input.len() > max {
            return Err(format!(
                "Input is {} bytes, more than the limit of {}",
                input.len(),
                max
            ));
        }
    }
    Ok(input)
}

/// Returns the process exit code.
fn run(args: &[String]) -> Result<i32, String> {
    let config = parse_args(args)?;
    let input = read_input(&config)?;
    let filename = config.input_path.as_deref();
    log::debug!(
        "parsing {} bytes from {}",
        input.len(),
        filename.unwrap_or("<stdin>")
    );

    match config.mode {
        Mode::Check => match parse_with_filename(&input, filename) {
            Ok(_) => Ok(0),
            Err(e) => {
                eprintln!("{}", e);
                Ok(1)
            }
        },
        Mode::RoundTrip => {
            let doc = Document::parse(&input);
            let rendered = doc.render();
            print!("{}", rendered);
            if rendered == doc.src() {
                Ok(0)
            } else {
                log::warn!("rendered document differs from its source");
                Ok(1)
            }
        }
        Mode::Tree => {
            let doc = Document::parse(&input);
            report_errors(&doc, filename);
            for &id in doc.contents() {
                print!("{}", doc.tree().outline(id));
            }
            if let Some(offset) = doc.boundary() {
                println!("(stopped at document marker at {})", offset);
            }
            Ok(0)
        }
        Mode::Json => {
            let doc = Document::parse(&input);
            let json = convert_document(&doc);
            let text = serde_json::to_string_pretty(&json)
                .map_err(|e| format!("Failed to serialize tree: {}", e))?;
            println!("{}", text);
            Ok(0)
        }
    }
}

fn report_errors(doc: &Document, filename: Option<&str>) {
    for (id, error) in doc.errors() {
        let (line, col) = doc.line_col(doc.tree().node(id).range.start);
        match filename {
            Some(name) => eprintln!("warning: {} at {}:{} of <{}>", error, line + 1, col + 1, name),
            None => eprintln!("warning: {} at {}:{}", error, line + 1, col + 1),
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    boundary: Option<usize>,
    errors: Vec<JsonError>,
    contents: Vec<JsonNode<'a>>,
}

#[derive(Serialize)]
struct JsonError {
    message: String,
    line: usize,
    column: usize,
}

#[derive(Serialize)]
struct JsonNode<'a> {
    #[serde(rename = "type")]
    node_type: &'static str,
    range: [usize; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    orig: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anchor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonNode<'a>>,
}

fn convert_document(doc: &Document) -> JsonDocument<'_> {
    JsonDocument {
        boundary: doc.boundary(),
        errors: doc
            .errors()
            .into_iter()
            .map(|(id, error)| {
                let (line, col) = doc.line_col(doc.tree().node(id).range.start);
                JsonError {
                    message: error.to_string(),
                    line: line + 1,
                    column: col + 1,
                }
            })
            .collect(),
        contents: doc
            .contents()
            .iter()
            .map(|&id| convert_node(doc.tree(), id))
            .collect(),
    }
}

fn convert_node(tree: &Tree, id: NodeId) -> JsonNode<'_> {
    let node = tree.node(id);
    let children: Vec<_> = tree
        .children(id)
        .into_iter()
        .map(|child| convert_node(tree, child))
        .collect();
    JsonNode {
        node_type: node.node_type().as_str(),
        range: [node.range.start, node.range.end],
        orig: node.range.orig.map(|(start, end)| [start, end]),
        value: if children.is_empty() && !node.is_trivia() {
            tree.raw_value(id)
        } else {
            None
        },
        anchor: tree.anchor(id),
        tag: tree.tag(id).map(|tag| tag.to_string()),
        comment: tree.comment(id),
        error: node.error.as_ref().map(|e| e.to_string()),
        children,
    }
}

fn print_help() {
    println!(
        "yamcst - YAML concrete syntax tree tool

USAGE:
    yamcst [OPTIONS] [FILE]

ARGS:
    [FILE]    Input file (reads from stdin if not provided or '-')

OPTIONS:
    --tree               Print an indented outline of the tree (default)
    --json               Print the tree as JSON
    --check              Check if input parses (exit 0 if valid, 1 if invalid)
    --roundtrip          Print the input as rendered back from the tree
                         (exit 1 if it differs from the input)
    --max-bytes <N>      Refuse inputs longer than N bytes
                         [env: YAMCST_MAX_BYTES]
    -h, --help           Print help
    -V, --version        Print version

ENVIRONMENT:
    RUST_LOG             Log filter, e.g. RUST_LOG=libyamcst=trace"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("yamcst")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let config = parse_args(&args(&["--json", "--max-bytes", "10", "a.yaml"])).unwrap();
        assert_eq!(config.mode, Mode::Json);
        assert_eq!(config.max_bytes, Some(10));
        assert_eq!(config.input_path.as_deref(), Some("a.yaml"));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--max-bytes"])).is_err());
        assert!(parse_args(&args(&["--max-bytes", "lots"])).is_err());
        assert!(parse_args(&args(&["a.yaml", "b.yaml"])).is_err());
    }

    #[test]
    fn test_json_tree() {
        let doc = Document::parse("- &x a # note\n");
        let json = serde_json::to_value(convert_document(&doc)).unwrap();
        let seq = &json["contents"][0];
        assert_eq!(seq["type"], "SEQ");
        let plain = &seq["children"][0]["children"][0];
        assert_eq!(plain["type"], "PLAIN");
        assert_eq!(plain["value"], "a");
        assert_eq!(plain["anchor"], "x");
        assert_eq!(plain["comment"], " note");
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
