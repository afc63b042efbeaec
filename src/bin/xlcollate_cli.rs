//! CLI tool for xlcollate - merges XLSX files into one paginated document
//!
//! Usage:
//!   xlcollate_cli merge <output.xlsx> <input.xlsx>... [options]
//!   xlcollate_cli split <input.xlsx> <output-prefix>
//!   xlcollate_cli inspect <input.xlsx> [-o out.json]
//!
//! Merge options:
//!   --force-breaks      one item per page
//!   --max-per-page <n>  cap items on a page
//!   --max-per-row <n>   cap items in a row
//!   --numeric           collapse text and formulas to numbers

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use xlcollate::{
    consolidate_to_bytes, parse_workbook, split_by_pages, write_workbook, ConsolidateOptions,
    ValueCopy,
};

const USAGE: &str = "Usage:
  xlcollate_cli merge <output.xlsx> <input.xlsx>... [--force-breaks] [--max-per-page <n>] [--max-per-row <n>] [--numeric]
  xlcollate_cli split <input.xlsx> <output-prefix>
  xlcollate_cli inspect <input.xlsx> [-o out.json]";

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "merge" => merge(&args[2..]),
        "split" => split(&args[2..]),
        "inspect" => inspect(&args[2..]),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

fn merge(args: &[String]) {
    let mut options = ConsolidateOptions::default();
    let mut paths: Vec<&String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--force-breaks" => options.force_page_breaks = true,
            "--numeric" => options.value_copy = ValueCopy::NumericDisplay,
            "--max-per-page" => {
                options.max_items_per_page = Some(numeric_flag(args, &mut i));
            }
            "--max-per-row" => {
                options.max_items_per_row = Some(numeric_flag(args, &mut i));
            }
            flag if flag.starts_with("--") => {
                eprintln!("Unknown option: {flag}");
                std::process::exit(1);
            }
            _ => paths.push(&args[i]),
        }
        i += 1;
    }

    if paths.len() < 2 {
        eprintln!("merge needs an output path and at least one input");
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let output_path = paths[0];
    let sources: Vec<Vec<u8>> = paths[1..].iter().map(|path| read_file(path)).collect();

    let merged = match consolidate_to_bytes(&sources, &options) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error consolidating: {e}");
            std::process::exit(1);
        }
    };

    write_file(output_path, &merged);
    eprintln!("Written: {output_path} ({} sources)", sources.len());
}

fn split(args: &[String]) {
    if args.len() != 2 {
        eprintln!("split needs an input path and an output prefix");
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let data = read_file(&args[0]);
    let workbook = match parse_workbook(&data) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Error parsing {}: {e}", args[0]);
            std::process::exit(1);
        }
    };

    let pages = split_by_pages(&workbook);
    if pages.is_empty() {
        eprintln!("No pages found in {}", args[0]);
        std::process::exit(1);
    }

    for (index, page) in pages.iter().enumerate() {
        let path = format!("{}-{}.xlsx", args[1], index + 1);
        let bytes = match write_workbook(page) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error writing page {}: {e}", index + 1);
                std::process::exit(1);
            }
        };
        write_file(&path, &bytes);
        eprintln!("Written: {path}");
    }
}

fn inspect(args: &[String]) {
    if args.is_empty() {
        eprintln!("inspect needs an input path");
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let output_path = if args.len() > 2 && args[1] == "-o" {
        Some(&args[2])
    } else {
        None
    };

    let data = read_file(&args[0]);
    let workbook = match parse_workbook(&data) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Error parsing {}: {e}", args[0]);
            std::process::exit(1);
        }
    };

    let json = match serde_json::to_string_pretty(&workbook) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {e}");
            std::process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            write_file(path, json.as_bytes());
            eprintln!("Written: {path}");
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}

fn numeric_flag(args: &[String], i: &mut usize) -> u32 {
    *i += 1;
    let Some(value) = args.get(*i) else {
        eprintln!("{} needs a value", args[*i - 1]);
        std::process::exit(1);
    };
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("{} needs a number, got {value}", args[*i - 1]);
            std::process::exit(1);
        }
    }
}

fn read_file(path: &str) -> Vec<u8> {
    match fs::read(path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn write_file(path: &str, bytes: &[u8]) {
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing {path}: {e}");
        std::process::exit(1);
    }
}
