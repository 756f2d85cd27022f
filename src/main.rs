use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use runegrep::{classify, Pattern};

/// A tiny grep; always behaves as egrep
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Interpret the pattern as an extended regular expression (always on)
    #[clap(short = 'E', long)]
    extended_regexp: bool,
    /// The pattern to match lines against
    pattern: String,
    /// Files to search; stdin when empty
    files: Vec<PathBuf>,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    // The engine only speaks the extended syntax; -E is accepted for grep
    // compatibility
    if !args.extended_regexp {
        log::debug!("-E not supplied; treating the pattern as extended anyway");
    }

    let pattern = match Pattern::try_from(args.pattern.as_str()) {
        Ok(pattern) => pattern,
        Err(error) => {
            eprintln!("Error compiling pattern {:?}: {error}", args.pattern);
            std::process::exit(2);
        }
    };

    log::debug!("Compiled pattern: {pattern:#?}");

    let result = if args.files.is_empty() {
        scan(io::stdin().lock(), &pattern, &args.pattern)
    } else {
        scan_files(&args.files, &pattern, &args.pattern)
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("Error reading input: {error}");
            std::process::exit(2);
        }
    }
}

// Emit every matching line unchanged; true if anything matched.
fn scan<R: BufRead>(reader: R, pattern: &Pattern, raw_pattern: &str) -> io::Result<bool> {
    let mut matched = false;
    for line in reader.lines() {
        let line = line?;
        if line_matches(pattern, raw_pattern, &line) {
            println!("{line}");
            matched = true;
        }
    }
    Ok(matched)
}

fn scan_files(files: &[PathBuf], pattern: &Pattern, raw_pattern: &str) -> io::Result<bool> {
    let mut matched = false;
    for path in files {
        let file = File::open(path)
            .map_err(|error| io::Error::new(error.kind(), format!("{}: {error}", path.display())))?;
        matched |= scan(BufReader::new(file), pattern, raw_pattern)?;
    }
    Ok(matched)
}

// Single-class patterns have cheap whole-line scans that skip the engine.
fn line_matches(pattern: &Pattern, raw_pattern: &str, line: &str) -> bool {
    match raw_pattern {
        classify::DIGIT_CLASS => classify::contains_digit(line),
        classify::WORD_CLASS => classify::contains_alphanumeric(line),
        _ => pattern.find(line),
    }
}
