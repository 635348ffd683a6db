// lexfst-build: Build an FST from sorted `key<TAB>value` lines.
//
// Keys must arrive sorted by their labels in the chosen width (for byte1,
// plain byte order, as produced by `LC_ALL=C sort`). Lines without a tab get
// their line ordinal as value, which makes the result usable with
// `lexfst-lookup reverse`.
//
// Usage:
//   lexfst-build [OPTIONS] -o OUT.fst [INPUT]
//
// Set RUST_LOG=debug for build statistics.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use lexfst::outputs::PositiveIntOutputs;
use lexfst::{FstBuilder, InputType};
use lexfst_cli::{Width, fatal, key_labels, load_options, parse_line};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "lexfst-build", version, about = "Build an FST from sorted key/value lines")]
struct Args {
    /// Input file; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Where to write the FST.
    #[arg(short, long)]
    output: PathBuf,

    /// Label width of the keys.
    #[arg(short, long, value_enum, default_value = "byte1")]
    width: Width,

    /// JSON file with builder options.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Disable suffix sharing (overrides the options file).
    #[arg(long)]
    no_share: bool,
}

fn main() {
    lexfst_cli::init_tracing();
    let args = Args::parse();

    let mut options = load_options(args.options.as_deref()).unwrap_or_else(|e| fatal(&e));
    if args.no_share {
        options.share_suffix = false;
    }
    let input_type = InputType::from(args.width);
    let mut builder = FstBuilder::with_options(input_type, PositiveIntOutputs, options)
        .unwrap_or_else(|e| fatal(&e.to_string()));

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).unwrap_or_else(|e| fatal(&format!("failed to open {}: {e}", path.display()))),
        )),
        None => Box::new(BufReader::new(io::stdin().lock())),
    };

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.unwrap_or_else(|e| fatal(&format!("failed to read input: {e}")));
        let line = line.trim_end_matches('\r');
        let (key, value) = parse_line(line, line_no as u64)
            .unwrap_or_else(|e| fatal(&format!("line {}: {e}", line_no + 1)));
        if let Err(e) = builder.add(&key_labels(input_type, key), value) {
            fatal(&format!("line {}: {e}", line_no + 1));
        }
    }

    let inputs = builder.input_count();
    let (fst, stats) = builder
        .finish_with_stats()
        .unwrap_or_else(|e| fatal(&e.to_string()));
    let Some(fst) = fst else {
        fatal("no inputs survived; nothing to write");
    };
    fst.save_to_path(&args.output)
        .unwrap_or_else(|e| fatal(&format!("failed to write {}: {e}", args.output.display())));

    info!(path = %args.output.display(), "wrote fst");
    eprintln!(
        "{inputs} inputs, {} nodes, {} arcs ({} binary-search nodes, {} direct-addressing nodes), {} bytes",
        stats.node_count,
        stats.arc_count,
        stats.binary_search_node_count,
        stats.direct_addressing_node_count,
        fst.num_bytes()
    );
}
