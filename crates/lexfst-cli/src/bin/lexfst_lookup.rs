// lexfst-lookup: Query an FST built by lexfst-build.
//
// Usage:
//   lexfst-lookup FST get WORD...       exact lookups
//   lexfst-lookup FST ceil WORD         smallest key >= WORD
//   lexfst-lookup FST floor WORD        largest key <= WORD
//   lexfst-lookup FST prefix PREFIX     every key starting with PREFIX
//   lexfst-lookup FST dump              every key in order
//   lexfst-lookup FST reverse ORD       key whose value is ORD
//   lexfst-lookup FST dot               Graphviz rendering on stdout
//
// Output lines are `key<TAB>value`. Pass --mmap to map the file instead of
// reading it into memory.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lexfst::outputs::PositiveIntOutputs;
use lexfst::{Fst, FstEnum, InputType, util};
use lexfst_cli::{fatal, key_labels, labels_text};

#[derive(Debug, Parser)]
#[command(name = "lexfst-lookup", version, about = "Query an FST file")]
struct Args {
    /// FST file written by lexfst-build.
    fst: PathBuf,

    /// Memory-map the file instead of loading it onto the heap.
    #[arg(long)]
    mmap: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exact lookup of one or more keys.
    Get { words: Vec<String> },
    /// Smallest key greater than or equal to WORD.
    Ceil { word: String },
    /// Largest key less than or equal to WORD.
    Floor { word: String },
    /// Every key starting with PREFIX.
    Prefix { prefix: String },
    /// Every key in sorted order.
    Dump,
    /// Key mapped to the given value, for FSTs with increasing values.
    Reverse { ord: u64 },
    /// Graphviz dot rendering.
    Dot,
}

fn open(args: &Args) -> lexfst::Result<Fst<PositiveIntOutputs>> {
    if args.mmap {
        Fst::open_mmap(&args.fst, PositiveIntOutputs)
    } else {
        Fst::read_from_path(&args.fst, PositiveIntOutputs)
    }
}

fn print_entry(out: &mut impl Write, input_type: InputType, labels: &[i32], value: u64) -> io::Result<()> {
    writeln!(out, "{}\t{value}", labels_text(input_type, labels))
}

fn run(args: &Args, fst: &Fst<PositiveIntOutputs>, out: &mut impl Write) -> Result<(), String> {
    let input_type = fst.input_type();
    let err = |e: lexfst::FstError| e.to_string();
    let io_err = |e: io::Error| format!("failed to write output: {e}");

    match &args.command {
        Command::Get { words } => {
            for word in words {
                match fst.get(&key_labels(input_type, word)).map_err(err)? {
                    Some(value) => writeln!(out, "{word}\t{value}").map_err(io_err)?,
                    None => writeln!(out, "{word}\t-").map_err(io_err)?,
                }
            }
        }
        Command::Ceil { word } | Command::Floor { word } => {
            let target = key_labels(input_type, word);
            let mut e = FstEnum::new(fst);
            let found = if matches!(args.command, Command::Ceil { .. }) {
                e.seek_ceil(&target).map_err(err)?
            } else {
                e.seek_floor(&target).map_err(err)?
            };
            match found {
                Some(io) => print_entry(out, input_type, io.input, *io.output).map_err(io_err)?,
                None => writeln!(out, "-").map_err(io_err)?,
            }
        }
        Command::Prefix { prefix } => {
            let prefix = key_labels(input_type, prefix);
            let mut e = FstEnum::new(fst);
            let mut found = e.seek_ceil(&prefix).map_err(err)?.map(|io| io.cloned());
            while let Some((input, value)) = found {
                if !input.starts_with(&prefix) {
                    break;
                }
                print_entry(out, input_type, &input, value).map_err(io_err)?;
                found = e.next().map_err(err)?.map(|io| io.cloned());
            }
        }
        Command::Dump => {
            let mut e = FstEnum::new(fst);
            while let Some(io) = e.next().map_err(err)? {
                print_entry(out, input_type, io.input, *io.output).map_err(io_err)?;
            }
        }
        Command::Reverse { ord } => match util::get_by_output(fst, *ord).map_err(err)? {
            Some(labels) => print_entry(out, input_type, &labels, *ord).map_err(io_err)?,
            None => writeln!(out, "-").map_err(io_err)?,
        },
        Command::Dot => util::to_dot(fst, out).map_err(err)?,
    }
    out.flush().map_err(io_err)
}

fn main() {
    lexfst_cli::init_tracing();
    let args = Args::parse();

    let fst = open(&args)
        .unwrap_or_else(|e| fatal(&format!("failed to load {}: {e}", args.fst.display())));
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Err(e) = run(&args, &fst, &mut out) {
        fatal(&e);
    }
}
