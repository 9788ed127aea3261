#![forbid(unsafe_code)]

mod print;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gapit_trace::{CallRecord, DumpCommand, TraceReadError, TraceReader, DEFAULT_PROGRAM};

#[derive(Parser, Debug)]
#[command(
    name = "gapit-trace-dump",
    about = "List the API calls recorded in a gapit trace."
)]
struct Args {
    /// Trace file (or, with --text, the saved output of `gapit dump -observations`)
    trace: PathBuf,

    /// Dump program to run
    #[arg(long, value_name = "PATH", env = "GAPIT_BIN", default_value = DEFAULT_PROGRAM)]
    gapit: PathBuf,

    /// Read TRACE as already-dumped text instead of running the dump program
    #[arg(long, action = clap::ArgAction::SetTrue)]
    text: bool,

    /// Only print calls with this name
    #[arg(long, value_name = "NAME")]
    call: Option<String>,

    /// Also print parameters, return values, extras and observed ranges
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let printed = if args.text {
        let file = File::open(&args.trace)
            .with_context(|| format!("open dump text {}", args.trace.display()))?;
        print_calls(TraceReader::new(BufReader::new(file)), &args, &mut out)?
    } else {
        let mut process = DumpCommand::new(&args.trace)
            .program(&args.gapit)
            .spawn()
            .with_context(|| format!("dump trace {}", args.trace.display()))?;
        let printed = print_calls(process.by_ref(), &args, &mut out)?;
        process
            .finish()
            .with_context(|| format!("dump trace {}", args.trace.display()))?;
        printed
    };

    out.flush().context("write output")?;
    tracing::debug!(printed, "done");
    Ok(())
}

fn print_calls<I>(calls: I, args: &Args, out: &mut impl Write) -> anyhow::Result<usize>
where
    I: Iterator<Item = Result<CallRecord, TraceReadError>>,
{
    let mut printed = 0usize;
    for call in calls {
        let call = call.with_context(|| format!("parse {}", args.trace.display()))?;
        if args.call.as_deref().is_some_and(|name| name != call.name) {
            continue;
        }
        print::write_call(out, &call, args.verbose).context("write output")?;
        printed += 1;
    }
    Ok(printed)
}
