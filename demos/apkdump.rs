use clap::Parser;
use dexread::android::{read_apk_with, ApkOptions, ErrorPolicy};
use dexread::dump::DexApkDumper;
use dexread::visit::{DexApkVisitor, RecordingVisitor};
use dexread::{read_dex_file, DexError};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Dump the classes and methods of APK and DEX files.
#[derive(Parser, Debug)]
#[command(name = "apkdump", version)]
struct Args {
    /// Verbosity level for trace lines
    #[arg(short = 'v', long = "verbose", default_value_t = 0)]
    vlevel: u32,

    /// Print each dex, class and method
    #[arg(long)]
    dump: bool,

    /// Print the visited events as JSON instead of text
    #[arg(long, conflicts_with = "dump")]
    json: bool,

    /// Carry on with the next dex entry when one fails to decode
    #[arg(long)]
    keep_going: bool,

    /// .apk or .dex files to examine
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

/// Visits everything and prints nothing, for checking that files decode.
struct Silent;

impl DexApkVisitor for Silent {
    fn visit_apk(&mut self, _apk: &str) {}
    fn visit_dex(&mut self, _dex: &str, _signature: &[u8; 20]) {}
    fn visit_class(&mut self, _name: &str, _method_count: u32) {}
    fn visit_method(&mut self, _name: &str, _method_idx: u32, _code_offset: u32) {}
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut failed = false;
    for file in &args.files {
        if let Err(e) = process(file, &args) {
            eprintln!("error: {}", e);
            failed = true;
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn process(file: &Path, args: &Args) -> Result<(), Box<dyn Error>> {
    if args.json {
        let mut v = RecordingVisitor::new();
        walk(file, args, &mut v)?;
        println!("{}", serde_json::to_string_pretty(&v.events)?);
    } else if args.dump || args.vlevel > 0 {
        let mut dumper = DexApkDumper::stdout(args.vlevel);
        walk(file, args, &mut dumper)?;
        dumper.finish()?;
    } else {
        walk(file, args, &mut Silent)?;
    }
    Ok(())
}

fn walk(file: &Path, args: &Args, visitor: &mut dyn DexApkVisitor) -> Result<(), DexError> {
    if file.extension().map_or(false, |ext| ext == "dex") {
        return read_dex_file(file, visitor);
    }

    let on_error = if args.keep_going { ErrorPolicy::Skip } else { ErrorPolicy::Abort };
    let report = read_apk_with(file, visitor, ApkOptions { on_error })?;
    for e in &report.failures {
        eprintln!("skipped: {}", e);
    }
    Ok(())
}
