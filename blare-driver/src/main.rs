// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `blare` command: reads a serialised typed SSA module, runs the
//! translation engine, and writes the Boogie text (plus an optional
//! source-location sidecar). Exit status is zero only when translation
//! succeeded; no partial output file is kept.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blare_compiler::{preprocessing, Error, ModuleTranslator, SourceLanguage};
use blare_ir::emitter::{
    BvRepresentation, IntegerRepresentation, MathRepresentation, ModuleWriter,
    PointerRepresentation, RaceInstrumenter,
};
use blare_ir::simplify_stmt;

#[derive(Debug, Parser)]
#[command(name = "blare", about = "Translates typed SSA IR to Boogie for GPU kernel verification")]
struct Args {
    /// Input module (serialised typed SSA IR).
    #[arg(value_name = "input")]
    input: PathBuf,

    /// Override the output filename.
    #[arg(short = 'o', value_name = "file")]
    output: Option<PathBuf>,

    /// GPU entry point function name (repeatable).
    #[arg(short = 'k', value_name = "function")]
    kernel: Vec<String>,

    /// Module source language (c, cu, cl; default c).
    #[arg(short = 'l', value_name = "language")]
    language: Option<String>,

    /// Integer representation (bv, math; default bv).
    #[arg(short = 'i', value_name = "intrep")]
    integer_representation: Option<String>,

    /// Assume all function calls have been inlined.
    #[arg(long)]
    inline: bool,

    /// Race instrumentation method to use
    /// (standard, watchdog-single, watchdog-multiple; default standard).
    #[arg(long = "race-instrumentation", value_name = "method")]
    race_instrumentation: Option<String>,

    /// Write a source-location sidecar file.
    #[arg(short = 's', value_name = "file")]
    source_loc_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("blare: {}: error: {e}", args.input.display());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let lang: SourceLanguage = args.language.as_deref().unwrap_or("").parse()?;

    let int_rep: Box<dyn IntegerRepresentation> =
        match args.integer_representation.as_deref().unwrap_or("bv") {
            "bv" => Box::new(BvRepresentation),
            "math" => Box::new(MathRepresentation),
            other => {
                return Err(
                    Error::parameter(format!("unsupported integer representation: {other}"))
                        .into(),
                );
            }
        };

    let race_inst = match args.race_instrumentation.as_deref().unwrap_or("standard") {
        "standard" => RaceInstrumenter::Standard,
        "watchdog-single" => RaceInstrumenter::WatchdogSingle,
        "watchdog-multiple" => RaceInstrumenter::WatchdogMultiple,
        other => {
            return Err(
                Error::parameter(format!("unsupported race instrumentation: {other}")).into()
            );
        }
    };

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let module: blare_ssa::Module = serde_json::from_str(&text)
        .map_err(|e| anyhow!("input module did not read correctly: {e}"))?;

    let entry_points: BTreeSet<String> = args.kernel.iter().cloned().collect();

    if args.inline {
        preprocessing::check_call_graph_acyclic(&module)?;
        preprocessing::check_no_contracts_on_inlined(&module, lang, &entry_points)?;
    }
    preprocessing::warn_missing_restrict(&module, lang, &entry_points);

    let mut translator = ModuleTranslator::new(&module, lang, entry_points);
    translator.translate()?;
    let mut bm = translator.take_module();
    simplify_stmt(&mut bm);

    let writer =
        ModuleWriter::new(&bm, int_rep.as_ref(), race_inst, PointerRepresentation::Datatype);
    let (output, source_locs) =
        writer.write_to_string().map_err(|_| anyhow!("formatting the module failed"))?;

    let out_path =
        args.output.clone().unwrap_or_else(|| args.input.with_extension("bpl"));
    fs::write(&out_path, output)
        .with_context(|| format!("cannot write {}", out_path.display()))?;

    if let Some(sidecar) = &args.source_loc_file {
        let mut lines = String::new();
        for (i, loc) in source_locs.iter().enumerate() {
            lines.push_str(&format!("{i}\t{}\t{}\t{}\t{}\n", loc.file, loc.line, loc.col, loc.dir));
        }
        fs::write(sidecar, lines)
            .with_context(|| format!("cannot write {}", sidecar.display()))?;
    }

    Ok(())
}
