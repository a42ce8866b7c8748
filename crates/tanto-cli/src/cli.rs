//! Argument parsing and dispatch into the frontend.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use tanto_front::{FrontendArgs, Mode, run_frontend};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Compute,
    Read,
    Write,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Mode {
        match mode {
            ModeArg::Compute => Mode::Compute,
            ModeArg::Read => Mode::Read,
            ModeArg::Write => Mode::Write,
        }
    }
}

/// Lower a Tanto kernel into compute or dataflow C++.
#[derive(Debug, Parser)]
#[command(name = "tanto", version)]
pub struct Args {
    /// Target kernel flavor.
    #[arg(short, long, value_enum)]
    pub mode: ModeArg,

    /// Preprocessor define, `name=value` (repeatable, ordered).
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
    pub defines: Vec<String>,

    /// Compile-time parameter substitution, `index=value` (repeatable).
    #[arg(short = 'P', long = "param", value_name = "INDEX=VALUE")]
    pub params: Vec<String>,

    /// Input kernel source.
    pub input: PathBuf,

    /// Output file (stdout when absent).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: Args) -> i32 {
    let input_code = match fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", args.input.display());
            return 1;
        }
    };

    let mut defines = Vec::new();
    for entry in &args.defines {
        match entry.split_once('=') {
            Some((name, value)) => defines.push((name.to_string(), value.to_string())),
            None => {
                eprintln!("error: invalid define `{entry}` (expected name=value)");
                return 1;
            }
        }
    }

    let mut params = Vec::new();
    for entry in &args.params {
        let parsed = entry
            .split_once('=')
            .and_then(|(index, value)| Some((index.parse().ok()?, value.parse().ok()?)));
        match parsed {
            Some(pair) => params.push(pair),
            None => {
                eprintln!("error: invalid param `{entry}` (expected index=value)");
                return 1;
            }
        }
    }

    let frontend_args = FrontendArgs {
        mode: args.mode.into(),
        defines,
        params,
    };
    match run_frontend(&frontend_args, &input_code) {
        Ok(output) => {
            if let Some(path) = &args.output {
                if let Err(err) = fs::write(path, output) {
                    eprintln!("error: cannot write {}: {err}", path.display());
                    return 1;
                }
            } else {
                print!("{output}");
            }
            0
        }
        Err(errors) => {
            for error in errors {
                eprintln!("error: {error}");
            }
            1
        }
    }
}
