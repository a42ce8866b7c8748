mod cli;

use clap::Parser;

fn main() {
    let args = cli::Args::parse();
    std::process::exit(cli::run(args));
}
