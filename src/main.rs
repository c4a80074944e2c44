use clap::Parser;
use codegraph::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    codegraph::logging::init();
    let cli = Cli::parse();
    let code = cli::run(cli)?;
    std::process::exit(code);
}
