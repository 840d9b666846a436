use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = tacsim_preview::Cli::parse_from(wild::args());
    tacsim_utils::logging::init(cli.verbose);
    tacsim_utils::exit_with(tacsim_preview::run(cli))
}
