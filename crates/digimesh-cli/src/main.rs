use clap::Parser;
use digimesh_cli::cli::{Cli, Commands};
use digimesh_cli::{configure, logging, monitor};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Configure(args) => configure::run(args),
        Commands::Monitor(args) => monitor::run(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
