use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "zec-paperwallet", about = "Offline paper wallet generator for Zcash", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[arg(short, long, global = true, help = "Log debug output")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = commands::execute_command(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn usage_names_the_binary() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), "zec-paperwallet");
    }
}
