// Entry point - CLI parsing and wiring

use clap::Parser;
use colored::Colorize;

use secrets::app::App;
use secrets::command::Command;
use secrets::config::Config;
use secrets::error::Error;

#[derive(Parser)]
#[command(name = "secrets")]
#[command(about = "Manage encrypted project secrets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = Config::load()?;
    let app = App::new(config);
    app.run(cli.command)
}
