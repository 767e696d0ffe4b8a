// mise bootstrap wrapper - ensure the version manager exists, then hand off

use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::Parser;
use colored::Colorize;

use secrets::error::Error;
use secrets::tools;

const MISE_VERSION: &str = "v2025.1.6";
const INSTALLER_URL: &str = "https://mise.run";

#[derive(Parser)]
#[command(name = "mise-run")]
#[command(about = "Run a command with the mise version manager installed")]
#[command(version)]
struct Cli {
    /// Command to exec once mise is present (defaults to `mise install`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// Install parameters for one bootstrap run.
struct Bootstrap {
    executable: String,
    version: String,
    installer_url: String,
    install_path: PathBuf,
}

impl Bootstrap {
    fn new() -> Result<Self, Error> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::InstallFailed("Could not find home directory".to_string()))?;
        Ok(Self {
            executable: "mise".to_string(),
            version: MISE_VERSION.to_string(),
            installer_url: INSTALLER_URL.to_string(),
            install_path: home.join(".local/bin/mise"),
        })
    }

    /// Resolve mise: the search path first, then the pinned install
    /// location, then install it there.
    fn ensure(&self) -> Result<PathBuf, Error> {
        if let Ok(found) = which::which(&self.executable) {
            return Ok(found);
        }
        if self.install_path.exists() {
            return Ok(self.install_path.clone());
        }

        self.install()?;

        if !self.install_path.exists() {
            return Err(Error::InstallFailed(format!(
                "installer finished but {} is missing",
                self.install_path.display()
            )));
        }
        Ok(self.install_path.clone())
    }

    fn install(&self) -> Result<(), Error> {
        println!(
            "  {}",
            format!("Installing {} {}...", self.executable, self.version).dimmed()
        );

        let script = tools::fetch(&self.installer_url)?;
        let script_path = std::env::temp_dir().join("mise-install.sh");
        std::fs::write(&script_path, script)?;

        let result = Command::new("sh")
            .arg(&script_path)
            .env("MISE_VERSION", &self.version)
            .env("MISE_INSTALL_PATH", &self.install_path)
            .env("MISE_QUIET", "1")
            .status()?;

        if !result.success() {
            return Err(Error::InstallFailed(format!(
                "install script exited with status {}",
                result.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}

/// The command this process will become. An empty argv means the default
/// entry command, `mise install`; otherwise the user's argv is taken as-is.
fn handoff(mise: &Path, argv: &[String]) -> Command {
    if argv.is_empty() {
        let mut cmd = Command::new(mise);
        cmd.arg("install");
        cmd
    } else {
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        cmd
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let bootstrap = Bootstrap::new()?;
    let mise = bootstrap.ensure()?;

    // exec only returns on failure; on success this process is gone and the
    // child inherits the standard streams.
    let err = handoff(&mise, &cli.command).exec();
    Err(Error::Io(err))
}
