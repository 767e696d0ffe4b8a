// Command dispatch - subprocess invocation of the cached tools

use std::fs;
use std::path::Path;
use std::process::Command as ProcessCommand;

use colored::Colorize;

use crate::command::Command;
use crate::config::Config;
use crate::error::Error;
use crate::tools;

/// Print a dimmed status message (for progress steps)
fn status(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a success message with checkmark
fn success(msg: &str) {
    println!("\n{} {}", "✓".green(), msg.green());
}

/// Print an info line (normal text, indented)
fn info(msg: &str) {
    println!("  {}", msg);
}

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self, cmd: Command) -> Result<(), Error> {
        match cmd {
            Command::Keygen => self.keygen(),
            Command::Encrypt => self.encrypt(),
            Command::Decrypt => self.decrypt(),
        }
    }

    /// Generate the age identity. One key per installation; an existing key
    /// file is never touched.
    fn keygen(&self) -> Result<(), Error> {
        let key_file = &self.config.key_file;
        if key_file.exists() {
            return Err(Error::KeyFileExists(key_file.clone()));
        }

        let keygen = tools::age_keygen().ensure(&self.config)?;

        if let Some(parent) = key_file.parent() {
            fs::create_dir_all(parent)?;
        }

        status("Generating age identity...");
        let result = ProcessCommand::new(&keygen)
            .arg("-o")
            .arg(key_file)
            .status()?;
        check("age-keygen", result)?;

        restrict_to_owner(key_file)?;

        success(&format!("Key written to {}", key_file.display()));
        info("Back this file up. Without it the secrets file cannot be decrypted.");
        Ok(())
    }

    fn encrypt(&self) -> Result<(), Error> {
        let key_file = self.require_key()?;
        let sops = tools::sops().ensure(&self.config)?;

        status(&format!("Encrypting {}...", self.config.plaintext_file.display()));
        let result = ProcessCommand::new(&sops)
            .args(["--encrypt", "--input-type", "dotenv", "--output-type", "yaml", "--output"])
            .arg(&self.config.encrypted_file)
            .arg(&self.config.plaintext_file)
            .env("SOPS_AGE_KEY_FILE", key_file)
            .status()?;
        check("sops", result)?;

        success(&format!("Wrote {}", self.config.encrypted_file.display()));
        Ok(())
    }

    fn decrypt(&self) -> Result<(), Error> {
        let key_file = self.require_key()?;
        let sops = tools::sops().ensure(&self.config)?;

        status(&format!("Decrypting {}...", self.config.encrypted_file.display()));
        let result = ProcessCommand::new(&sops)
            .args(["--decrypt", "--input-type", "yaml", "--output-type", "dotenv", "--output"])
            .arg(&self.config.plaintext_file)
            .arg(&self.config.encrypted_file)
            .env("SOPS_AGE_KEY_FILE", key_file)
            .status()?;
        check("sops", result)?;

        success(&format!("Wrote {}", self.config.plaintext_file.display()));
        Ok(())
    }

    // Checked before any download or tool invocation.
    fn require_key(&self) -> Result<&Path, Error> {
        let key_file = self.config.key_file.as_path();
        if !key_file.exists() {
            return Err(Error::KeyFileMissing(key_file.to_path_buf()));
        }
        Ok(key_file)
    }
}

fn check(tool: &str, result: std::process::ExitStatus) -> Result<(), Error> {
    if result.success() {
        Ok(())
    } else {
        Err(Error::ToolFailed {
            tool: tool.to_string(),
            code: result.code(),
        })
    }
}

fn restrict_to_owner(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // A fake age-keygen: writes a recognizable identity to the -o target.
    const FAKE_AGE_KEYGEN: &str = "#!/bin/sh\necho \"AGE-SECRET-KEY-TEST\" > \"$2\"\n";

    // A fake sops: copies its input file to the --output target and records
    // the key env var next to the output, which is all the dispatcher can
    // observe from the real tool anyway.
    const FAKE_SOPS: &str = r#"#!/bin/sh
prev=""
out=""
last=""
for a in "$@"; do
    if [ "$prev" = "--output" ]; then out="$a"; fi
    prev="$a"
    last="$a"
done
cp "$last" "$out"
printf '%s' "$SOPS_AGE_KEY_FILE" > "$out.keyenv"
"#;

    fn test_config(dir: &TempDir) -> Config {
        let root = dir.path();
        Config {
            bin_dir: root.join("tools"),
            key_file: root.join("keys/age.txt"),
            plaintext_file: root.join(".env"),
            encrypted_file: root.join("secrets.enc.yaml"),
        }
    }

    fn install_fake(config: &Config, spec: tools::ToolSpec, script: &str) -> PathBuf {
        let platform = Platform::detect().unwrap();
        let path = spec.cached_path(config, &platform);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn keygen_creates_one_key_with_owner_only_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        install_fake(&config, tools::age_keygen(), FAKE_AGE_KEYGEN);

        App::new(config.clone()).run(Command::Keygen).unwrap();

        let contents = fs::read_to_string(&config.key_file).unwrap();
        assert_eq!(contents.trim(), "AGE-SECRET-KEY-TEST");

        let mode = fs::metadata(&config.key_file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn keygen_refuses_to_overwrite_an_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        fs::create_dir_all(config.key_file.parent().unwrap()).unwrap();
        fs::write(&config.key_file, "original key").unwrap();

        // No fake tool is installed: reaching the download step would fail
        // with a different error, so KeyFileExists also proves the check
        // happens before any network access.
        let err = App::new(config.clone()).run(Command::Keygen);
        assert!(matches!(err, Err(Error::KeyFileExists(_))));
        assert_eq!(fs::read_to_string(&config.key_file).unwrap(), "original key");
    }

    #[test]
    fn encrypt_and_decrypt_require_the_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);

        let app = App::new(config);
        assert!(matches!(app.run(Command::Encrypt), Err(Error::KeyFileMissing(_))));
        assert!(matches!(app.run(Command::Decrypt), Err(Error::KeyFileMissing(_))));
    }

    #[test]
    fn encrypt_then_decrypt_round_trips_through_sops() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        install_fake(&config, tools::sops(), FAKE_SOPS);

        fs::create_dir_all(config.key_file.parent().unwrap()).unwrap();
        fs::write(&config.key_file, "AGE-SECRET-KEY-TEST").unwrap();
        fs::write(&config.plaintext_file, "API_KEY=hunter2\nDB_URL=localhost\n").unwrap();

        let app = App::new(config.clone());
        app.run(Command::Encrypt).unwrap();
        assert!(config.encrypted_file.exists());

        // The key path travels to sops via the environment.
        let keyenv = format!("{}.keyenv", config.encrypted_file.display());
        assert_eq!(
            fs::read_to_string(keyenv).unwrap(),
            config.key_file.display().to_string()
        );

        fs::remove_file(&config.plaintext_file).unwrap();
        app.run(Command::Decrypt).unwrap();
        assert_eq!(
            fs::read_to_string(&config.plaintext_file).unwrap(),
            "API_KEY=hunter2\nDB_URL=localhost\n"
        );
    }

    #[test]
    fn tool_failures_carry_the_child_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        install_fake(&config, tools::sops(), "#!/bin/sh\nexit 3\n");

        fs::create_dir_all(config.key_file.parent().unwrap()).unwrap();
        fs::write(&config.key_file, "AGE-SECRET-KEY-TEST").unwrap();
        fs::write(&config.plaintext_file, "API_KEY=hunter2\n").unwrap();

        let err = App::new(config).run(Command::Encrypt);
        match err {
            Err(Error::ToolFailed { tool, code }) => {
                assert_eq!(tool, "sops");
                assert_eq!(code, Some(3));
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }
}
