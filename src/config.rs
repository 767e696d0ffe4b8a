// Configuration and domain types

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

/// Optional override file, read from the project root.
const CONFIG_FILE: &str = "secrets.toml";

/// Fixed filesystem layout for one project. Every operation receives this
/// struct instead of reaching for hardcoded paths, so tests can point it at
/// a scratch directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Cache directory for downloaded tool binaries
    pub bin_dir: PathBuf,
    /// Age identity file, handed to sops via SOPS_AGE_KEY_FILE
    pub key_file: PathBuf,
    /// Dotenv-style plaintext secrets file
    pub plaintext_file: PathBuf,
    /// YAML-encoded encrypted secrets file
    pub encrypted_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from(".cache/tools"),
            key_file: PathBuf::from(".keys/age.txt"),
            plaintext_file: PathBuf::from(".env"),
            encrypted_file: PathBuf::from("secrets.enc.yaml"),
        }
    }
}

impl Config {
    /// Defaults, overridden by secrets.toml if one exists, then by
    /// environment variables. A missing file is fine; a malformed one is not.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => {
                toml::from_str(&contents).map_err(|e| Error::ConfigParse(e.to_string()))?
            }
            Err(_) => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = env::var("SECRETS_BIN_DIR") {
            self.bin_dir = PathBuf::from(dir);
        }
        if let Ok(file) = env::var("SECRETS_KEY_FILE") {
            self.key_file = PathBuf::from(file);
        }
        if let Ok(file) = env::var("SECRETS_PLAINTEXT_FILE") {
            self.plaintext_file = PathBuf::from(file);
        }
        if let Ok(file) = env::var("SECRETS_ENCRYPTED_FILE") {
            self.encrypted_file = PathBuf::from(file);
        }
    }
}

/// Platform and architecture as they appear in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    pub fn detect() -> Result<Self, Error> {
        Self::from_target(env::consts::OS, env::consts::ARCH)
    }

    // Release assets use go-style names, not Rust target triples.
    fn from_target(os: &str, arch: &str) -> Result<Self, Error> {
        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            other => return Err(Error::UnsupportedPlatform(format!("{}/{}", other, arch))),
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            other => return Err(Error::UnsupportedPlatform(format!("{}/{}", os, other))),
        };
        Ok(Self { os, arch })
    }
}
