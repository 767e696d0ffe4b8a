// External tool download and cache

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use flate2::read::GzDecoder;
use tar::Archive;

use crate::config::{Config, Platform};
use crate::error::Error;

/// Print a dimmed status message (for progress steps)
fn status(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Maximum time to wait for a release download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("secrets/", env!("CARGO_PKG_VERSION"));

pub const AGE_VERSION: &str = "1.2.0";
pub const SOPS_VERSION: &str = "3.9.4";

const AGE_URL: &str =
    "https://github.com/FiloSottile/age/releases/download/v{version}/age-v{version}-{os}-{arch}.tar.gz";
const SOPS_URL: &str =
    "https://github.com/getsops/sops/releases/download/v{version}/sops-v{version}.{os}.{arch}";

#[derive(Debug, Clone, Copy)]
enum ArchiveKind {
    /// Gzipped tarball; the named member is the binary to extract.
    TarGz { member: &'static str },
    /// The release asset is the binary itself.
    Binary,
}

/// A pinned external binary release.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub version: &'static str,
    url_template: &'static str,
    kind: ArchiveKind,
}

/// age-keygen ships inside the age release tarball.
pub fn age_keygen() -> ToolSpec {
    ToolSpec {
        name: "age-keygen",
        version: AGE_VERSION,
        url_template: AGE_URL,
        kind: ArchiveKind::TarGz { member: "age/age-keygen" },
    }
}

pub fn sops() -> ToolSpec {
    ToolSpec {
        name: "sops",
        version: SOPS_VERSION,
        url_template: SOPS_URL,
        kind: ArchiveKind::Binary,
    }
}

impl ToolSpec {
    /// Cache filename carrying tool name, version, platform and architecture.
    pub fn asset_name(&self, platform: &Platform) -> String {
        format!("{}-v{}-{}-{}", self.name, self.version, platform.os, platform.arch)
    }

    pub fn url(&self, platform: &Platform) -> String {
        self.url_template
            .replace("{version}", self.version)
            .replace("{os}", platform.os)
            .replace("{arch}", platform.arch)
    }

    pub fn cached_path(&self, config: &Config, platform: &Platform) -> PathBuf {
        config.bin_dir.join(self.asset_name(platform))
    }

    /// Download the pinned release into the cache unless it is already
    /// there. Existence on disk is the only validity check.
    pub fn ensure(&self, config: &Config) -> Result<PathBuf, Error> {
        let platform = Platform::detect()?;
        let dest = self.cached_path(config, &platform);
        if dest.exists() {
            return Ok(dest);
        }

        status(&format!("Downloading {} v{}...", self.name, self.version));
        fs::create_dir_all(&config.bin_dir)?;

        let url = self.url(&platform);
        let bytes = fetch(&url)?;
        match self.kind {
            ArchiveKind::TarGz { member } => unpack_member(&bytes, &url, member, &dest)?,
            ArchiveKind::Binary => fs::write(&dest, &bytes)?,
        }
        set_executable(&dest)?;

        Ok(dest)
    }
}

/// GET a URL into memory, failing on any non-success status.
pub fn fetch(url: &str) -> Result<Vec<u8>, Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;

    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(Error::DownloadFailed {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    Ok(response.bytes()?.to_vec())
}

fn unpack_member(bytes: &[u8], archive_url: &str, member: &str, dest: &Path) -> Result<(), Error> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    for entry in archive.entries()? {
        let mut entry = entry?;
        if &*entry.path()? == Path::new(member) {
            entry.unpack(dest)?;
            return Ok(());
        }
    }
    Err(Error::ArchiveMember {
        archive: archive_url.to_string(),
        member: member.to_string(),
    })
}

fn set_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}
