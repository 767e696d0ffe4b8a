// Error types

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    ConfigParse(String),
    UnsupportedPlatform(String),
    KeyFileExists(PathBuf),
    KeyFileMissing(PathBuf),
    DownloadFailed { url: String, status: u16 },
    ArchiveMember { archive: String, member: String },
    ToolFailed { tool: String, code: Option<i32> },
    InstallFailed(String),
    Http(reqwest::Error),
    Io(std::io::Error),
}

impl Error {
    /// Exit code reported by main. External tool failures pass the child's
    /// own exit code through; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolFailed { code: Some(code), .. } => *code,
            _ => 1,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigParse(msg) => write!(f, "Config parse error: {}", msg),
            Error::UnsupportedPlatform(target) => {
                write!(f, "No release builds for this platform: {}", target)
            }
            Error::KeyFileExists(path) => {
                write!(f, "Key file already exists at {} (refusing to overwrite)", path.display())
            }
            Error::KeyFileMissing(path) => {
                write!(f, "Key file not found at {} (run 'secrets keygen' first)", path.display())
            }
            Error::DownloadFailed { url, status } => {
                write!(f, "Download of {} failed with HTTP {}", url, status)
            }
            Error::ArchiveMember { archive, member } => {
                write!(f, "Archive {} does not contain {}", archive, member)
            }
            Error::ToolFailed { tool, code: Some(code) } => {
                write!(f, "{} exited with status {}", tool, code)
            }
            Error::ToolFailed { tool, code: None } => {
                write!(f, "{} was terminated by a signal", tool)
            }
            Error::InstallFailed(msg) => write!(f, "Install failed: {}", msg),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}
