use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use crate::version::{ToolVersion, Version, VersionParseError};

pub mod consts {
    pub const EMAPPER_PROGRAM: &str = "emapper.py";
    pub const DIAMOND_PROGRAM: &str = "diamond";
    pub const VERSION_FLAG: &str = "--version";
    pub const EMAPPER_VERSION_PREFIX: &str = "emapper-";
}

use self::consts::*;

/// Why a tool's version couldn't be determined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("failed to launch {program}: {message}")]
    Launch { program: String, message: String },
    #[error("{program} --version exited without success (code: {code:?})")]
    ExitStatus { program: String, code: Option<i32> },
    #[error("{program} --version printed nothing")]
    EmptyOutput { program: String },
    #[error("{program} --version printed an unrecognized version")]
    Unparseable {
        program: String,
        #[source]
        source: VersionParseError,
    },
}

/// Describes where the version token sits in a tool's `--version` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionToken {
    /// The first whitespace-separated token, with a prefix removed if present.
    ///
    /// emapper.py prints e.g. "emapper-2.1.12 / Expected eggNOG DB version: 5.0.2 ..."
    First { strip_prefix: &'static str },
    /// The last whitespace-separated token.
    ///
    /// diamond prints e.g. "diamond version 2.0.15"
    Last,
}

impl VersionToken {
    pub fn extract<'a>(&self, output: &'a str) -> Option<&'a str> {
        let mut tokens = output.split_whitespace();
        match self {
            VersionToken::First { strip_prefix } => tokens
                .next()
                .map(|token| token.strip_prefix(strip_prefix).unwrap_or(token)),
            VersionToken::Last => tokens.last(),
        }
    }
}

/// Runs `<program> --version` and pulls a version out of what it prints.
#[derive(Debug, Clone)]
pub struct ToolProbe {
    program: PathBuf,
    token: VersionToken,
}

impl ToolProbe {
    pub fn new(program: impl Into<PathBuf>, token: VersionToken) -> Self {
        Self {
            program: program.into(),
            token,
        }
    }

    /// A probe for the eggNOG-mapper annotation engine.
    pub fn emapper(program: impl Into<PathBuf>) -> Self {
        Self::new(
            program,
            VersionToken::First {
                strip_prefix: EMAPPER_VERSION_PREFIX,
            },
        )
    }

    /// A probe for the DIAMOND alignment backend.
    pub fn diamond(program: impl Into<PathBuf>) -> Self {
        Self::new(program, VersionToken::Last)
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Extract the version from captured `--version` output.
    pub fn parse_output(&self, output: &str) -> Result<Version, ProbeError> {
        let token = self
            .token
            .extract(output.trim())
            .ok_or_else(|| ProbeError::EmptyOutput {
                program: self.program_name(),
            })?;

        token
            .parse::<Version>()
            .map_err(|source| ProbeError::Unparseable {
                program: self.program_name(),
                source,
            })
    }

    /// Run the version query.
    pub fn probe(&self) -> Result<Version, ProbeError> {
        let output = Command::new(self.program.as_os_str())
            .arg(OsStr::new(VERSION_FLAG))
            .stdin(Stdio::null())
            .output()
            .map_err(|err| ProbeError::Launch {
                program: self.program_name(),
                message: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(ProbeError::ExitStatus {
                program: self.program_name(),
                code: output.status.code(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(program = %self.program.display(), output = %stdout.trim(), "version output");

        self.parse_output(&stdout)
    }

    /// Run the version query, falling back to `ToolVersion::Unknown` on any failure.
    pub fn version(&self) -> ToolVersion {
        let version = ToolVersion::from(self.probe());

        match version.probe_error() {
            Some(err) => warn!("{err}; assuming version {}", Version::ZERO),
            None => debug!(program = %self.program.display(), %version, "detected version"),
        }

        version
    }
}
