use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use derive_builder::Builder;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumCount};
use tracing::debug;

use crate::memory::HostMemory;
use crate::probe::consts::EMAPPER_PROGRAM;
use crate::version::ToolVersion;

pub mod consts {
    use crate::version::Version;

    pub const DEFAULT_CPUS: usize = 8;
    pub const DEFAULT_TMP_DIR: &str = "tmp_eggnog";
    pub const DEFAULT_SCRATCH_DIR: &str = "scratch_eggnog";

    /// emapper.py learned --scratch_dir, --temp_dir and --dbmem in 2.1.0
    pub const SCRATCH_DIR_MIN_EMAPPER: Version = Version::from_static(&[2, 1, 0]);
    /// emapper.py learned --dmnd_iterate in 2.1.4
    pub const DMND_ITERATE_MIN_EMAPPER: Version = Version::from_static(&[2, 1, 4]);
    /// diamond releases before this one can't run emapper's iterative search
    pub const DMND_ITERATE_MIN_DIAMOND: Version = Version::from_static(&[2, 0, 11]);
    /// Hosts with at least this much memory (decimal GB) keep the eggNOG database resident
    pub const DBMEM_MIN_GB: f64 = 48.0;
}

use self::consts::*;

/// The resolved inputs for one emapper.py run.
#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct RunConfiguration {
    /// The emapper.py executable
    #[builder(default = "PathBuf::from(EMAPPER_PROGRAM)")]
    program: PathBuf,
    /// Protein FASTA input
    input: PathBuf,
    /// Where emapper.py writes its results
    outdir: PathBuf,
    #[builder(default = "DEFAULT_CPUS")]
    cpus: usize,
    #[builder(default = "PathBuf::from(DEFAULT_TMP_DIR)")]
    tmp_dir: PathBuf,
    #[builder(default = "PathBuf::from(DEFAULT_SCRATCH_DIR)")]
    scratch_dir: PathBuf,
}

impl RunConfiguration {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    pub fn cpus(&self) -> usize {
        self.cpus
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// The arguments every run gets, in order.
    pub fn base_args(&self) -> Vec<OsString> {
        vec![
            "-m".into(),
            "diamond".into(),
            "-i".into(),
            self.input.clone().into(),
            "-o".into(),
            self.outdir.clone().into(),
            "--cpu".into(),
            self.cpus.to_string().into(),
            "--override".into(),
        ]
    }
}

/// What the policy is decided from.
#[derive(Debug, Clone)]
pub struct PolicyInputs {
    pub emapper: ToolVersion,
    pub diamond: ToolVersion,
    pub memory: HostMemory,
}

/// One row of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumCount, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// Point emapper.py at our temp and scratch directories
    ScratchAndTempDirs,
    /// Load the eggNOG database into memory
    DatabaseInMemory,
    /// Turn off diamond's iterative search on old diamond releases
    DisableDiamondIterate,
}

/// The rows, in the order their flags are appended.
pub const DECISION_TABLE: [Rule; Rule::COUNT] = [
    Rule::ScratchAndTempDirs,
    Rule::DatabaseInMemory,
    Rule::DisableDiamondIterate,
];

impl Rule {
    pub fn applies(&self, inputs: &PolicyInputs) -> bool {
        match self {
            Rule::ScratchAndTempDirs => inputs.emapper >= SCRATCH_DIR_MIN_EMAPPER,
            Rule::DatabaseInMemory => {
                inputs.emapper >= SCRATCH_DIR_MIN_EMAPPER && inputs.memory.at_least_gb(DBMEM_MIN_GB)
            }
            Rule::DisableDiamondIterate => {
                inputs.emapper >= DMND_ITERATE_MIN_EMAPPER
                    && inputs.diamond < DMND_ITERATE_MIN_DIAMOND
            }
        }
    }

    pub fn flags(&self, config: &RunConfiguration) -> Vec<OsString> {
        match self {
            Rule::ScratchAndTempDirs => vec![
                "--scratch_dir".into(),
                config.scratch_dir.clone().into(),
                "--temp_dir".into(),
                config.tmp_dir.clone().into(),
            ],
            Rule::DatabaseInMemory => vec!["--dbmem".into()],
            Rule::DisableDiamondIterate => vec!["--dmnd_iterate".into(), "no".into()],
        }
    }

    /// Directories that have to exist before emapper.py runs with this rule's flags.
    pub fn directories(&self, config: &RunConfiguration) -> Vec<PathBuf> {
        match self {
            Rule::ScratchAndTempDirs => vec![config.tmp_dir.clone(), config.scratch_dir.clone()],
            Rule::DatabaseInMemory | Rule::DisableDiamondIterate => vec![],
        }
    }
}

/// The decided emapper.py invocation.
#[derive(Debug, Clone)]
pub struct RunPlan {
    program: PathBuf,
    args: Vec<OsString>,
    directories: Vec<PathBuf>,
    rules: Vec<Rule>,
}

impl RunPlan {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The program and its arguments joined by spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// Decide the emapper.py arguments from the detected versions and memory.
pub fn select(config: &RunConfiguration, inputs: &PolicyInputs) -> RunPlan {
    let rules: Vec<Rule> = DECISION_TABLE
        .iter()
        .copied()
        .filter(|rule| {
            let applies = rule.applies(inputs);
            debug!(%rule, applies, "policy decision");
            applies
        })
        .collect();

    let args = config
        .base_args()
        .into_iter()
        .chain(rules.iter().flat_map(|rule| rule.flags(config)))
        .collect();

    let directories = rules
        .iter()
        .flat_map(|rule| rule.directories(config))
        .collect();

    RunPlan {
        program: config.program.clone(),
        args,
        directories,
        rules,
    }
}
