use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser};

use libeggrun::policy::consts::{DEFAULT_CPUS, DEFAULT_SCRATCH_DIR, DEFAULT_TMP_DIR};
use libeggrun::policy::{RunConfiguration, RunConfigurationBuilder};
use libeggrun::probe::consts::{DIAMOND_PROGRAM, EMAPPER_PROGRAM};

#[derive(Parser)]
#[command(name = "eggrun")]
#[command(
    about = "Run eggNOG-mapper with flags chosen from the installed emapper.py and diamond versions"
)]
pub struct Cli {
    /// Arguments that describe the annotation run
    #[command(flatten)]
    pub run_args: RunArgs,

    /// Where to find the external tools
    #[command(flatten)]
    pub tool_args: ToolArgs,

    #[command(flatten)]
    pub common_args: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Protein FASTA file
    #[arg(short = 'i', long = "input", value_name = "PROTEINS.fasta")]
    pub input: PathBuf,

    /// Output directory, created if absent
    #[arg(short = 'o', long = "outdir", value_name = "PATH")]
    pub outdir: PathBuf,

    /// The number of CPUs emapper.py will use
    #[arg(long = "cpus", default_value_t = DEFAULT_CPUS, value_name = "n")]
    pub cpus: usize,

    /// Temporary files directory (emapper.py >= 2.1.0)
    #[arg(long = "tmpdir", default_value = DEFAULT_TMP_DIR, value_name = "PATH")]
    pub tmp_dir: PathBuf,

    /// Scratch directory (emapper.py >= 2.1.0), removed after a successful run
    #[arg(long = "scratch_dir", default_value = DEFAULT_SCRATCH_DIR, value_name = "PATH")]
    pub scratch_dir: PathBuf,

    /// Print the command that would be run and the decisions behind it, then exit
    #[arg(long, action)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// The eggNOG-mapper executable
    #[arg(long = "emapper", default_value = EMAPPER_PROGRAM, value_name = "PATH")]
    pub emapper: PathBuf,

    /// The diamond executable
    #[arg(long = "diamond", default_value = DIAMOND_PROGRAM, value_name = "PATH")]
    pub diamond: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl RunArgs {
    pub fn run_configuration(&self, tool_args: &ToolArgs) -> anyhow::Result<RunConfiguration> {
        RunConfigurationBuilder::default()
            .program(tool_args.emapper.clone())
            .input(self.input.clone())
            .outdir(self.outdir.clone())
            .cpus(self.cpus)
            .tmp_dir(self.tmp_dir.clone())
            .scratch_dir(self.scratch_dir.clone())
            .build()
            .context("failed to build the emapper.py run configuration")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::check;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["eggrun", "-i", "proteins.fa", "-o", "out"])?;

        check!(cli.run_args.cpus == 8);
        check!(cli.run_args.tmp_dir == Path::new("tmp_eggnog"));
        check!(cli.run_args.scratch_dir == Path::new("scratch_eggnog"));
        check!(!cli.run_args.dry_run);
        check!(cli.tool_args.emapper == Path::new("emapper.py"));
        check!(cli.tool_args.diamond == Path::new("diamond"));
        check!(cli.common_args.verbose == 0);
        Ok(())
    }

    #[test]
    fn test_long_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "eggrun",
            "--input",
            "proteins.fa",
            "--outdir",
            "out",
            "--cpus",
            "32",
            "--tmpdir",
            "/tmp/t",
            "--scratch_dir",
            "/scratch/s",
            "-vv",
        ])?;

        let config = cli.run_args.run_configuration(&cli.tool_args)?;
        check!(config.input() == Path::new("proteins.fa"));
        check!(config.outdir() == Path::new("out"));
        check!(config.cpus() == 32);
        check!(config.tmp_dir() == Path::new("/tmp/t"));
        check!(config.scratch_dir() == Path::new("/scratch/s"));
        check!(config.program() == Path::new("emapper.py"));
        check!(cli.common_args.verbose == 2);
        Ok(())
    }

    #[test]
    fn test_input_and_outdir_are_required() {
        check!(Cli::try_parse_from(["eggrun", "-i", "proteins.fa"]).is_err());
        check!(Cli::try_parse_from(["eggrun", "-o", "out"]).is_err());
    }

    #[test]
    fn test_cpus_must_be_a_number() {
        check!(Cli::try_parse_from(["eggrun", "-i", "a", "-o", "b", "--cpus", "many"]).is_err());
    }
}
