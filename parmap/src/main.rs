//! Invokes a command in parallel for each argument parsed from stdin.
//!
//! Each token read from stdin is bound to `VARIABLE` in the environment of a
//! fresh `sh -c COMMAND`, with at most `--max_jobs` children running at once.

use std::io::{self, BufReader};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use parmap::config::{RunConfig, resolve_max_jobs};
use parmap::core::capacity::token_capacity;
use parmap::core::tokenizer::{Delimiters, Tokenizer};
use parmap::core::types::Verdict;
use parmap::exit_codes;
use parmap::io::limits::{arg_max, detected_parallelism, environment_entry_lengths};
use parmap::io::process::ShellRunner;
use parmap::logging;
use parmap::pool::Pool;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "parmap",
    version,
    about = "Invokes a command in parallel for each argument parsed from stdin.",
    disable_version_flag = true
)]
struct Cli {
    /// Set delimiter for parsing arguments from stdin
    #[arg(short, long, value_name = "SET")]
    delimiter: Option<String>,

    /// Maximum number of jobs to run in parallel
    #[arg(
        short,
        long = "max_jobs",
        value_name = "N",
        allow_negative_numbers = true
    )]
    max_jobs: Option<i64>,

    /// Print version number
    #[arg(short = 'v', long, action = ArgAction::Version, value_parser = clap::value_parser!(bool))]
    version: (),

    /// Environment variable bound to each token
    variable: String,

    /// Shell command to run for each token
    command: String,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            return exit_code(exit_codes::FAILURE);
        }
    };

    logging::init();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("parmap: {:#}", err);
            exit_code(exit_codes::FAILURE)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = RunConfig {
        delimiters: cli
            .delimiter
            .as_deref()
            .map(|set| Delimiters::from_set(set.as_bytes()))
            .unwrap_or_default(),
        max_jobs: resolve_max_jobs(cli.max_jobs, detected_parallelism()),
        variable: cli.variable,
        command: cli.command,
    };
    config.validate()?;

    let capacity = token_capacity(
        arg_max()?,
        config.variable.len(),
        config.command.len(),
        environment_entry_lengths(),
    )
    .context("size token buffer")?;
    debug!(max_jobs = config.max_jobs, capacity, "starting");

    let stdin = io::stdin();
    let mut tokenizer = Tokenizer::new(BufReader::new(stdin.lock()), config.delimiters);
    let runner = ShellRunner::new(config.variable, config.command);
    let mut pool = Pool::new(runner, config.max_jobs, capacity);

    let summary = pool.run(&mut tokenizer)?;
    debug!(?summary, "done");
    Ok(match summary.verdict {
        Verdict::Ok => exit_code(exit_codes::OK),
        Verdict::SoftFailure | Verdict::Fatal => exit_code(exit_codes::FAILURE),
    })
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positionals() {
        let cli = Cli::try_parse_from(["parmap", "N", "echo $N"]).expect("parse");
        assert_eq!(cli.variable, "N");
        assert_eq!(cli.command, "echo $N");
        assert_eq!(cli.delimiter, None);
        assert_eq!(cli.max_jobs, None);
    }

    #[test]
    fn parse_options() {
        let cli = Cli::try_parse_from(["parmap", "-d", ",", "--max_jobs", "4", "X", "true"])
            .expect("parse");
        assert_eq!(cli.delimiter.as_deref(), Some(","));
        assert_eq!(cli.max_jobs, Some(4));
    }

    #[test]
    fn parse_negative_max_jobs() {
        let cli = Cli::try_parse_from(["parmap", "-m", "-1", "X", "true"]).expect("parse");
        assert_eq!(cli.max_jobs, Some(-1));
    }

    #[test]
    fn trailing_characters_in_max_jobs_rejected() {
        let err = Cli::try_parse_from(["parmap", "-m", "4x", "X", "true"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn missing_command_rejected() {
        let err = Cli::try_parse_from(["parmap", "X"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn short_v_is_version() {
        let err = Cli::try_parse_from(["parmap", "-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
