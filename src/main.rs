use clap::{Parser, Subcommand};
use fixture_oracle::{
    backend::compiled::{dispatch, CcToolchain, CommandTranslator, Dispatch, Selector},
    config::OracleConfig,
    diagnostics::{exit_status, init_logging, report, report_all},
    driver,
    error::{OracleError, OracleResult},
    fixture::{discover, display_name},
};
use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

#[derive(Parser, Debug)]
#[command(name = "fixture-oracle", version, about = "Generate backend verification suites from fixture transcripts")]
struct Cli {
    /// Configuration file; defaults to `oracle.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Fixture directory.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Directory the suites are written to.
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the interpreted and compiled suites.
    Generate,
    /// Print every discovered fixture without parsing it.
    List,
    /// Parse every fixture and report all format errors.
    Check,
    /// Run one fixture through the compiled backend; `-1` prints the count.
    Select {
        #[arg(allow_negative_numbers = true)]
        selector: i64,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            let status = exit_status(&error);
            if let OracleError::Toolchain { outcome, .. } = &error {
                let _ = outcome.forward(&mut io::stdout(), &mut io::stderr());
            }
            report(error);
            ExitCode::from(status)
        }
    }
}

fn load_config(cli: &Cli) -> OracleResult<OracleConfig> {
    let mut config = OracleConfig::load(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config.fixtures.root = root.clone();
    }
    if let Some(out) = &cli.out {
        config.output.dir = out.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> OracleResult<ExitCode> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Generate => {
            let written = driver::run(&config)?;
            println!("wrote {}", written.interpreted.display());
            println!("wrote {}", written.compiled.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::List => {
            let transcripts = discover(&config.fixtures)?;
            let total = transcripts.len();
            for (index, transcript) in transcripts.iter().enumerate() {
                println!("[{}/{total}] {}", index + 1, display_name(transcript));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let (total, failures) = driver::check_fixtures(&config.fixtures)?;
            let failed = report_all(failures);
            if failed > 0 {
                eprintln!("{failed} of {total} fixture(s) are malformed");
                Ok(ExitCode::FAILURE)
            } else {
                println!("{total} fixture(s) ok");
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::Select { selector } => select(&config, selector),
    }
}

fn select(config: &OracleConfig, selector: i64) -> OracleResult<ExitCode> {
    let transcripts = discover(&config.fixtures)?;
    let total = transcripts.len();
    if let Selector::Fixture(index) = Selector::resolve(selector, total)? {
        println!("[{}/{total}] {}", index + 1, display_name(&transcripts[index]));
    }
    let translator = CommandTranslator::from_settings(&config.toolchain);
    let toolchain = CcToolchain::new(&config.toolchain, &config.features);
    match dispatch(selector, &transcripts, &config.fixtures, &translator, &toolchain)? {
        Dispatch::Count(count) => {
            let mut stdout = io::stdout();
            write!(stdout, "{count}")
                .and_then(|()| stdout.flush())
                .map_err(|error| OracleError::io("<stdout>", error))?;
        }
        Dispatch::Ran { outcome, .. } => {
            outcome
                .forward(&mut io::stdout(), &mut io::stderr())
                .map_err(|error| OracleError::io("<stdout>", error))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
