use crate::error::OracleError;
use miette::Report;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FIXTURE_ORACLE_LOG";
const DEFAULT_LOG: &str = "warn";

/// Installs the stderr subscriber. Filter directives come from
/// `FIXTURE_ORACLE_LOG`; stdout is left to protocol output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn report(error: OracleError) {
    eprintln!("{:?}", Report::new(error));
}

pub fn report_all(errors: Vec<OracleError>) -> usize {
    let count = errors.len();
    for error in errors {
        report(error);
    }
    count
}

/// Process exit status for a failed command. Protocol misuse is 2, every
/// other failure is 1.
pub fn exit_status(error: &OracleError) -> u8 {
    match error {
        OracleError::SelectorOutOfRange { .. } => 2,
        _ => 1,
    }
}
