//! Binary entrypoint that launches the open-data agent server.

use std::process::ExitCode;

use opendata_agent::start_agent;

/// Start the agent server.
fn main() -> ExitCode {
    start_agent::run()
}
