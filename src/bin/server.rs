//! Server binary for the open-data agent API.

use std::process::ExitCode;

use opendata_agent::start_agent;

fn main() -> ExitCode {
    start_agent::run()
}
