//! Binary entrypoint that launches the Colloquy server bootstrap.

use std::process::ExitCode;

use colloquy::start_colloquy;

/// Start the chat backend with configuration read from the environment.
fn main() -> ExitCode {
    start_colloquy::run()
}
