//! Standalone server binary.
//! Run with: cargo run --bin colloquy-server

use std::process::ExitCode;

use colloquy::start_colloquy;

fn main() -> ExitCode {
    start_colloquy::run()
}
