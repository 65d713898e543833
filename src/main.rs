//! pxpet - command-line tool for turning pictures into animated pixel pets

use std::process::ExitCode;

use pixelpet::cli;

fn main() -> ExitCode {
    cli::run()
}
