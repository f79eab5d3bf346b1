//! Blogpub - scheduled publishing for a blog draft backlog

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = blogpub::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
