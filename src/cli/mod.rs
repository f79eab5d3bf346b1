//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create the draft and posted directories and `blogpub.toml` |
//! | `publish` | Publish one draft per due slot (`--dry-run` to preview) |
//! | `status` | Show the last published slot, due slots and planned drafts |
//! | `drafts` | List drafts in publish order |
//! | `new` | Create a draft from a title and body |
//! | `rebuild` | Regenerate the root manifest |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) to log at debug level on stderr; `RUST_LOG`
//! takes precedence when set:
//! ```bash
//! blogpub --verbose publish --dry-run
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
