//! CLI command implementations.
//!
//! | Module        | Mode                              |
//! |---------------|-----------------------------------|
//! | `run`         | `--plan`, `--plan --list`         |
//! | `create`      | `--create`                        |
//! | `interactive` | `--interactive`                   |

pub mod create;
pub mod interactive;
pub mod prompt;
pub mod run;

pub use create::cmd_create;
pub use interactive::cmd_interactive;
pub use run::{RunFlags, cmd_list, cmd_run};
