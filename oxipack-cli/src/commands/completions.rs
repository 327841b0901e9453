//! Shell completion generation.

use crate::Cli;
use clap::CommandFactory;
use clap_complete::{Shell, generate};

pub fn cmd_completions(shell: Shell) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
