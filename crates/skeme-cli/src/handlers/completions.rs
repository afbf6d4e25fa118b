//! Shell completions handler

use crate::cli::Shell;
use crate::error::Result;
use clap::CommandFactory;
use std::io::Write;

/// Write completions for `shell` to `out`
pub fn handle_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = crate::cli::Cli::command();
    let name = cmd.get_name().to_string();

    clap_complete::generate(shell.to_clap_shell(), &mut cmd, name, out);
    out.flush()?;

    Ok(())
}
