use std::io::{self, BufRead, Write};

use colored::Colorize;
use semver::Version;

use super::version;

/// Asked once before a new version is installed
pub trait Confirm {
    fn confirm(&self, local: Option<&Version>, remote: &Version) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(Option<&Version>, &Version) -> bool,
{
    fn confirm(&self, local: Option<&Version>, remote: &Version) -> bool {
        self(local, remote)
    }
}

/// Answers every prompt the same way
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _local: Option<&Version>, _remote: &Version) -> bool {
        self.0
    }
}

/// Yes/no question on the terminal, defaulting to yes
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&self, local: Option<&Version>, remote: &Version) -> bool {
        let stdin = io::stdin();
        match ask(&mut stdin.lock(), &mut io::stdout(), local, remote) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("cannot read answer, skipping update: {}", e);
                false
            }
        }
    }
}

fn ask(
    input: &mut impl BufRead,
    output: &mut impl Write,
    local: Option<&Version>,
    remote: &Version,
) -> io::Result<bool> {
    writeln!(
        output,
        "{} A new version is available: {} → {}",
        "↑".yellow(),
        version::display(local).dimmed(),
        remote.to_string().green()
    )?;

    loop {
        write!(output, "{} Update now? [Y/n]: ", "?".yellow().bold())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "" | "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "  {}", "Please answer y or n".dimmed())?,
        }
    }
}
