//! Interactive console mode: read tickets from stdin until the user quits.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use coordination::Ticket;
use tracing::error;

use crate::orchestrator::TicketResolver;

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

fn is_quit(line: &str) -> bool {
    let line = line.trim();
    QUIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w))
}

/// Prompt until a non-empty answer. `None` on EOF or a quit word.
fn prompt_field<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    loop {
        write!(output, "{label}: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || is_quit(&line) {
            return Ok(None);
        }
        let value = line.trim();
        if value.is_empty() {
            writeln!(output, "{label} cannot be empty.")?;
            continue;
        }
        return Ok(Some(value.to_string()));
    }
}

/// Read one ticket. Returns `Ok(None)` when the user is done.
pub fn read_ticket<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<Ticket>> {
    let Some(subject) = prompt_field(input, output, "Subject")? else {
        return Ok(None);
    };
    let Some(description) = prompt_field(input, output, "Description")? else {
        return Ok(None);
    };
    // Both fields are non-empty after trimming, so validation cannot fail.
    Ok(Ticket::new(subject, description).ok())
}

/// Resolve tickets typed at the console, printing each report as JSON.
pub async fn run_interactive(resolver: &TicketResolver) -> Result<()> {
    println!("Support ticket agent. Type 'quit' to exit.\n");
    loop {
        let ticket = {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            read_ticket(&mut input, &mut output)?
        };
        let Some(ticket) = ticket else {
            println!("Goodbye.");
            return Ok(());
        };

        match resolver.resolve(ticket).await {
            Ok(resolution) => println!("{}\n", resolution.report().to_pretty_json()?),
            Err(e) => error!(error = %e, "Ticket resolution failed"),
        }
    }
}
