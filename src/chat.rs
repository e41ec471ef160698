//! Interactive chat loop.
//!
//! Reads one query per line from stdin and prints the orchestrator's
//! output. A per-query failure is printed and the loop continues; only
//! `quit` (or EOF) ends the session.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::Orchestrator;

/// Token that ends the session (case-insensitive).
const QUIT_TOKEN: &str = "quit";

/// Run the interactive loop until `quit` or EOF.
pub async fn chat_loop(orchestrator: &Orchestrator<'_>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("\nMCP client started! Type your queries or 'quit' to exit.");

    loop {
        print!("\nQuery: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case(QUIT_TOKEN) {
            break;
        }

        match orchestrator.process_query(query).await {
            Ok(answer) => println!("\n{answer}"),
            Err(e) => {
                tracing::error!(error = %e, "query failed");
                println!("\nError: {e}");
            }
        }
    }

    Ok(())
}
