//! Line-oriented Q&A loop over one scraped page.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{AppError, Result};
use crate::qa::{AskOptions, DEFAULT_SUMMARY_WORDS, QaService};

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "q"];
const SUMMARY_COMMAND: &str = "summary";

/// Read questions from `input` until EOF or an exit command, writing answers to
/// `output`. A failed question is reported and the loop keeps going.
pub async fn run_session<R, W>(
    qa: &QaService,
    content: &str,
    options: &AskOptions,
    mut input: R,
    mut output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Interactive Q&A Mode")?;
    writeln!(output, "Type 'exit' or 'quit' to stop")?;
    writeln!(output, "Type 'summary' to get a summary of the content\n")?;

    let mut line = String::new();
    loop {
        write!(output, "Your question: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        let command = question.to_lowercase();
        if EXIT_COMMANDS.contains(&command.as_str()) {
            break;
        }

        if command == SUMMARY_COMMAND {
            match qa.summarize_content(content, DEFAULT_SUMMARY_WORDS).await {
                Ok(summary) => writeln!(output, "\nSummary:\n{}\n", summary)?,
                Err(e) => report(&mut output, &e)?,
            }
            continue;
        }

        match qa.answer_question(content, question, options).await {
            Ok(result) => writeln!(
                output,
                "\nAnswer:\n{}\nTokens used: {}\n",
                result.answer, result.tokens_used
            )?,
            Err(e) => report(&mut output, &e)?,
        }
    }

    writeln!(output, "Goodbye!")?;
    Ok(())
}

fn report<W: Write>(output: &mut W, err: &AppError) -> std::io::Result<()> {
    debug!(error = %err, "question failed");
    writeln!(output, "\nError: {}\n", err)
}
