use anyhow::{Context, Result};
use phia_agent::StepController;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "phia> ";

pub async fn run(controller: &StepController, show_trajectory: bool) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to create line editor")?;
    println!("Ask a question about your health data. Type 'exit' or press Ctrl-D to quit.");

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if matches!(question, "exit" | "quit") {
                    break;
                }
                let _ = editor.add_history_entry(question);
                // A failed question ends that question only.
                if let Err(err) = answer(controller, question, show_trajectory).await {
                    tracing::error!(error = %err, "question failed");
                    eprintln!("error: {err:#}");
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("failed to read input"),
        }
    }
    Ok(())
}

pub async fn answer(
    controller: &StepController,
    question: &str,
    show_trajectory: bool,
) -> Result<()> {
    let outcome = controller.run_detailed(question).await?;
    if outcome.forced_finish {
        tracing::info!(
            steps = outcome.trajectory.len(),
            "answer produced after the step budget ran out"
        );
    }
    println!("{}", outcome.answer);
    if show_trajectory {
        println!("{}", serde_json::to_string_pretty(&outcome.trajectory)?);
    }
    Ok(())
}
