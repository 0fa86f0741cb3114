//! Interactive chat loop: read stdin, run one conversation turn, print, repeat until EOF or quit.
//!
//! `/end` makes the conversation run the workflow; its progress lines go to stderr as they
//! arrive and the final answer to stdout.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use cli::{format_progress, format_run_footer};
use maestro::Conversation;

fn is_quit_command(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    matches!(lower.as_str(), "quit" | "exit" | "/quit")
}

/// Runs one turn and prints it. Returns the run error text when `/end` stopped early.
pub async fn run_one_turn(conversation: &mut Conversation, line: &str) -> Option<String> {
    let reply = conversation
        .send_with_progress(line, |progress| eprintln!("{}", format_progress(progress)))
        .await;
    println!("{}", reply.chat);
    let run = reply.run?;
    println!("\n{}", run.final_message);
    eprintln!("{}", format_run_footer(&run));
    run.error
}

/// Greets, then loops until EOF (Ctrl+D) or `quit`/`exit`/`/quit`. Empty lines are skipped.
pub async fn run_repl_loop(conversation: &mut Conversation) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", conversation.start().await);
    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match reader.next_line().await? {
            None => break,
            Some(s) if s.trim().is_empty() => continue,
            Some(s) if is_quit_command(&s) => break,
            Some(s) => s,
        };
        if let Some(e) = run_one_turn(conversation, &line).await {
            tracing::warn!(error = %e, "workflow run stopped early");
        }
    }

    println!("Bye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro::{Agent, DecisionArtifact, MockLlm, PlannerAgent, Prompts, ReporterAgent, WorkflowOptions};
    use std::sync::Arc;

    #[test]
    fn is_quit_command_matches_expected_tokens() {
        assert!(is_quit_command("quit"));
        assert!(is_quit_command(" EXIT "));
        assert!(is_quit_command("/quit"));
        assert!(!is_quit_command("/end"));
        assert!(!is_quit_command("continue"));
    }

    /// **Scenario**: a chat turn that is not `/end` runs nothing and reports no error.
    #[tokio::test]
    async fn plain_turn_reports_no_run_error() {
        let prompts = Prompts::new("plan", "chat");
        let roster: Vec<Arc<dyn Agent>> = vec![
            Arc::new(PlannerAgent::new(
                "meta_agent",
                Arc::new(MockLlm::new(DecisionArtifact::new("reporter_agent", "done").to_json())),
                &prompts,
            )),
            Arc::new(ReporterAgent::new("reporter_agent")),
        ];
        let mut conversation = Conversation::new(
            Arc::new(MockLlm::new("What would you like to research?")),
            roster,
            prompts,
            WorkflowOptions::default(),
        );
        assert_eq!(run_one_turn(&mut conversation, "hello").await, None);
        assert!(conversation.last_state().is_none());
    }
}
