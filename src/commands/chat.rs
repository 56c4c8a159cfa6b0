//! Interactive chat command
//!
//! Reads prompts with rustyline, runs each one as a conversation turn and
//! prints the reply. Ctrl-C while a turn is pending cancels that turn only.

use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::commands::{connect, render, spawn_interrupt_watcher};
use crate::config::Config;
use crate::conversation::ConversationDriver;
use crate::error::Result;
use crate::session::Session;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;

/// Start an interactive chat session
///
/// # Errors
///
/// Returns error if the client cannot be created or the terminal cannot be
/// read. Failed turns are reported on screen and do not end the session.
pub async fn run_chat(config: Config) -> Result<()> {
    tracing::info!("Starting interactive chat mode");

    let (api, driver) = connect(&config)?;
    let mut session = Session::new(api);
    let mut rl = DefaultEditor::new()?;

    print_welcome_banner(&config);

    loop {
        let prompt = format!("{} ", "you>".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_special_command(trimmed) {
                    Ok(SpecialCommand::Help) => {
                        print_help();
                        continue;
                    }
                    Ok(SpecialCommand::History) => {
                        render::print_history(session.transcript());
                        continue;
                    }
                    Ok(SpecialCommand::Reset) => {
                        session.reset();
                        println!("{}\n", "Started a new conversation.".dimmed());
                        continue;
                    }
                    Ok(SpecialCommand::ShowStatus) => {
                        render::print_status(&session);
                        continue;
                    }
                    Ok(SpecialCommand::Exit) => break,
                    Ok(SpecialCommand::None) => {}
                    Err(e) => {
                        eprintln!("{}\n", e.to_string().red());
                        continue;
                    }
                }

                rl.add_history_entry(trimmed)?;
                run_turn(&driver, &mut session, trimmed).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                return Err(e.into());
            }
        }
    }

    session.close();
    println!("Goodbye!");
    Ok(())
}

async fn run_turn(driver: &ConversationDriver, session: &mut Session, prompt: &str) {
    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());

    println!("{}", "Waiting for the assistant... (Ctrl-C to cancel)".dimmed());
    let result = driver.submit(session, prompt, &cancel).await;
    watcher.abort();

    match result {
        Ok(outcome) => match outcome.reply {
            Some(reply) => render::print_reply(&reply),
            None => eprintln!("{}\n", "The assistant did not reply.".yellow()),
        },
        Err(e) => {
            tracing::debug!("Turn failed: {:?}", e);
            render::print_error(&e);
        }
    }
}

fn print_welcome_banner(config: &Config) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                cite-chat - Interactive Chat                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Assistant: {}", config.assistant.assistant_id.bold());
    println!("Endpoint:  {}\n", config.assistant.api_base);
    println!("Type '/help' for available commands, 'exit' to quit\n");
}
