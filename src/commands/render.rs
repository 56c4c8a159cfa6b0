//! Terminal rendering of chat output
//!
//! Replies go to stdout; error banners and per-citation problems go to
//! stderr so `ask` output can be piped.

use crate::assistant::Role;
use crate::error::CiteChatError;
use crate::reply::ProcessedReply;
use crate::session::{Session, Transcript};
use colored::Colorize;

/// Print an assistant reply followed by its citation list
pub fn print_reply(reply: &ProcessedReply) {
    println!("\n{}", "Assistant:".green().bold());
    println!("{}", reply.text);
    if !reply.citations.is_empty() {
        println!();
        for citation in &reply.citations {
            println!("{}", citation.line.dimmed());
        }
    }
    println!();
    print_issues(reply);
}

/// Print per-annotation problems as warning banners
pub fn print_issues(reply: &ProcessedReply) {
    for issue in &reply.issues {
        eprintln!("{}", format!("Error: {}", issue).yellow());
    }
}

/// Print a failed turn as an error banner
pub fn print_error(error: &anyhow::Error) {
    let banner = match error.downcast_ref::<CiteChatError>() {
        Some(CiteChatError::Service {
            operation, message, ..
        }) if operation == "create_run" => {
            format!("An error occurred while creating a run: {}", message)
        }
        Some(CiteChatError::Cancelled { .. }) => "Request cancelled.".to_string(),
        _ => format!("Error: {}", error),
    };
    eprintln!("{}\n", banner.red());
}

/// Print every transcript entry with its timestamp
pub fn print_history(transcript: &Transcript) {
    if transcript.is_empty() {
        println!("{}\n", "No messages yet.".dimmed());
        return;
    }

    for entry in transcript.entries() {
        let label = match entry.role {
            Role::User => "You".cyan().bold(),
            Role::Assistant => "Assistant".green().bold(),
        };
        println!(
            "{} {}:\n{}\n",
            entry.at.format("[%H:%M:%S]").to_string().dimmed(),
            label,
            entry.content
        );
    }
}

/// Print the active thread and message count
pub fn print_status(session: &Session) {
    println!("\n{}", "Session status".bold());
    println!(
        "  Thread:   {}",
        session.thread_id().unwrap_or("(none yet)")
    );
    println!("  Messages: {}\n", session.transcript().len());
}
