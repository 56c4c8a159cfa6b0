//! One-shot ask command

use crate::commands::{connect, render, spawn_interrupt_watcher};
use crate::config::Config;
use crate::error::Result;
use crate::session::Session;

use tokio_util::sync::CancellationToken;

/// Send a single prompt and print the rendered reply on stdout
///
/// # Errors
///
/// Returns error if the turn fails or the run produced no assistant reply
pub async fn run_ask(config: Config, prompt: String) -> Result<()> {
    let (api, driver) = connect(&config)?;
    let mut session = Session::new(api);

    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());
    let result = driver.submit(&mut session, &prompt, &cancel).await;
    watcher.abort();
    session.close();

    let Some(reply) = result?.reply else {
        anyhow::bail!("The assistant did not reply");
    };

    render::print_issues(&reply);
    println!("{}", reply.render());
    Ok(())
}
