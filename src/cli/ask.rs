//! Ask command - answer one question

use super::open_session;
use anyhow::Result;
use repochat::engine::OpenOptions;
use std::path::Path;
use tracing::debug;

pub fn run(repo: &Path, question: &str, use_ai: bool, local: bool) -> Result<()> {
    let (_, chat) = open_session(
        repo,
        OpenOptions {
            force_local: local,
            use_ai,
        },
    )?;

    let answer = chat.ask_traced(question);
    debug!(
        "Answered via {:?} (intent {:?}), stages {:?}",
        answer.source, answer.intent, answer.stages
    );
    println!("{}", answer.text);
    Ok(())
}
