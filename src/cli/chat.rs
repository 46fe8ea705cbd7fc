use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::{ChatController, Role, TerminalRenderer, UiAction};
use crate::core::ChatConfig;

/// Prompts until a role is entered. `None` means the user quit.
fn prompt_role(rl: &mut DefaultEditor) -> Result<Option<Role>> {
    let known = Role::KNOWN
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join("/");
    loop {
        match rl.readline(&format!("Choisissez votre rôle ({}) : ", known)) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    return Ok(Some(Role::from(line)));
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err).context("Reading role failed"),
        }
    }
}

async fn chat_loop(rl: &mut DefaultEditor, controller: &ChatController) -> Result<()> {
    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                controller.set_input(&line);
                // Wait for the reply so it isn't printed over the prompt
                if let Some(handle) = controller.dispatch(UiAction::Send).await? {
                    if let Err(e) = handle.await {
                        tracing::error!("Reply task failed: {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

pub async fn run(config: &ChatConfig, role: Option<Role>) -> Result<()> {
    let mut rl = DefaultEditor::new().context("Editor failed")?;
    let controller = super::controller(config, Arc::new(TerminalRenderer::stdout()));

    let role = match role {
        Some(role) => role,
        None => match prompt_role(&mut rl)? {
            Some(role) => role,
            None => return Ok(()),
        },
    };
    if !role.is_known() {
        tracing::warn!("Role '{}' is not a known role, sending it as is", role);
    }

    controller.dispatch(UiAction::SelectRole(role)).await?;
    chat_loop(&mut rl, &controller).await
}
