use std::sync::Arc;

use anyhow::{Result, bail};

use crate::chat::{Role, TerminalRenderer};
use crate::core::ChatConfig;

pub async fn run(config: &ChatConfig, role: Role, message: &str) -> Result<()> {
    let controller = super::controller(config, Arc::new(TerminalRenderer::stdout()));
    controller.select_role(role).await?;

    controller.set_input(message);
    let Some(handle) = controller.handle_send()? else {
        bail!("Nothing to send, the message is empty");
    };
    handle.await?;

    Ok(())
}
