//! Long-poll message loop.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info};

use crate::router::CommandRouter;
use crate::transport::{Inbound, Transport};

const GENERIC_ERROR_REPLY: &str = "Произошла ошибка при обработке вашего сообщения.";

/// Runs the teloxide repl until the process is interrupted. Every inbound
/// text message is mapped to an [`Inbound`] and handed to the router; any
/// error that escapes the router is logged and answered with a generic
/// failure reply, so one bad message never takes the loop down.
pub async fn run_repl(
    bot: teloxide::Bot,
    router: Arc<CommandRouter>,
    transport: Arc<dyn Transport>,
) {
    info!("Long poll started, waiting for messages");

    teloxide::repl(bot, move |msg: Message| {
        let router = Arc::clone(&router);
        let transport = Arc::clone(&transport);
        async move {
            if let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) {
                let inbound = Inbound {
                    user_id: user.id.0 as i64,
                    text: text.to_string(),
                    is_direct: msg.chat.is_private(),
                };

                info!(
                    user_id = inbound.user_id,
                    is_direct = inbound.is_direct,
                    "Received message"
                );

                if let Err(e) = router.handle(&inbound).await {
                    error!(error = %e, user_id = inbound.user_id, "Message handling failed");
                    if let Err(send_err) =
                        transport.send(inbound.user_id, GENERIC_ERROR_REPLY).await
                    {
                        error!(error = %send_err, "Failed to send failure reply");
                    }
                }
            }
            respond(())
        }
    })
    .await;
}
