use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use aidlink_db::Database;
use aidlink_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;
use crate::session::RoomSession;

/// Handle a single WebSocket connection. The client must send an
/// Identify command with a valid JWT within the timeout; afterwards the
/// connection runs the subscription loop until either side closes. All
/// per-connection state (session, broadcast receiver) is dropped on every
/// exit path.
pub async fn handle_connection(
    socket: WebSocket,
    db: Arc<Database>,
    dispatcher: Dispatcher,
    jwt_secret: String,
) {
    let (mut sender, mut receiver) = socket.split();

    let claims = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(claims) => claims,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!("{} ({}) connected to gateway", claims.email, claims.sub);

    let ready = GatewayEvent::Ready {
        user_id: claims.sub,
        email: claims.email.clone(),
        name: claims.name.clone(),
    };
    if sender
        .send(Message::Text(serde_json::to_string(&ready).unwrap().into()))
        .await
        .is_err()
    {
        return;
    }

    let mut store_rx = dispatcher.subscribe();
    let mut session = RoomSession::new(db, claims.email.clone());

    loop {
        let events = tokio::select! {
            result = store_rx.recv() => {
                match result {
                    Ok(event) => match session.on_store_event(&event) {
                        Ok(events) => events,
                        Err(e) => {
                            warn!("{}: store event handling failed: {}", claims.email, e);
                            continue;
                        }
                    },
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Store receiver lagged by {} events", n);
                        continue;
                    }
                    Err(_) => break,
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<GatewayCommand>(&text) {
                            Ok(cmd) => match session.handle_command(cmd) {
                                Ok(events) => events,
                                Err(e) => {
                                    warn!("{}: command failed: {}", claims.email, e);
                                    continue;
                                }
                            },
                            Err(e) => {
                                warn!(
                                    "{} ({}) bad command: {} -- raw: {}",
                                    claims.email,
                                    claims.sub,
                                    e,
                                    &text[..text.len().min(200)]
                                );
                                continue;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                }
            }
        };

        for event in events {
            if sender
                .send(Message::Text(serde_json::to_string(&event).unwrap().into()))
                .await
                .is_err()
            {
                info!("{} ({}) disconnected from gateway", claims.email, claims.sub);
                return;
            }
        }
    }

    info!("{} ({}) disconnected from gateway", claims.email, claims.sub);
}

async fn wait_for_identify(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<aidlink_types::api::Claims> {
    use aidlink_types::api::Claims;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    let timeout = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    let token_data = decode::<Claims>(
                        &token,
                        &DecodingKey::from_secret(jwt_secret.as_bytes()),
                        &Validation::default(),
                    )
                    .ok()?;

                    return Some(token_data.claims);
                }
            }
        }
        None
    });

    timeout.await.ok().flatten()
}
