//! Native/Desktop socket loop using tokio-tungstenite.

use futures_channel::mpsc::{unbounded, UnboundedReceiver};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{loop_inputs, ConnectOptions, LoopExit, SessionDriver, TransportCommand};
use crate::realtime::error::RealtimeError;

/// Start the connection task on the current tokio runtime.
pub(super) fn spawn(
    options: ConnectOptions,
    driver: SessionDriver,
    commands: UnboundedReceiver<TransportCommand>,
) -> Result<(), RealtimeError> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| RealtimeError::NoRuntime)?;
    handle.spawn(connection_loop(options, driver, commands));
    Ok(())
}

async fn connection_loop(
    options: ConnectOptions,
    mut driver: SessionDriver,
    mut commands: UnboundedReceiver<TransportCommand>,
) {
    let reconnect = options.reconnect.clone();
    let mut attempt = 0u32;

    loop {
        if !driver.drain_pending(&mut commands) {
            break;
        }

        match connect_async(options.socket_url.as_str()).await {
            Ok((ws_stream, _response)) => {
                crate::log_info!("Broadcaster socket open ({})", options.transport.scheme());

                let (mut write, mut read) = ws_stream.split();
                let (frame_tx, frame_rx) = unbounded::<String>();
                let (out_tx, mut out_rx) = unbounded::<String>();

                let reader = tokio::spawn(async move {
                    while let Some(msg_result) = read.next().await {
                        match msg_result {
                            Ok(Message::Text(text)) => {
                                crate::log_debug!("Broadcaster received: {}", text.as_str());
                                if frame_tx.unbounded_send(text.as_str().to_owned()).is_err() {
                                    break;
                                }
                            }
                            Ok(Message::Close(_)) => {
                                crate::log_info!("Broadcaster sent close frame");
                                break;
                            }
                            Ok(_) => {
                                // Ping/pong frames are answered by tungstenite.
                            }
                            Err(e) => {
                                crate::log_error!("Broadcaster read error: {}", e);
                                break;
                            }
                        }
                    }
                });

                let writer = tokio::spawn(async move {
                    while let Some(text) = out_rx.next().await {
                        if let Err(e) = write.send(Message::text(text)).await {
                            crate::log_error!("Broadcaster send failed: {}", e);
                            break;
                        }
                    }
                    let _ = write.close().await;
                });

                let exit = {
                    let mut inputs = loop_inputs(frame_rx, &mut commands);
                    driver.run(&mut inputs, &out_tx).await
                };

                drop(out_tx);
                reader.abort();
                let _ = writer.await;

                match exit {
                    LoopExit::Shutdown => {
                        crate::log_info!("Broadcaster connection shut down");
                        break;
                    }
                    LoopExit::Rejected => {
                        crate::log_error!("Broadcaster refused the connection, not reconnecting");
                        break;
                    }
                    LoopExit::Closed => {
                        if driver.take_established() {
                            attempt = 0;
                        }
                        crate::log_info!("Broadcaster socket closed");
                    }
                }
            }
            Err(e) => {
                crate::log_error!("Broadcaster connect error: {}", e);
            }
        }

        let Some(delay) = reconnect.next_delay(&mut attempt) else {
            crate::log_error!(
                "Max reconnect attempts ({}) exceeded",
                reconnect.max_attempts
            );
            break;
        };
        crate::log_info!("Reconnecting in {}ms (attempt {})", delay, attempt);
        tokio::time::sleep(tokio::time::Duration::from_millis(delay as u64)).await;
    }
}
