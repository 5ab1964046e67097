//! WASM/Web socket loop using web_sys::WebSocket.

use std::cell::RefCell;
use std::rc::Rc;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::StreamExt;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{js_sys, CloseEvent, MessageEvent, WebSocket};

use super::{loop_inputs, ConnectOptions, LoopExit, SessionDriver, TransportCommand};

pub(super) fn spawn(
    options: ConnectOptions,
    driver: SessionDriver,
    commands: UnboundedReceiver<TransportCommand>,
) {
    spawn_local(connection_loop(options, driver, commands));
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

        let (frame_tx, frame_rx) = unbounded::<String>();
        match connect_websocket(&options.socket_url, frame_tx).await {
            Ok(ws) => {
                crate::log_info!("Broadcaster socket open ({})", options.transport.scheme());

                let (out_tx, mut out_rx) = unbounded::<String>();
                let ws_for_send = ws.clone();
                spawn_local(async move {
                    while let Some(text) = out_rx.next().await {
                        // readyState 1 = OPEN
                        if ws_for_send.ready_state() != 1 {
                            break;
                        }
                        if let Err(e) = ws_for_send.send_with_str(&text) {
                            crate::log_error!("Broadcaster send failed: {:?}", e);
                        }
                    }
                });

                let exit = {
                    let mut inputs = loop_inputs(frame_rx, &mut commands);
                    driver.run(&mut inputs, &out_tx).await
                };
                drop(out_tx);

                match exit {
                    LoopExit::Shutdown => {
                        let _ = ws.close();
                        crate::log_info!("Broadcaster connection shut down");
                        break;
                    }
                    LoopExit::Rejected => {
                        let _ = ws.close();
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
        gloo_timers::future::TimeoutFuture::new(delay).await;
    }
}

/// Open a socket and wait for it to be ready. Text messages go to `frames`;
/// the sender is dropped when the socket closes, which ends the stream.
async fn connect_websocket(url: &str, frames: UnboundedSender<String>) -> Result<WebSocket, String> {
    let ws = WebSocket::new(url).map_err(|e| format!("Failed to create WebSocket: {:?}", e))?;

    let is_open = Rc::new(RefCell::new(false));
    let error_reason = Rc::new(RefCell::new(None::<String>));
    let frames = Rc::new(RefCell::new(Some(frames)));

    let is_open_clone = is_open.clone();
    let onopen_callback = Closure::wrap(Box::new(move |_: web_sys::Event| {
        *is_open_clone.borrow_mut() = true;
    }) as Box<dyn FnMut(web_sys::Event)>);
    ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
    onopen_callback.forget();

    let error_reason_close = error_reason.clone();
    let frames_close = frames.clone();
    let onclose_callback = Closure::wrap(Box::new(move |e: CloseEvent| {
        let reason = if e.reason().is_empty() {
            format!("Code {}", e.code())
        } else {
            e.reason()
        };
        crate::log_info!("Broadcaster socket closed: {}", reason);
        *error_reason_close.borrow_mut() = Some(reason);
        frames_close.borrow_mut().take();
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
    onclose_callback.forget();

    let error_reason_err = error_reason.clone();
    let onerror_callback = Closure::wrap(Box::new(move |_: web_sys::ErrorEvent| {
        crate::log_error!("Broadcaster socket error");
        *error_reason_err.borrow_mut() = Some("WebSocket error".to_string());
    }) as Box<dyn FnMut(web_sys::ErrorEvent)>);
    ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));
    onerror_callback.forget();

    let frames_message = frames.clone();
    let onmessage_callback = Closure::wrap(Box::new(move |e: MessageEvent| {
        if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
            let text: String = text.into();
            crate::log_debug!("Broadcaster received: {}", text);
            if let Some(sender) = frames_message.borrow().as_ref() {
                let _ = sender.unbounded_send(text);
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));
    onmessage_callback.forget();

    // 5 second timeout
    for _ in 0..500 {
        if *is_open.borrow() {
            return Ok(ws);
        }
        if let Some(reason) = error_reason.borrow().clone() {
            return Err(reason);
        }
        gloo_timers::future::TimeoutFuture::new(10).await;
    }

    let _ = ws.close();
    Err("Connection timeout".to_string())
}
