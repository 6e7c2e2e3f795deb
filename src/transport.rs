//! WebSocket transport channel
//!
//! One channel per live session. The channel owns its reader and writer
//! tasks; frame and error handlers are bound to the channel instance, so a
//! closed channel can never deliver into a superseding session. The
//! one-channel-per-session invariant is enforced by the controller, not
//! here.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::SessionError;

/// An open bidirectional message connection.
pub struct TransportChannel {
    outbound: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
    _writer: JoinHandle<()>,
}

impl TransportChannel {
    /// Connect to `url` and start pumping frames. `on_frame` runs for every
    /// inbound text frame, `on_error` once on a channel-level failure.
    pub async fn open<F, E>(url: &str, on_frame: F, on_error: E) -> Result<Self, SessionError>
    where
        F: Fn(String) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            let mut on_error = Some(on_error);
            while let Some(result) = source.next().await {
                match result {
                    Ok(Message::Text(text)) => on_frame(text),
                    Ok(Message::Close(_)) => {
                        log::debug!("peer closed the channel");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if let Some(on_error) = on_error.take() {
                            on_error(e.to_string());
                        }
                        return;
                    }
                }
            }
        });

        Ok(Self {
            outbound,
            reader,
            _writer: writer,
        })
    }

    /// Queue a text frame for sending.
    pub fn send(&self, text: String) -> Result<(), SessionError> {
        self.outbound
            .send(text)
            .map_err(|_| SessionError::Transport("channel is closed".to_string()))
    }

    /// Tear the channel down. No further inbound frames are delivered for
    /// this instance once close returns.
    pub fn close(self) {
        // Drop does the work: the reader task is aborted and dropping the
        // outbound sender lets the writer drain and close the sink.
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
