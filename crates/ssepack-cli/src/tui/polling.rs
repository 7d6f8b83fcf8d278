//! Stream update polling
//!
//! Drains everything the stream tasks have sent since the last frame.

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use super::state::{ModeState, StreamPane, StreamStatus};
use super::stream::{StreamEvent, StreamUpdate};

/// Returns whether anything arrived
pub fn poll_stream_updates(
    rx: &mut UnboundedReceiver<StreamUpdate>,
    pane: &mut StreamPane,
    modes: &mut ModeState,
) -> bool {
    let mut needs_redraw = false;

    loop {
        match rx.try_recv() {
            Ok(StreamUpdate { method, event }) => {
                needs_redraw = true;
                match event {
                    StreamEvent::Opened { status } => {
                        modes.mark_started(method);
                        pane.set_status(StreamStatus::Open { method, status });
                    }
                    StreamEvent::Chunk(text) => pane.append_chunk(&text),
                    StreamEvent::Finished => {
                        pane.flush_partial();
                        pane.set_status(StreamStatus::Finished(method));
                    }
                    StreamEvent::Failed(error) => {
                        modes.mark_failed(method);
                        pane.flush_partial();
                        pane.push_line(format!("! {method} failed: {error}"));
                        pane.set_status(StreamStatus::Failed { method, error });
                    }
                }
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                debug!("Stream update channel disconnected");
                break;
            }
        }
    }

    needs_redraw
}
