//! Application state and main loop

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::EventStream;
use futures::StreamExt;
use ssepack_core::{Composer, EventRegistry, HttpTransport, StreamTrigger, WrappedTextMeasure};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::config::AppConfig;

use super::host::SessionHost;
use super::polling::poll_stream_updates;
use super::render::{input_columns, HitAreas};
use super::selector::PathSelector;
use super::state::{ModeState, StreamPane};
use super::stream::{build_intent, spawn_stream, StreamUpdate};
use super::terminal::{self, Tui};
use super::theme::Theme;

/// Redraw interval while waiting for input or stream data
const TICK: Duration = Duration::from_millis(50);

pub struct App {
    pub(crate) config: AppConfig,
    pub(crate) theme: Theme,
    pub(crate) composer: Composer,
    pub(crate) host: SessionHost,
    /// Window-level listeners registered by the composer's popover
    pub(crate) events: Rc<EventRegistry>,
    pub(crate) selector: PathSelector,
    pub(crate) trigger: Arc<StreamTrigger<HttpTransport>>,
    /// Identifies this run to the server
    pub(crate) client_id: String,
    pub(crate) modes: ModeState,
    pub(crate) pane: StreamPane,
    pub(crate) stream_tx: UnboundedSender<StreamUpdate>,
    pub(crate) stream_rx: UnboundedReceiver<StreamUpdate>,
    pub(crate) hits: HitAreas,
    /// One-line message shown in the status bar until the next edit
    pub(crate) notice: Option<String>,
    pub(crate) should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let transport = HttpTransport::new(Some(&config.stream.base_url))
            .with_context(|| format!("Invalid base URL {}", config.stream.base_url))?;

        let (width, _) = crossterm::terminal::size().unwrap_or((80, 24));
        let measure =
            WrappedTextMeasure::new(usize::from(input_columns(width, &config.composer)));
        let events = EventRegistry::new();
        let mut composer = Composer::new(config.composer.clone(), measure, events.clone());
        composer.focus();

        let (stream_tx, stream_rx) = unbounded_channel();
        let client_id = uuid::Uuid::new_v4().to_string();
        debug!(%client_id, "Client id");

        Ok(Self {
            modes: ModeState::new(config.stream.mode),
            config,
            theme: Theme::default(),
            composer,
            host: SessionHost::new(),
            events,
            selector: PathSelector::new(),
            trigger: Arc::new(StreamTrigger::new(transport)),
            client_id,
            pane: StreamPane::new(),
            stream_tx,
            stream_rx,
            hits: HitAreas::default(),
            notice: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = terminal::setup()?;
        scopeguard::defer! {
            terminal::restore();
        }

        let result = self.event_loop(&mut tui).await;
        self.composer.teardown();
        info!("Exiting");
        result
    }

    async fn event_loop(&mut self, tui: &mut Tui) -> Result<()> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK);

        while !self.should_quit {
            tui.draw(|f| self.ui(f)).context("Failed to draw frame")?;

            tokio::select! {
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => return Err(e).context("Terminal event stream failed"),
                    None => break,
                },
                _ = tick.tick() => {}
            }

            self.dispatch_sends();
            self.poll_stream();
        }
        Ok(())
    }

    /// Start an exchange for every payload the composer sent
    pub(crate) fn dispatch_sends(&mut self) {
        for payload in self.host.take_outbox() {
            let method = self.modes.current();
            if !self.modes.can_start(method) {
                info!(%method, "Stream already started for this mode");
                self.notice = Some(format!("{method} stream already started"));
                continue;
            }
            if !payload.files.is_empty() {
                debug!(
                    files = payload.files.len(),
                    "Attachments stay local; only the text is streamed"
                );
            }

            self.modes.mark_pending(method);
            self.pane.begin(method, &payload.text);
            let intent = build_intent(
                method,
                &self.config.stream.path,
                &self.client_id,
                &payload.text,
            );
            spawn_stream(self.trigger.clone(), intent, self.stream_tx.clone());
        }
    }

    pub(crate) fn poll_stream(&mut self) -> bool {
        poll_stream_updates(&mut self.stream_rx, &mut self.pane, &mut self.modes)
    }
}
