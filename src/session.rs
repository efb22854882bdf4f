//! Drives a [`SelectionController`] against a [`Renderer`].
//!
//! Synchronous commands are applied as soon as the controller returns them.
//! The headcount lookup is spawned and handed back as a [`PendingHeadcount`];
//! its answer is only shown if no other click happened in the meantime.

use crate::chart::{self, ChartFrame};
use crate::choropleth;
use crate::data::{DataStore, FinancialDataset};
use crate::headcount::HeadcountLookup;
use crate::selection::{MapEvent, RenderCommand, SelectionController, SelectionError};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Receiver of everything the map page would draw.
pub trait Renderer {
    fn apply(&mut self, command: &RenderCommand);
    fn draw_chart(&mut self, frame: &ChartFrame);
    fn set_headcount(&mut self, value: &str);
}

/// Renderer that keeps every output, in order. Used headless and in tests.
#[derive(Debug, Default, Serialize)]
pub struct RecordingRenderer {
    pub commands: Vec<RenderCommand>,
    pub charts: Vec<ChartFrame>,
    pub headcounts: Vec<String>,
}

impl RecordingRenderer {
    /// Hand over everything recorded so far and start afresh.
    pub fn drain(&mut self) -> RecordingRenderer {
        std::mem::take(self)
    }
}

impl Renderer for RecordingRenderer {
    fn apply(&mut self, command: &RenderCommand) {
        self.commands.push(command.clone());
    }

    fn draw_chart(&mut self, frame: &ChartFrame) {
        self.charts.push(frame.clone());
    }

    fn set_headcount(&mut self, value: &str) {
        self.headcounts.push(value.to_string());
    }
}

/// An in-flight headcount lookup, stamped with the selection it belongs to.
pub struct PendingHeadcount {
    generation: u64,
    handle: JoinHandle<String>,
}

impl PendingHeadcount {
    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct MapSession<R: Renderer> {
    controller: SelectionController,
    financial: Arc<FinancialDataset>,
    headcounts: HeadcountLookup,
    renderer: R,
}

impl<R: Renderer> MapSession<R> {
    /// Start a session and paint the initial choropleth.
    pub fn new(
        controller: SelectionController,
        store: &DataStore,
        headcounts: HeadcountLookup,
        mut renderer: R,
    ) -> Self {
        for command in choropleth::fill_commands(controller.registry(), &store.rates) {
            renderer.apply(&command);
        }
        Self {
            controller,
            financial: Arc::clone(&store.financial),
            headcounts,
            renderer,
        }
    }

    /// Apply a click. Selection, zoom and chart are updated before this
    /// returns; the headcount lookup, if any, is still running.
    pub fn click(&mut self, code: &str) -> Result<Option<PendingHeadcount>, SelectionError> {
        let commands = self.controller.handle(MapEvent::RegionClicked {
            code: code.to_string(),
        })?;

        let mut pending = None;
        for command in &commands {
            self.renderer.apply(command);
            match command {
                RenderCommand::RenderChart { key } => {
                    let frame = chart::render_chart(&self.financial, key.as_deref());
                    self.renderer.draw_chart(&frame);
                }
                RenderCommand::LookupHeadcount { name, generation } => {
                    let lookup = self.headcounts.clone();
                    let name = name.clone();
                    pending = Some(PendingHeadcount {
                        generation: *generation,
                        handle: tokio::spawn(async move { lookup.lookup_headcount(&name).await }),
                    });
                }
                _ => {}
            }
        }
        Ok(pending)
    }

    /// Wait for a lookup and show its answer if its selection is still the
    /// current one. Returns whether the value was shown.
    pub async fn resolve(&mut self, pending: PendingHeadcount) -> bool {
        let value = match pending.handle.await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Headcount lookup failed: {}", e);
                return false;
            }
        };
        if pending.generation != self.controller.generation() {
            tracing::debug!(
                stale = pending.generation,
                current = self.controller.generation(),
                "dropping superseded headcount"
            );
            return false;
        }
        self.renderer.set_headcount(&value);
        true
    }

    /// Click and wait for the headcount to land.
    pub async fn click_and_settle(&mut self, code: &str) -> Result<(), SelectionError> {
        if let Some(pending) = self.click(code)? {
            self.resolve(pending).await;
        }
        Ok(())
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
