//! Click handling for the map: toggles the active district, fits the zoom to
//! it and tells the chart and headcount panels which district to show.
//!
//! The controller never touches a UI. Clicks come in as [`MapEvent`]s and
//! everything the views must do comes back as [`RenderCommand`]s, in the order
//! they have to be applied. All state changes for a click are made before the
//! commands are returned, so a command list always describes the latest
//! selection.

use crate::registry::RegionRegistry;
use crate::view::{TRANSITION_MS, ViewState, Viewport, ZoomTransform};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("unknown district code: {0}")]
    UnknownRegion(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    RegionClicked { code: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Paint a district with its choropleth color.
    Fill { code: String, color: String },
    /// Toggle the highlighted outline of a district.
    Highlight { code: String, active: bool },
    /// Show the name of the clicked district.
    SetLabel { name: String },
    /// Animate the map group to `transform` over `duration_ms`.
    ApplyTransform {
        transform: ZoomTransform,
        stroke_width: f64,
        duration_ms: u64,
    },
    /// Redraw the chart bars for `key`.
    RenderChart { key: Option<String> },
    /// Fetch the unemployed headcount for a district name. Results must be
    /// dropped unless `generation` is still the controller's generation.
    LookupHeadcount { name: String, generation: u64 },
}

pub struct SelectionController {
    registry: RegionRegistry,
    view: ViewState,
    viewport: Viewport,
    generation: u64,
}

impl SelectionController {
    pub fn new(registry: RegionRegistry, viewport: Viewport) -> Self {
        Self {
            registry,
            view: ViewState::default(),
            viewport,
            generation: 0,
        }
    }

    pub fn handle(&mut self, event: MapEvent) -> Result<Vec<RenderCommand>, SelectionError> {
        match event {
            MapEvent::RegionClicked { code } => self.on_region_clicked(&code),
        }
    }

    /// Select `code`, or deselect it when it is already the active district.
    pub fn on_region_clicked(&mut self, code: &str) -> Result<Vec<RenderCommand>, SelectionError> {
        let region = self
            .registry
            .get(code)
            .ok_or_else(|| SelectionError::UnknownRegion(code.to_string()))?;

        let name = region.name.clone();
        let bounds = region.bounds;

        let mut commands = vec![RenderCommand::SetLabel { name: name.clone() }];

        if self.registry.is_active(code) {
            commands.extend(self.reset());
            return Ok(commands);
        }

        let transform = ZoomTransform::fit(&bounds, &self.viewport);

        if let Some(previous) = self.registry.activate(code) {
            commands.push(RenderCommand::Highlight {
                code: previous,
                active: false,
            });
        }
        commands.push(RenderCommand::Highlight {
            code: code.to_string(),
            active: true,
        });

        self.view.transform = transform;
        self.view.chart_key = Some(code.to_string());
        self.generation += 1;

        tracing::debug!(
            code,
            scale = transform.scale,
            generation = self.generation,
            "district selected"
        );

        commands.push(Self::transition(transform));
        commands.push(RenderCommand::RenderChart {
            key: self.view.chart_key.clone(),
        });
        commands.push(RenderCommand::LookupHeadcount {
            name,
            generation: self.generation,
        });
        Ok(commands)
    }

    /// Deselect and zoom back out. The chart keeps showing the last district.
    pub fn reset(&mut self) -> Vec<RenderCommand> {
        let mut commands = Vec::new();
        if let Some(previous) = self.registry.clear() {
            commands.push(RenderCommand::Highlight {
                code: previous,
                active: false,
            });
        }
        self.view.transform = ZoomTransform::IDENTITY;
        self.generation += 1;
        tracing::debug!(generation = self.generation, "selection reset");

        commands.push(Self::transition(ZoomTransform::IDENTITY));
        commands
    }

    fn transition(transform: ZoomTransform) -> RenderCommand {
        RenderCommand::ApplyTransform {
            transform,
            stroke_width: transform.stroke_width(),
            duration_ms: TRANSITION_MS,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn active_code(&self) -> Option<&str> {
        self.registry.active().map(|r| r.code.as_str())
    }

    /// Bumped on every selection change; stamps asynchronous lookups.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::region;

    fn controller() -> SelectionController {
        let registry = RegionRegistry::new(vec![
            region("E06000001", "Hartlepool", [100.0, 100.0], [150.0, 130.0]),
            region("E06000002", "Middlesbrough", [200.0, 300.0], [400.0, 400.0]),
        ]);
        SelectionController::new(registry, Viewport { width: 740.0, height: 700.0 })
    }

    fn click(controller: &mut SelectionController, code: &str) -> Vec<RenderCommand> {
        controller
            .handle(MapEvent::RegionClicked { code: code.to_string() })
            .unwrap()
    }

    fn applied_transform(commands: &[RenderCommand]) -> (ZoomTransform, u64) {
        commands
            .iter()
            .find_map(|c| match c {
                RenderCommand::ApplyTransform { transform, duration_ms, .. } => {
                    Some((*transform, *duration_ms))
                }
                _ => None,
            })
            .expect("no transform command")
    }

    #[test]
    fn selecting_small_region_zooms_to_max_scale_centred() {
        let mut controller = controller();
        let commands = click(&mut controller, "E06000001");

        let (transform, duration) = applied_transform(&commands);
        assert_eq!(duration, 750);
        assert_eq!(transform.scale, 7.0);
        assert_eq!(transform.apply([125.0, 115.0]), [370.0, 350.0]);
        assert_eq!(controller.view().transform, transform);
        assert_eq!(controller.view().chart_key.as_deref(), Some("E06000001"));
        assert_eq!(controller.active_code(), Some("E06000001"));
    }

    #[test]
    fn select_emits_commands_in_order() {
        let mut controller = controller();
        let commands = click(&mut controller, "E06000002");

        assert_eq!(commands[0], RenderCommand::SetLabel { name: "Middlesbrough".into() });
        assert_eq!(
            commands[1],
            RenderCommand::Highlight { code: "E06000002".into(), active: true }
        );
        assert!(matches!(commands[2], RenderCommand::ApplyTransform { .. }));
        assert_eq!(commands[3], RenderCommand::RenderChart { key: Some("E06000002".into()) });
        assert_eq!(
            commands[4],
            RenderCommand::LookupHeadcount { name: "Middlesbrough".into(), generation: 1 }
        );
    }

    #[test]
    fn clicking_active_region_again_resets() {
        let mut controller = controller();
        click(&mut controller, "E06000001");
        let commands = click(&mut controller, "E06000001");

        assert_eq!(commands[0], RenderCommand::SetLabel { name: "Hartlepool".into() });
        assert_eq!(
            commands[1],
            RenderCommand::Highlight { code: "E06000001".into(), active: false }
        );
        let (transform, duration) = applied_transform(&commands);
        assert_eq!(transform, ZoomTransform::IDENTITY);
        assert_eq!(duration, 750);
        assert!(controller.active_code().is_none());
        assert!(!commands.iter().any(|c| matches!(c, RenderCommand::LookupHeadcount { .. })));
    }

    #[test]
    fn double_click_matches_click_then_reset() {
        let mut toggled = controller();
        click(&mut toggled, "E06000002");
        click(&mut toggled, "E06000002");

        let mut reset = controller();
        click(&mut reset, "E06000002");
        reset.reset();

        assert_eq!(toggled.view(), reset.view());
        assert_eq!(toggled.active_code(), reset.active_code());
        assert_eq!(toggled.view().transform, ZoomTransform::IDENTITY);
    }

    #[test]
    fn reset_keeps_chart_key() {
        let mut controller = controller();
        click(&mut controller, "E06000001");
        controller.reset();
        assert_eq!(controller.view().chart_key.as_deref(), Some("E06000001"));
    }

    #[test]
    fn switching_regions_deactivates_previous() {
        let mut controller = controller();
        click(&mut controller, "E06000001");
        let commands = click(&mut controller, "E06000002");

        assert!(commands.contains(&RenderCommand::Highlight {
            code: "E06000001".into(),
            active: false
        }));
        assert_eq!(controller.active_code(), Some("E06000002"));
        assert_eq!(controller.generation(), 2);
    }

    #[test]
    fn unknown_region_is_rejected_without_side_effects() {
        let mut controller = controller();
        click(&mut controller, "E06000001");
        let before = controller.view().clone();

        let err = controller.on_region_clicked("Z99999999").unwrap_err();
        assert_eq!(err, SelectionError::UnknownRegion("Z99999999".into()));
        assert_eq!(controller.view(), &before);
        assert_eq!(controller.active_code(), Some("E06000001"));
        assert_eq!(controller.generation(), 1);
    }

    #[test]
    fn reset_without_selection_still_zooms_out() {
        let mut controller = controller();
        let commands = controller.reset();
        assert_eq!(commands.len(), 1);
        assert_eq!(applied_transform(&commands).0, ZoomTransform::IDENTITY);
    }
}
