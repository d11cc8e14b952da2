//! Load-status overlay and viewport buttons.

use splatview_data::AssetSource;

/// User-facing status surface for the one-shot load phase.
pub trait StatusPresenter {
    /// Render a percentage, or an indeterminate state for `None`.
    fn show_progress(&mut self, pct: Option<f32>);
    /// Render a terminal failure with the sources that were attempted.
    fn show_error(&mut self, message: &str, attempted: &[AssetSource]);
    /// Remove the overlay. Loading is front-loaded: once hidden, later
    /// progress updates stay hidden for the rest of the session.
    fn hide(&mut self);
}

/// Actions emitted by the viewport buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    ResetCamera,
    ToggleAutoRotate,
}

#[derive(Debug, Clone, PartialEq)]
enum StatusView {
    Progress(Option<f32>),
    Error { message: String, attempted: Vec<String> },
}

/// egui implementation of [`StatusPresenter`] plus the two buttons.
pub struct StatusOverlay {
    view: StatusView,
    visible: bool,
    hidden_for_session: bool,
}

impl StatusOverlay {
    pub fn new() -> Self {
        Self {
            view: StatusView::Progress(None),
            visible: true,
            hidden_for_session: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn status_label(&self) -> String {
        match &self.view {
            StatusView::Progress(None) => "Loading 3D scene...".to_string(),
            StatusView::Progress(Some(pct)) => {
                format!("Loading 3D scene... {:.0}%", pct)
            }
            StatusView::Error { message, .. } => message.clone(),
        }
    }

    /// Draw the buttons and, while visible, the status panel. Returns the
    /// actions clicked this frame.
    pub fn ui(&mut self, ctx: &egui::Context, auto_rotate: bool) -> Vec<UiAction> {
        let mut actions = Vec::new();

        egui::Area::new(egui::Id::new("viewport-buttons"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Reset Camera").clicked() {
                        actions.push(UiAction::ResetCamera);
                    }
                    let rotate_label = if auto_rotate { "Stop Rotate" } else { "Auto Rotate" };
                    if ui.button(rotate_label).clicked() {
                        actions.push(UiAction::ToggleAutoRotate);
                    }
                });
            });

        if self.visible {
            egui::Area::new(egui::Id::new("load-status"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| match &self.view {
                        StatusView::Progress(_) => {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(self.status_label());
                            });
                        }
                        StatusView::Error { message, attempted } => {
                            ui.colored_label(egui::Color32::LIGHT_RED, message.as_str());
                            ui.label("Attempted sources:");
                            for source in attempted {
                                ui.monospace(source.as_str());
                            }
                        }
                    });
                });
        }

        actions
    }
}

impl Default for StatusOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPresenter for StatusOverlay {
    fn show_progress(&mut self, pct: Option<f32>) {
        if self.hidden_for_session {
            return;
        }
        self.view = StatusView::Progress(pct);
        self.visible = true;
    }

    fn show_error(&mut self, message: &str, attempted: &[AssetSource]) {
        self.view = StatusView::Error {
            message: message.to_string(),
            attempted: attempted.iter().map(ToString::to_string).collect(),
        };
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.hidden_for_session = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatview_data::Provenance;

    #[test]
    fn progress_labels() {
        let mut overlay = StatusOverlay::new();
        assert_eq!(overlay.status_label(), "Loading 3D scene...");

        overlay.show_progress(Some(42.4));
        assert_eq!(overlay.status_label(), "Loading 3D scene... 42%");
    }

    #[test]
    fn hide_latches_for_the_session() {
        let mut overlay = StatusOverlay::new();
        overlay.show_progress(Some(80.0));
        assert!(overlay.is_visible());

        overlay.hide();
        assert!(!overlay.is_visible());

        overlay.show_progress(Some(90.0));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn error_carries_attempted_sources() {
        let mut overlay = StatusOverlay::new();
        let attempted = vec![
            AssetSource::new("assets/scene.ply", Provenance::Default),
            AssetSource::new("scene.ply", Provenance::Fallback),
        ];
        overlay.show_error("Failed to load asset: bad bytes", &attempted);

        assert!(overlay.is_visible());
        match &overlay.view {
            StatusView::Error { message, attempted } => {
                assert!(message.contains("bad bytes"));
                assert_eq!(attempted.len(), 2);
                assert_eq!(attempted[0], "assets/scene.ply");
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }
}
