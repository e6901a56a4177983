use std::sync::mpsc::Receiver;
use std::time::Instant;

use eframe::egui::{self, Align, Context, Layout, Vec2};
use netview::{NavigationEvent, Network};
use tracing::warn;

use crate::util::format_millis;

use super::super::ViewModel;
use super::super::scene::Scene;

impl ViewModel {
    pub(in crate::app) fn new(
        network: Network,
        source_label: String,
        navigation_rx: Receiver<NavigationEvent>,
    ) -> Self {
        Self {
            network,
            scene: Scene::default(),
            source_label,
            navigation_rx,
            last_navigation: None,
            last_report: None,
            last_error: None,
            last_link: None,
            reports_applied: 0,
            drag_offset: Vec2::ZERO,
        }
    }

    /// Advances the refresh protocol and hands queued render ops to the scene.
    pub(in crate::app) fn sync_network(&mut self, now: Instant) {
        match self.network.poll(now) {
            Ok(Some(report)) => {
                self.reports_applied += 1;
                self.last_report = Some(report);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(%error, "refresh protocol error");
                self.last_error = Some(error.to_string());
            }
        }
        self.scene.apply(self.network.drain_render_ops());

        while let Ok(event) = self.navigation_rx.try_recv() {
            self.last_navigation = Some(event);
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        let now = Instant::now();
        self.sync_network(now);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("netview");
                    ui.separator();
                    ui.label(self.source_label.as_str());
                    ui.label(format!("nodes: {}", self.scene.node_count()));
                    ui.label(format!("edges: {}", self.scene.edge_count()));
                    if ui.button("Refresh").clicked() {
                        self.network.refresh(false);
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "data v{} / requested v{}",
                            self.network.data_version(),
                            self.network.requested_version()
                        ));
                        if self.network.is_loading() {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        // Interaction above may have queued more ops or requests.
        self.scene.apply(self.network.drain_render_ops());

        if self.network.is_busy() {
            match self.network.next_deadline() {
                Some(deadline) => {
                    ctx.request_repaint_after(deadline.saturating_duration_since(now));
                }
                None => ctx.request_repaint_after(std::time::Duration::from_millis(16)),
            }
        }
    }

    pub(in crate::app) fn deadline_text(&self) -> Option<String> {
        let deadline = self.network.next_deadline()?;
        Some(format!(
            "next apply in {}",
            format_millis(deadline.saturating_duration_since(Instant::now()))
        ))
    }
}
