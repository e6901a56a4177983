use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context};
use netview::{NavigationEvent, Network, NetworkOptions, ReconcileReport};

use self::scene::Scene;
use self::source::{GraphSource, Latency};

mod graph;
mod render_utils;
mod scene;
mod source;
mod ui;

/// Everything needed to (re)build a view once the graph source is available.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub options: NetworkOptions,
    pub screen_size: [u32; 2],
    pub data: Option<PathBuf>,
    pub latency: Duration,
    pub jitter: Duration,
    pub seed: u64,
}

pub struct NetworkApp {
    config: AppConfig,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphSource, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    network: Network,
    scene: Scene,
    source_label: String,
    navigation_rx: Receiver<NavigationEvent>,
    last_navigation: Option<NavigationEvent>,
    last_report: Option<ReconcileReport>,
    last_error: Option<String>,
    last_link: Option<String>,
    reports_applied: u64,
    drag_offset: egui::Vec2,
}

impl NetworkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let state = Self::start_load(&config);
        Self { config, state }
    }

    fn spawn_load(config: &AppConfig) -> Receiver<Result<GraphSource, String>> {
        let (tx, rx) = mpsc::channel();
        let data = config.data.clone();
        let seed = config.seed;

        thread::spawn(move || {
            let result =
                GraphSource::load(data.as_deref(), seed).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(config: &AppConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(config),
        }
    }

    fn build_view(&self, ctx: &Context, source: GraphSource) -> ViewModel {
        let [width, height] = self.config.screen_size;
        let mut network = Network::new(width, height, self.config.options.clone());

        let (navigation_tx, navigation_rx) = mpsc::channel();
        network.bind_navigation(move |event| {
            let _ = navigation_tx.send(*event);
        });
        source.attach(
            &mut network,
            ctx,
            Latency {
                base: self.config.latency,
                jitter: self.config.jitter,
                seed: self.config.seed,
            },
        );
        network.refresh(false);

        ViewModel::new(network, source.label(), navigation_rx)
    }
}

impl eframe::App for NetworkApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut loaded = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    loaded = Some(result);
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph source...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph source");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if retry {
            self.state = Self::start_load(&self.config);
        }

        if let Some(result) = loaded {
            self.state = match result {
                Ok(source) => AppState::Ready(Box::new(self.build_view(ctx, source))),
                Err(error) => {
                    tracing::error!(%error, "graph source failed to load");
                    AppState::Error(error)
                }
            };
        }
    }
}
