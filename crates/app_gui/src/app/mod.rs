//! Dashboard window: source selection toolbar plus the results view.

mod cards;
mod thumbs;

use eframe::{App, Frame, egui};
use plant_core::{Dashboard, DashboardState, FileSource, HttpSource};
use rfd::FileDialog;

use thumbs::ThumbCache;

pub struct UiApp {
    dashboard: Dashboard,
    thumbs: ThumbCache,
    url_input: String,
    status: String,
}

impl UiApp {
    pub fn new(dashboard: Dashboard, status: String) -> Self {
        Self {
            dashboard,
            thumbs: ThumbCache::default(),
            url_input: String::new(),
            status,
        }
    }

    fn open_file(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_directory(".")
            .pick_file()
        {
            self.thumbs.clear();
            self.dashboard.set_source(Box::new(FileSource::new(path)));
            self.status.clear();
        }
    }

    fn open_url(&mut self) {
        match HttpSource::new(self.url_input.trim()) {
            Ok(source) => {
                self.thumbs.clear();
                self.dashboard.set_source(Box::new(source));
                self.status.clear();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn refresh(&mut self) {
        self.thumbs.clear();
        self.dashboard.refresh();
        self.status.clear();
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let busy = matches!(self.dashboard.state(), DashboardState::Loading);

            if ui
                .add_enabled(!busy, egui::Button::new("Open results..."))
                .clicked()
            {
                self.open_file();
            }

            ui.separator();
            ui.label("URL");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.url_input)
                    .hint_text("http://localhost:8000/plant_ai_test_results.csv")
                    .desired_width(320.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let can_fetch = !busy && !self.url_input.trim().is_empty();
            if (ui.add_enabled(can_fetch, egui::Button::new("Fetch")).clicked() || submitted)
                && can_fetch
            {
                self.open_url();
            }

            ui.separator();
            if ui.add_enabled(!busy, egui::Button::new("Refresh")).clicked() {
                self.refresh();
            }

            if let Some(source) = self.dashboard.source() {
                ui.label(egui::RichText::new(source.describe()).weak());
            }
            if !self.status.is_empty() {
                ui.colored_label(egui::Color32::LIGHT_RED, self.status.as_str());
            }
        });
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.render_toolbar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Self {
                dashboard, thumbs, ..
            } = self;
            match dashboard.state() {
                DashboardState::Idle => {
                    ui.heading("No results loaded");
                    ui.label("Open a results CSV or fetch one by URL.");
                }
                DashboardState::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading results...");
                    });
                }
                DashboardState::LoadError(message) => {
                    ui.heading("Could not load results");
                    ui.colored_label(egui::Color32::LIGHT_RED, message.as_str());
                }
                DashboardState::Rendered(view) => {
                    cards::render_summary(ui, view);
                    ui.add_space(8.0);
                    if view.records.is_empty() {
                        ui.label("The results table has no rows.");
                    } else {
                        cards::render_cards(ui, ctx, view, dashboard.source(), thumbs);
                    }
                }
            }
        });
    }
}
