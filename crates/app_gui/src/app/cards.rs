//! Summary panel and per-result cards.

use eframe::egui;
use plant_core::{DashboardView, PredictionResult, ResultsSource};

use super::thumbs::{THUMB_SIZE, ThumbCache};

const CARD_WIDTH: f32 = 300.0;
const PASS_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 210, 106);
const FAIL_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 71, 87);

pub(super) fn render_summary(ui: &mut egui::Ui, view: &DashboardView) {
    let summary = &view.summary;
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.horizontal_wrapped(|ui| {
            stat(ui, "Total", summary.total.to_string());
            stat(ui, "Passed", summary.passed.to_string());
            stat(ui, "Failed", summary.failed.to_string());
            stat(ui, "Accuracy", format!("{:.1}%", summary.accuracy * 100.0));
            stat(
                ui,
                "Avg confidence",
                summary
                    .avg_confidence
                    .map(|c| format!("{:.1}%", c * 100.0))
                    .unwrap_or_else(|| "n/a".to_string()),
            );
            if view.skipped > 0 {
                ui.separator();
                ui.colored_label(
                    egui::Color32::YELLOW,
                    format!("{} malformed rows skipped", view.skipped),
                );
            }
        });
    });
}

fn stat(ui: &mut egui::Ui, label: &str, value: String) {
    ui.vertical(|ui| {
        ui.label(egui::RichText::new(label).small().weak());
        ui.label(egui::RichText::new(value).heading().strong());
    });
    ui.add_space(16.0);
}

pub(super) fn render_cards(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    view: &DashboardView,
    source: Option<&dyn ResultsSource>,
    thumbs: &mut ThumbCache,
) {
    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for record in &view.records {
                    render_card(ui, ctx, record, source, thumbs);
                }
            });
        });
}

fn render_card(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    record: &PredictionResult,
    source: Option<&dyn ResultsSource>,
    thumbs: &mut ThumbCache,
) {
    let case = &record.case;
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(CARD_WIDTH);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&case.test_id).strong());
                let (text, color) = if record.pass {
                    ("PASS", PASS_COLOR)
                } else {
                    ("FAIL", FAIL_COLOR)
                };
                ui.label(egui::RichText::new(text).strong().color(color));
            });
            let subject = case.subject();
            if !subject.is_empty() {
                ui.label(subject);
            }

            let thumb_px = THUMB_SIZE as f32;
            let (resp, painter) =
                ui.allocate_painter(egui::Vec2::new(thumb_px, thumb_px), egui::Sense::hover());
            let r = resp.rect;
            if let Some(id) = thumbs.get_or_load(ctx, source, &case.image_path) {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(id, r, uv, egui::Color32::WHITE);
            } else {
                painter.rect_filled(r, 4.0, egui::Color32::from_gray(40));
                painter.rect_stroke(
                    r,
                    4.0,
                    egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
                    egui::StrokeKind::Inside,
                );
            }

            ui.label(format!("Expected: {}", case.expected_label));
            let predicted = if record.predicted_label.is_empty() {
                "-"
            } else {
                record.predicted_label.as_str()
            };
            ui.label(format!("Predicted: {predicted}"));
            ui.label(match record.confidence {
                Some(c) => format!("Confidence: {:.1}%", c * 100.0),
                None => "Confidence: n/a".to_string(),
            });
            if let Some(error) = &record.error {
                ui.colored_label(FAIL_COLOR, format!("Error: {error}"));
            }

            let conditions = case.conditions();
            if !conditions.is_empty() {
                ui.separator();
                for (label, value) in conditions {
                    ui.label(egui::RichText::new(format!("{label}: {value}")).small());
                }
            }
            if let Some(ts) = &record.timestamp {
                ui.label(egui::RichText::new(ts).small().weak());
            }
        });
    });
}
