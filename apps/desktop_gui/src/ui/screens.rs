//! Drawing for the loading, welcome, game and result screens.

use std::time::Instant;

use client_core::format_price;
use eframe::egui;
use shared::domain::{CarId, OptionId, Question};

use super::app::{CarImageState, CarQuizApp};
use crate::controller::events::UiErrorCategory;

const CARD_MAX_WIDTH: f32 = 560.0;
const IMAGE_MAX_HEIGHT: f32 = 320.0;
const OPTION_BUTTON_HEIGHT: f32 = 44.0;

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Rejected => "Rejected",
        UiErrorCategory::Validation => "Invalid reply",
        UiErrorCategory::Unknown => "Error",
    }
}

fn centered_card(ui: &mut egui::Ui, add: impl FnOnce(&mut egui::Ui)) {
    let avail = ui.available_size();
    let card_width = avail.x.min(CARD_MAX_WIDTH);
    ui.add_space((avail.y * 0.08).clamp(12.0, 64.0));
    ui.vertical_centered(|ui| {
        ui.set_width(card_width);
        egui::Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(14.0)
            .stroke(egui::Stroke::new(
                1.0,
                ui.visuals().widgets.noninteractive.bg_stroke.color,
            ))
            .inner_margin(egui::Margin::symmetric(20, 18))
            .show(ui, |ui| {
                ui.style_mut().spacing.item_spacing = egui::vec2(10.0, 10.0);
                ui.vertical_centered(add);
            });
    });
}

impl CarQuizApp {
    pub(super) fn show_progress(&mut self, ui: &mut egui::Ui) {
        let fraction = self.session.progress_percent() / 100.0;
        ui.add_space(4.0);
        ui.add(egui::ProgressBar::new(fraction).desired_height(8.0));
        ui.add_space(4.0);
    }

    pub(super) fn show_status_line(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.error_dialog.is_some() {
                ui.colored_label(ui.visuals().error_fg_color, &self.status);
            } else {
                ui.weak(&self.status);
            }
        });
    }

    pub(super) fn show_loading_screen(&mut self, ui: &mut egui::Ui) {
        let failed = self.session.status().map(str::to_owned);
        let can_retry = self.can_retry();
        let mut retry = false;
        centered_card(ui, |ui| match &failed {
            Some(message) => {
                ui.heading("Guess the Car Price");
                ui.colored_label(ui.visuals().error_fg_color, message);
                if ui.add_enabled(can_retry, egui::Button::new("Retry")).clicked() {
                    retry = true;
                }
                if !can_retry {
                    ui.weak("Relaunch the game to try again.");
                }
            }
            None => {
                ui.spinner();
                ui.label("Loading...");
            }
        });
        if retry {
            self.retry_loading();
        }
    }

    pub(super) fn show_welcome_screen(&mut self, ui: &mut egui::Ui) {
        let count = self.session.question_count();
        let notice = self.session.status().map(str::to_owned);
        let mut start = false;
        centered_card(ui, |ui| {
            ui.heading(egui::RichText::new("Guess the Car Price").size(28.0).strong());
            ui.label(format!(
                "{count} cars, one price each. Pick the one you think is right."
            ));
            if let Some(notice) = &notice {
                ui.colored_label(ui.visuals().warn_fg_color, notice);
            }
            let button = egui::Button::new(egui::RichText::new("Start").size(18.0))
                .min_size(egui::vec2(160.0, OPTION_BUTTON_HEIGHT));
            if ui.add(button).clicked() {
                start = true;
            }
        });
        if start {
            self.start_game();
        }
    }

    pub(super) fn show_game_screen(&mut self, ui: &mut egui::Ui) {
        let (question, chosen) = match &self.pending_advance {
            Some(pending) => (pending.question.clone(), Some(pending.chosen)),
            None => match self.session.current_question() {
                Some(question) => (question.clone(), None),
                None => return,
            },
        };

        let mut picked: Option<OptionId> = None;
        centered_card(ui, |ui| {
            self.show_car_image(ui, question.car_id);
            ui.heading(egui::RichText::new(&question.car_name).size(24.0).strong());
            picked = option_buttons(ui, &question, chosen);
        });
        if let Some(option_id) = picked {
            self.choose_option(option_id, Instant::now());
        }
    }

    fn show_car_image(&self, ui: &mut egui::Ui, car_id: CarId) {
        match self.car_images.get(&car_id) {
            Some(CarImageState::Ready {
                texture: Some(texture),
                ..
            }) => {
                let max = egui::vec2(ui.available_width(), IMAGE_MAX_HEIGHT);
                let mut size = texture.size_vec2();
                let scale = (max.x / size.x).min(max.y / size.y).min(1.0);
                size *= scale;
                ui.add(egui::Image::new(texture).fit_to_exact_size(size));
            }
            Some(CarImageState::Failed(_)) => {
                ui.weak("Image unavailable");
            }
            _ => {
                ui.spinner();
            }
        }
    }

    pub(super) fn show_result_screen(&mut self, ui: &mut egui::Ui) {
        let Some(result) = self.session.result().cloned() else {
            return;
        };
        let mut restart = false;
        centered_card(ui, |ui| {
            ui.heading("Your score");
            ui.label(
                egui::RichText::new(format!("{} / {}", result.score, result.max_score))
                    .size(40.0)
                    .strong(),
            );
            ui.label(&result.message);
            let button = egui::Button::new(egui::RichText::new("Play again").size(18.0))
                .min_size(egui::vec2(160.0, OPTION_BUTTON_HEIGHT));
            if ui.add(button).clicked() {
                restart = true;
            }
        });
        if restart {
            self.start_game();
        }
    }

    pub(super) fn show_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(err) = self.error_dialog.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(err_label(err.category()))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(err.headline());
                ui.collapsing("Details", |ui| {
                    ui.weak(err.message());
                });
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.error_dialog = None;
        }
    }
}

fn option_buttons(ui: &mut egui::Ui, question: &Question, chosen: Option<OptionId>) -> Option<OptionId> {
    let mut picked = None;
    let width = ui.available_width();
    for option in &question.options {
        let selected = chosen == Some(option.id);
        let button = egui::Button::new(egui::RichText::new(format_price(option.price)).size(18.0))
            .min_size(egui::vec2(width, OPTION_BUTTON_HEIGHT))
            .selected(selected);
        let response = ui.add_enabled(chosen.is_none() || selected, button);
        if response.clicked() {
            picked = Some(option.id);
        }
    }
    picked
}
