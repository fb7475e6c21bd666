use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use client_core::{GameSession, Screen, Step};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::domain::{CarId, OptionId, Question};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::{dispatch_backend_command, DispatchError};
use crate::ui::images::PreviewImage;

/// A selection that has been recorded but whose question stays on screen until `due`.
pub(super) struct PendingAdvance {
    pub(super) question: Question,
    pub(super) chosen: OptionId,
    pub(super) step: Step,
    pub(super) due: Instant,
}

pub(super) enum CarImageState {
    Loading,
    Ready {
        image: PreviewImage,
        texture: Option<TextureHandle>,
    },
    Failed(String),
}

pub struct CarQuizApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    pub(super) session: GameSession,
    advance_delay: Duration,
    pub(super) pending_advance: Option<PendingAdvance>,
    pub(super) car_images: HashMap<CarId, CarImageState>,

    /// Bottom status line.
    pub(super) status: String,
    pub(super) error_dialog: Option<UiError>,
    backend_disconnected: bool,
}

impl CarQuizApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        advance_delay: Duration,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            session: GameSession::new(),
            advance_delay,
            pending_advance: None,
            car_images: HashMap::new(),
            status: "Loading questions...".to_string(),
            error_dialog: None,
            backend_disconnected: false,
        };
        app.request_questions();
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) -> bool {
        match dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            Ok(()) => true,
            Err(DispatchError::Disconnected) => {
                self.backend_disconnected = true;
                false
            }
            Err(DispatchError::QueueFull) => false,
        }
    }

    fn request_questions(&mut self) -> bool {
        self.status = "Loading questions...".to_string();
        self.dispatch(BackendCommand::LoadQuestions)
    }

    /// Whether the worker can still take a retried load.
    pub(super) fn can_retry(&self) -> bool {
        !self.backend_disconnected
    }

    pub(super) fn retry_loading(&mut self) {
        if !self.can_retry() {
            return;
        }
        if self.request_questions() {
            self.session.retry_load();
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
            }
            UiEvent::QuestionsLoaded(questions) => {
                for question in &questions {
                    if self.car_images.contains_key(&question.car_id) {
                        continue;
                    }
                    let queued = self.dispatch(BackendCommand::FetchCarImage {
                        car_id: question.car_id,
                        url: question.car_image.clone(),
                    });
                    if queued {
                        self.car_images
                            .insert(question.car_id, CarImageState::Loading);
                    }
                }
                self.status = format!("{} questions loaded", questions.len());
                self.session.questions_loaded(questions);
            }
            UiEvent::ResultReady(result) => {
                self.session.result_received(result);
            }
            UiEvent::CarImageLoaded { car_id, image } => {
                self.car_images.insert(
                    car_id,
                    CarImageState::Ready {
                        image,
                        texture: None,
                    },
                );
            }
            UiEvent::CarImageFailed { car_id, reason } => {
                tracing::warn!(car_id = car_id.0, "car image unavailable: {reason}");
                self.car_images.insert(car_id, CarImageState::Failed(reason));
            }
            UiEvent::Error(err) => {
                match err.context() {
                    UiErrorContext::BackendStartup => {
                        self.backend_disconnected = true;
                        self.session.load_failed(err.message());
                    }
                    UiErrorContext::LoadQuestions => {
                        self.session.load_failed(err.message());
                    }
                    UiErrorContext::SubmitGuesses => {
                        self.session.submit_failed(err.headline());
                    }
                }
                self.status = err.headline();
                self.error_dialog = Some(err);
            }
        }
    }

    pub(super) fn start_game(&mut self) {
        self.pending_advance = None;
        match self.session.start() {
            Ok(step) => self.follow_step(step),
            Err(err) => self.status = err.to_string(),
        }
    }

    pub(super) fn choose_option(&mut self, option_id: OptionId, now: Instant) {
        if self.pending_advance.is_some() {
            return;
        }
        let Some(question) = self.session.current_question().cloned() else {
            return;
        };
        match self.session.select_option(option_id) {
            Ok(step) => {
                self.pending_advance = Some(PendingAdvance {
                    question,
                    chosen: option_id,
                    step,
                    due: now + self.advance_delay,
                });
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    pub(super) fn advance_if_due(&mut self, now: Instant) {
        let due = matches!(&self.pending_advance, Some(pending) if pending.due <= now);
        if !due {
            return;
        }
        if let Some(pending) = self.pending_advance.take() {
            self.follow_step(pending.step);
        }
    }

    fn follow_step(&mut self, step: Step) {
        if let Step::Submit(guesses) = step {
            if !self.dispatch(BackendCommand::SubmitGuesses { guesses }) {
                self.session.submit_failed(self.status.clone());
            }
        }
    }

    /// The screen to draw; a pending selection keeps its question visible.
    pub(super) fn visible_screen(&self) -> Screen {
        if self.pending_advance.is_some() {
            Screen::Game
        } else {
            self.session.screen()
        }
    }

    fn upload_textures(&mut self, ctx: &egui::Context) {
        for (car_id, state) in self.car_images.iter_mut() {
            if let CarImageState::Ready { image, texture } = state {
                if texture.is_none() {
                    let color_image =
                        egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
                    *texture = Some(ctx.load_texture(
                        format!("car_image_{}", car_id.0),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
            }
        }
    }
}

impl eframe::App for CarQuizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.advance_if_due(Instant::now());
        self.upload_textures(ctx);

        let screen = self.visible_screen();
        egui::TopBottomPanel::top("progress_panel").show_animated(
            ctx,
            screen == Screen::Game,
            |ui| self.show_progress(ui),
        );
        egui::TopBottomPanel::bottom("status_line").show(ctx, |ui| self.show_status_line(ui));
        egui::CentralPanel::default().show(ctx, |ui| match screen {
            Screen::Loading => self.show_loading_screen(ui),
            Screen::Welcome => self.show_welcome_screen(ui),
            Screen::Game => self.show_game_screen(ui),
            Screen::Result => self.show_result_screen(ui),
        });
        self.show_error_dialog(ctx);

        if self.pending_advance.is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
