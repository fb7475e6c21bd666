//! Runtime bridge between UI command queue and backend event intake.

use std::thread;

use client_core::{download_image, image_client, QuizClient, Settings};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::CarId;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::images::decode_preview_image;

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: Settings) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let startup = settings
                .build_backend()
                .and_then(|backend| Ok((backend, image_client(settings.request_timeout())?)));
            let (backend, http) = match startup {
                Ok(parts) => parts,
                Err(err) => {
                    tracing::error!("backend worker startup failure: {err:#}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err:#}"),
                    )));
                    return;
                }
            };
            let client = QuizClient::new(backend);
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Connected to {}",
                client.backend_label()
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend: handling command");
                match cmd {
                    BackendCommand::LoadQuestions => match client.fetch_questions().await {
                        Ok(questions) => {
                            let _ = ui_tx.try_send(UiEvent::QuestionsLoaded(questions));
                        }
                        Err(err) => {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                UiErrorContext::LoadQuestions,
                                format!("{err:#}"),
                            )));
                        }
                    },
                    BackendCommand::SubmitGuesses { guesses } => {
                        match client.submit_guesses(guesses).await {
                            Ok(result) => {
                                let _ = ui_tx.try_send(UiEvent::ResultReady(result));
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::SubmitGuesses,
                                    format!("{err:#}"),
                                )));
                            }
                        }
                    }
                    BackendCommand::FetchCarImage { car_id, url } => {
                        // Off the command loop so a slow image host never delays quiz calls.
                        let http = http.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let _ = ui_tx.try_send(fetch_car_image(&http, car_id, &url).await);
                        });
                    }
                }
            }
            tracing::info!("backend: command channel closed, worker exiting");
        });
    });
}

async fn fetch_car_image(http: &reqwest::Client, car_id: CarId, url: &str) -> UiEvent {
    match download_image(http, url).await {
        Ok(bytes) => match decode_preview_image(&bytes) {
            Ok(image) => UiEvent::CarImageLoaded { car_id, image },
            Err(reason) => UiEvent::CarImageFailed { car_id, reason },
        },
        Err(err) => {
            tracing::warn!(car_id = car_id.0, "car image download failed: {err:#}");
            UiEvent::CarImageFailed {
                car_id,
                reason: format!("Failed to download image: {err}"),
            }
        }
    }
}
