//! Backend commands queued from UI to backend worker.

use shared::domain::{CarId, Guess};

pub enum BackendCommand {
    LoadQuestions,
    SubmitGuesses { guesses: Vec<Guess> },
    FetchCarImage { car_id: CarId, url: String },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadQuestions => "load_questions",
            BackendCommand::SubmitGuesses { .. } => "submit_guesses",
            BackendCommand::FetchCarImage { .. } => "fetch_car_image",
        }
    }
}
