//! Screen state machine for one player's quiz session.
//!
//! The session walks a linear index over the loaded questions. Every
//! selection appends exactly one guess for the current car, so a finished
//! round always carries one guess per question, in question order.

use shared::domain::{CarId, GameResult, Guess, OptionId, Question};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Welcome,
    Game,
    Result,
}

/// What the front end has to do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Render `current_question()`.
    Question,
    /// The round is over; send these guesses to the backend.
    Submit(Vec<Guess>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("questions have not been loaded yet")]
    NotReady,
    #[error("no question is waiting for an answer")]
    NotPlaying,
    #[error("option {option_id} is not offered for car {car_id}")]
    UnknownOption { car_id: CarId, option_id: OptionId },
}

#[derive(Debug, Clone)]
pub struct GameSession {
    questions: Vec<Question>,
    loaded: bool,
    current_index: usize,
    guesses: Vec<Guess>,
    screen: Screen,
    result: Option<GameResult>,
    status: Option<String>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            loaded: false,
            current_index: 0,
            guesses: Vec::new(),
            screen: Screen::Loading,
            result: None,
            status: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Last error or notice to show the player, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn questions_loaded(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.loaded = true;
        self.status = None;
        self.screen = Screen::Welcome;
    }

    pub fn load_failed(&mut self, message: impl Into<String>) {
        self.status = Some(format!("Error: {}", message.into()));
        self.screen = Screen::Loading;
    }

    /// Clears a failed load so the loading screen waits on a fresh fetch.
    /// Returns false when there was no failed load to retry.
    pub fn retry_load(&mut self) -> bool {
        if self.screen != Screen::Loading || self.status.is_none() {
            return false;
        }
        self.status = None;
        true
    }

    /// Starts (or restarts) a round from the first question.
    pub fn start(&mut self) -> Result<Step, GameError> {
        if !self.loaded || self.screen == Screen::Loading {
            return Err(GameError::NotReady);
        }
        self.current_index = 0;
        self.guesses.clear();
        self.result = None;
        self.status = None;
        self.screen = Screen::Game;
        Ok(self.next_step())
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.screen != Screen::Game {
            return None;
        }
        self.questions.get(self.current_index)
    }

    pub fn select_option(&mut self, option_id: OptionId) -> Result<Step, GameError> {
        let question = self.current_question().ok_or(GameError::NotPlaying)?;
        if question.option(option_id).is_none() {
            return Err(GameError::UnknownOption {
                car_id: question.car_id,
                option_id,
            });
        }
        let guess = Guess {
            car_id: question.car_id,
            selected_option_id: option_id,
        };
        self.guesses.push(guess);
        self.current_index += 1;
        Ok(self.next_step())
    }

    pub fn result_received(&mut self, result: GameResult) {
        self.result = Some(result);
        self.status = None;
        self.screen = Screen::Result;
    }

    pub fn submit_failed(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.screen = Screen::Welcome;
    }

    /// Share of answered questions, 0.0 to 100.0.
    pub fn progress_percent(&self) -> f32 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.current_index as f32 / self.questions.len() as f32 * 100.0
    }

    pub fn shows_progress(&self) -> bool {
        self.screen == Screen::Game
    }

    fn next_step(&mut self) -> Step {
        if self.current_index >= self.questions.len() {
            self.screen = Screen::Loading;
            return Step::Submit(self.guesses.clone());
        }
        Step::Question
    }
}

/// Formats a whole-dollar price the way en-US currency formatting does, without cents.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}

#[cfg(test)]
#[path = "tests/game_tests.rs"]
mod tests;
