//! Offline backend with a fixed catalogue and a local answer key.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{CarId, GameResult, Guess, OptionId, PriceOption, Question};

use crate::QuizBackend;

pub struct MockQuizBackend {
    questions: Vec<Question>,
    answer_key: HashMap<CarId, OptionId>,
}

impl Default for MockQuizBackend {
    fn default() -> Self {
        let questions = sample_questions();
        let answer_key = questions
            .iter()
            .map(|question| (question.car_id, OptionId(2)))
            .collect();
        Self::new(questions, answer_key)
    }
}

impl MockQuizBackend {
    pub fn new(questions: Vec<Question>, answer_key: HashMap<CarId, OptionId>) -> Self {
        Self {
            questions,
            answer_key,
        }
    }
}

#[async_trait]
impl QuizBackend for MockQuizBackend {
    async fn get_questions(&self) -> Result<Vec<Question>> {
        Ok(self.questions.clone())
    }

    async fn submit_guesses(&self, guesses: Vec<Guess>) -> Result<GameResult> {
        Ok(score_guesses(&self.answer_key, self.questions.len(), &guesses))
    }

    fn label(&self) -> String {
        "mock".to_string()
    }
}

pub fn score_guesses(
    answer_key: &HashMap<CarId, OptionId>,
    max_score: usize,
    guesses: &[Guess],
) -> GameResult {
    let score = guesses
        .iter()
        .filter(|guess| answer_key.get(&guess.car_id) == Some(&guess.selected_option_id))
        .count() as u64;
    let max_score = max_score as u64;
    GameResult {
        score,
        max_score,
        message: format!("You got {score} out of {max_score} correct!"),
    }
}

fn car(id: u64, name: &str, image: &str, prices: [u64; 3]) -> Question {
    Question {
        car_id: CarId(id),
        car_name: name.to_string(),
        car_image: image.to_string(),
        options: prices
            .iter()
            .zip(1u64..)
            .map(|(&price, option_id)| PriceOption {
                id: OptionId(option_id),
                price,
            })
            .collect(),
    }
}

pub fn sample_questions() -> Vec<Question> {
    vec![
        car(
            1,
            "Tesla Model 3",
            "https://images.unsplash.com/photo-1560958089-b8a1929cea89?w=800",
            [35_000, 40_000, 45_000],
        ),
        car(
            2,
            "Ford Mustang",
            "https://images.unsplash.com/photo-1584345604476-8ec5f5d3e0c0?w=800",
            [25_000, 30_000, 35_000],
        ),
        car(
            3,
            "Porsche 911",
            "https://images.unsplash.com/photo-1503376780353-7e6692767b70?w=800",
            [90_000, 100_000, 110_000],
        ),
        car(
            4,
            "Toyota Corolla",
            "https://images.unsplash.com/photo-1621007947382-bb3c3994e3fb?w=800",
            [18_000, 20_000, 22_000],
        ),
    ]
}
