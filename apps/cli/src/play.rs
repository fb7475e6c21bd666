//! Line-oriented rendition of the four game screens.

use std::{
    io::{BufRead, Write},
    time::Duration,
};

use anyhow::{Context, Result};
use client_core::{format_price, GameSession, QuizClient, Step};
use shared::domain::{GameResult, Question};

const PROGRESS_WIDTH: usize = 20;

enum Input {
    Line(String),
    Eof,
}

pub struct TerminalGame<R, W> {
    input: R,
    output: W,
    advance_delay: Duration,
}

impl<R: BufRead, W: Write> TerminalGame<R, W> {
    pub fn new(input: R, output: W, advance_delay: Duration) -> Self {
        Self {
            input,
            output,
            advance_delay,
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }

    /// Plays until the player quits. Returns the last result shown, if any.
    pub async fn run(&mut self, client: &QuizClient) -> Result<Option<GameResult>> {
        let mut session = GameSession::new();
        writeln!(self.output, "Loading questions...")?;
        if let Err(err) = client.load_into(&mut session).await {
            writeln!(self.output, "Failed to load game: {err:#}")?;
            return Err(err);
        }

        let mut last_result = None;
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "=== Guess the Car Price ===")?;
            if let Some(status) = session.status() {
                writeln!(self.output, "! {status}")?;
            }
            writeln!(
                self.output,
                "{} cars are waiting. Press Enter to start, or q to quit.",
                session.question_count()
            )?;
            match self.read_line()? {
                Input::Eof => return Ok(last_result),
                Input::Line(line) if is_quit(&line) => return Ok(last_result),
                Input::Line(_) => {}
            }

            let Some(guesses) = self.play_round(&mut session).await? else {
                return Ok(last_result);
            };

            writeln!(self.output, "Submitting guesses...")?;
            match client.submit_from(&mut session, guesses).await {
                Ok(result) => {
                    self.show_result(&result)?;
                    last_result = Some(result);
                    writeln!(self.output, "Play again? [y/N]")?;
                    match self.read_line()? {
                        Input::Line(line) if line.eq_ignore_ascii_case("y") => {}
                        _ => return Ok(last_result),
                    }
                }
                Err(err) => {
                    writeln!(self.output, "Error submitting results: {err:#}")?;
                }
            }
        }
    }

    /// Returns the finished round's guesses, or `None` if the player quit.
    async fn play_round(
        &mut self,
        session: &mut GameSession,
    ) -> Result<Option<Vec<shared::domain::Guess>>> {
        let mut step = session.start().context("failed to start round")?;
        loop {
            let question = match step {
                Step::Submit(guesses) => return Ok(Some(guesses)),
                Step::Question => match session.current_question() {
                    Some(question) => question.clone(),
                    None => return Ok(None),
                },
            };
            self.render_question(session, &question)?;

            let option_id = loop {
                let line = match self.read_line()? {
                    Input::Eof => return Ok(None),
                    Input::Line(line) if is_quit(&line) => return Ok(None),
                    Input::Line(line) => line,
                };
                match line.parse::<usize>() {
                    Ok(n) if (1..=question.options.len()).contains(&n) => {
                        break question.options[n - 1].id;
                    }
                    _ => writeln!(
                        self.output,
                        "Pick a number between 1 and {}.",
                        question.options.len()
                    )?,
                }
            };

            step = session.select_option(option_id)?;
            if !self.advance_delay.is_zero() {
                tokio::time::sleep(self.advance_delay).await;
            }
        }
    }

    fn render_question(&mut self, session: &GameSession, question: &Question) -> Result<()> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{} {}/{}",
            progress_bar(session.progress_percent(), PROGRESS_WIDTH),
            session.current_index() + 1,
            session.question_count()
        )?;
        writeln!(self.output, "{}", question.car_name)?;
        writeln!(self.output, "  {}", question.car_image)?;
        for (n, option) in question.options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", n + 1, format_price(option.price))?;
        }
        write!(self.output, "Your guess: ")?;
        self.output.flush()?;
        Ok(())
    }

    fn show_result(&mut self, result: &GameResult) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Score: {} / {}", result.score, result.max_score)?;
        writeln!(self.output, "{}", result.message)?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Input> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            return Ok(Input::Eof);
        }
        Ok(Input::Line(line.trim().to_string()))
    }
}

fn is_quit(line: &str) -> bool {
    line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit")
}

pub fn progress_bar(percent: f32, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, sync::Arc};

    use client_core::{MissingQuizBackend, MockQuizBackend};

    use super::*;

    async fn play(script: &str, client: &QuizClient) -> (Result<Option<GameResult>>, String) {
        let mut game = TerminalGame::new(Cursor::new(script.to_string()), Vec::new(), Duration::ZERO);
        let outcome = game.run(client).await;
        let output = String::from_utf8(game.into_output()).expect("utf8");
        (outcome, output)
    }

    fn mock_client() -> QuizClient {
        QuizClient::new(Arc::new(MockQuizBackend::default()))
    }

    #[tokio::test]
    async fn plays_full_round_against_mock() {
        let (outcome, output) = play("\n2\n2\n1\n2\nn\n", &mock_client()).await;
        let result = outcome.expect("run").expect("result");
        assert_eq!(result.score, 3);
        assert!(output.contains("Tesla Model 3"));
        assert!(output.contains("1) $35,000"));
        assert!(output.contains("Score: 3 / 4"));
        assert!(output.contains("You got 3 out of 4 correct!"));
    }

    #[tokio::test]
    async fn invalid_choice_prompts_again() {
        let (outcome, output) = play("\n7\nabc\n2\nq\n", &mock_client()).await;
        assert!(outcome.expect("run").is_none());
        assert_eq!(output.matches("Pick a number between 1 and 3.").count(), 2);
        assert!(output.contains("Ford Mustang"));
    }

    #[tokio::test]
    async fn replay_starts_from_first_car_again() {
        let (outcome, output) = play("\n1\n1\n1\n1\ny\n\n2\n2\n2\n2\n\n", &mock_client()).await;
        let result = outcome.expect("run").expect("result");
        assert_eq!(result.score, 4);
        assert_eq!(output.matches("Tesla Model 3").count(), 2);
        assert!(output.contains("You got 0 out of 4 correct!"));
    }

    #[tokio::test]
    async fn load_failure_is_reported() {
        let client = QuizClient::new(Arc::new(MissingQuizBackend));
        let (outcome, output) = play("\n", &client).await;
        assert!(outcome.is_err());
        assert!(output.contains("Failed to load game: remote client is unavailable"));
    }

    #[test]
    fn renders_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[----]   0%");
        assert_eq!(progress_bar(50.0, 4), "[##--]  50%");
        assert_eq!(progress_bar(100.0, 4), "[####] 100%");
    }
}
