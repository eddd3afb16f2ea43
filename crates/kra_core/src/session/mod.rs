use serde::{Deserialize, Serialize};

/// One question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnMemory {
    pub question: String,
    pub answer: String,
}

/// Short-term conversation memory fed back to the planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    pub turns: Vec<TurnMemory>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(TurnMemory {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// Render the last `max_turns` turns, numbered from 1 within the window.
    pub fn build_history_context(&self, max_turns: usize) -> String {
        if self.turns.is_empty() || max_turns == 0 {
            return String::new();
        }
        let start = self.turns.len().saturating_sub(max_turns);
        self.turns[start..]
            .iter()
            .enumerate()
            .map(|(i, t)| format!("[Turn {}]\nQ: {}\nA: {}\n", i + 1, t.question, t.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
