// src/services/tally.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{answer::Answer, participant::Participant, quiz::Question};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionTally {
    pub option_id: Uuid,
    pub text: String,
    pub count: usize,
    pub is_correct: bool,
}

/// Live answer counts for one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionTally {
    pub question_index: i32,
    pub answered: usize,
    pub active_participants: usize,
    /// Empty for text-input questions.
    pub options: Vec<OptionTally>,
}

pub fn tally(
    question_index: i32,
    question: &Question,
    answers: &[Answer],
    participants: &[Participant],
) -> QuestionTally {
    let for_question: Vec<&Answer> = answers
        .iter()
        .filter(|a| a.question_index == question_index)
        .collect();

    let options = question
        .options()
        .iter()
        .map(|option| OptionTally {
            option_id: option.id,
            text: option.text.clone(),
            count: for_question
                .iter()
                .filter(|a| a.answer.selected_option() == Some(option.id))
                .count(),
            is_correct: option.is_correct,
        })
        .collect();

    QuestionTally {
        question_index,
        answered: for_question.len(),
        active_participants: participants.iter().filter(|p| p.is_active).count(),
        options,
    }
}
