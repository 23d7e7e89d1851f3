// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;
pub const MIN_TIME_LIMIT: u32 = 5;
pub const MAX_TIME_LIMIT: u32 = 120;
pub const DEFAULT_TIME_LIMIT: u32 = 15;

const MAX_QUESTION_TEXT: usize = 1000;
const MAX_OPTION_TEXT: usize = 500;

/// Represents the 'quizzes' table. Questions are stored as a JSONB array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
    pub id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, index: i32) -> Option<&Question> {
        usize::try_from(index).ok().and_then(|i| self.questions.get(i))
    }
}

/// A single quiz question. The answer format lives in `kind`, serialized
/// inline with a `type` discriminator (`multiple-choice` / `text-input`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    #[serde(default)]
    pub text: String,

    /// Seconds students get to answer.
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,

    #[serde(flatten)]
    pub kind: QuestionKind,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<AnswerOption>,
    },
    TextInput {
        #[serde(default)]
        correct_answer: String,
    },
}

/// Discriminant of [`QuestionKind`] without its payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TextInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerOption {
    pub id: Uuid,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl AnswerOption {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_correct,
        }
    }
}

/// One editor action on a question, as sent by the quiz editor.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    SetText { text: String },
    SetKind { kind: QuestionType },
    SetTimeLimit { seconds: u32 },
    AddOption,
    RemoveOption { index: usize },
    UpdateOption { index: usize, text: String },
    SetCorrectOption { option_id: Uuid },
    SetCorrectAnswer { text: String },
}

impl Question {
    /// Blank multiple-choice question with two empty options, the first one correct.
    pub fn new_multiple_choice() -> Self {
        Self {
            id: Uuid::new_v4(),
            text: String::new(),
            time_limit: DEFAULT_TIME_LIMIT,
            kind: QuestionKind::MultipleChoice {
                options: seed_options(),
            },
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::TextInput { .. } => QuestionType::TextInput,
        }
    }

    /// Options of a multiple-choice question; empty for text input.
    pub fn options(&self) -> &[AnswerOption] {
        match &self.kind {
            QuestionKind::MultipleChoice { options } => options,
            QuestionKind::TextInput { .. } => &[],
        }
    }

    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options().iter().find(|o| o.is_correct)
    }

    pub fn apply(&mut self, op: EditOp) -> bool {
        match op {
            EditOp::SetText { text } => self.set_text(text),
            EditOp::SetKind { kind } => self.set_kind(kind),
            EditOp::SetTimeLimit { seconds } => self.set_time_limit(seconds),
            EditOp::AddOption => self.add_option(),
            EditOp::RemoveOption { index } => self.remove_option(index),
            EditOp::UpdateOption { index, text } => self.update_option_text(index, text),
            EditOp::SetCorrectOption { option_id } => self.set_correct_option(option_id),
            EditOp::SetCorrectAnswer { text } => self.set_correct_answer(text),
        }
    }

    pub fn set_text(&mut self, text: String) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text;
        true
    }

    /// Clamped to the allowed range.
    pub fn set_time_limit(&mut self, seconds: u32) -> bool {
        let seconds = seconds.clamp(MIN_TIME_LIMIT, MAX_TIME_LIMIT);
        if self.time_limit == seconds {
            return false;
        }
        self.time_limit = seconds;
        true
    }

    pub fn set_kind(&mut self, kind: QuestionType) -> bool {
        if self.question_type() == kind {
            return false;
        }
        self.kind = match kind {
            QuestionType::MultipleChoice => QuestionKind::MultipleChoice {
                options: seed_options(),
            },
            QuestionType::TextInput => QuestionKind::TextInput {
                correct_answer: String::new(),
            },
        };
        true
    }

    /// No-op once the question already has the maximum number of options.
    pub fn add_option(&mut self) -> bool {
        let QuestionKind::MultipleChoice { options } = &mut self.kind else {
            return false;
        };
        if options.len() >= MAX_OPTIONS {
            return false;
        }
        options.push(AnswerOption::new("", false));
        true
    }

    /// No-op at the minimum option count. When the correct option is removed,
    /// the first remaining option becomes correct.
    pub fn remove_option(&mut self, index: usize) -> bool {
        let QuestionKind::MultipleChoice { options } = &mut self.kind else {
            return false;
        };
        if options.len() <= MIN_OPTIONS || index >= options.len() {
            return false;
        }
        options.remove(index);
        if !options.iter().any(|o| o.is_correct) {
            options[0].is_correct = true;
        }
        true
    }

    pub fn update_option_text(&mut self, index: usize, text: String) -> bool {
        let QuestionKind::MultipleChoice { options } = &mut self.kind else {
            return false;
        };
        match options.get_mut(index) {
            Some(option) if option.text != text => {
                option.text = text;
                true
            }
            _ => false,
        }
    }

    /// Marks exactly one option correct. Unknown ids leave the question untouched.
    pub fn set_correct_option(&mut self, option_id: Uuid) -> bool {
        let QuestionKind::MultipleChoice { options } = &mut self.kind else {
            return false;
        };
        if !options.iter().any(|o| o.id == option_id) {
            return false;
        }
        let mut changed = false;
        for option in options.iter_mut() {
            let is_correct = option.id == option_id;
            changed |= option.is_correct != is_correct;
            option.is_correct = is_correct;
        }
        changed
    }

    pub fn set_correct_answer(&mut self, text: String) -> bool {
        match &mut self.kind {
            QuestionKind::TextInput { correct_answer } if *correct_answer != text => {
                *correct_answer = text;
                true
            }
            _ => false,
        }
    }

    /// Checks option bounds, the single-correct-option rule and text limits.
    pub fn check(&self) -> Result<(), ValidationError> {
        if !(MIN_TIME_LIMIT..=MAX_TIME_LIMIT).contains(&self.time_limit) {
            return Err(ValidationError::new("time_limit_out_of_range"));
        }
        if self.text.chars().count() > MAX_QUESTION_TEXT {
            return Err(ValidationError::new("question_text_too_long"));
        }
        match &self.kind {
            QuestionKind::MultipleChoice { options } => {
                if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
                    return Err(ValidationError::new("option_count_out_of_range"));
                }
                if options.iter().filter(|o| o.is_correct).count() != 1 {
                    return Err(ValidationError::new("exactly_one_correct_option"));
                }
                if options.iter().any(|o| o.text.chars().count() > MAX_OPTION_TEXT) {
                    return Err(ValidationError::new("option_too_long"));
                }
            }
            QuestionKind::TextInput { correct_answer } => {
                if correct_answer.chars().count() > MAX_OPTION_TEXT {
                    return Err(ValidationError::new("correct_answer_too_long"));
                }
            }
        }
        Ok(())
    }
}

fn seed_options() -> Vec<AnswerOption> {
    vec![AnswerOption::new("", true), AnswerOption::new("", false)]
}

fn validate_questions(questions: &[Question]) -> Result<(), ValidationError> {
    questions.iter().try_for_each(Question::check)
}

/// DTO for creating or replacing a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct QuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<Question>,
}

/// DTO for appending a question. Without a body a blank multiple-choice question is added.
#[derive(Debug, Default, Deserialize)]
pub struct AddQuestionRequest {
    pub question: Option<Question>,
}

/// Question as shown to students: no correctness data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicQuestion {
    pub index: i32,
    pub id: Uuid,
    pub text: String,
    pub time_limit: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<PublicOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicOption {
    pub id: Uuid,
    pub text: String,
}

impl PublicQuestion {
    pub fn from_question(index: i32, question: &Question) -> Self {
        Self {
            index,
            id: question.id,
            text: question.text.clone(),
            time_limit: question.time_limit,
            question_type: question.question_type(),
            options: question
                .options()
                .iter()
                .map(|o| PublicOption {
                    id: o.id,
                    text: o.text.clone(),
                })
                .collect(),
        }
    }
}
