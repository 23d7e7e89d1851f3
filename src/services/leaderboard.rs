// src/services/leaderboard.rs

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{answer::Answer, participant::Participant};

/// One row of the results table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentResult {
    pub participant_id: i64,
    pub student_name: String,
    pub correct: usize,
    pub total: usize,
    pub score: i64,
    pub percentage: u32,
    /// Mean answer time in seconds, one decimal.
    pub avg_time: f64,
    pub answered: usize,
}

/// Builds per-student results and ranks them.
///
/// Participants are expected in join order; that order breaks ties that
/// remain after score and average time.
pub fn build(participants: &[Participant], answers: &[Answer], question_count: usize) -> Vec<StudentResult> {
    let mut results: Vec<StudentResult> = participants
        .iter()
        .map(|p| student_result(p, answers, question_count))
        .collect();
    rank(&mut results);
    results
}

/// Score descending, then average time ascending. The sort is stable.
pub fn rank(results: &mut [StudentResult]) {
    results.sort_by(compare);
}

pub fn compare(a: &StudentResult, b: &StudentResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.avg_time.total_cmp(&b.avg_time))
}

fn student_result(participant: &Participant, answers: &[Answer], total: usize) -> StudentResult {
    let own: Vec<&Answer> = answers
        .iter()
        .filter(|a| a.participant_id == participant.id)
        .collect();

    let correct = own.iter().filter(|a| a.is_correct).count();
    let score = own.iter().map(|a| a.score).sum();
    let time_ms: i64 = own.iter().map(|a| a.time_taken_ms).sum();

    StudentResult {
        participant_id: participant.id,
        student_name: participant.student_name.clone(),
        correct,
        total,
        score,
        percentage: percentage(correct, total),
        avg_time: average_seconds(time_ms, own.len()),
        answered: own.len(),
    }
}

/// Rounded to a whole percent; 0 when there are no questions.
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}

/// Milliseconds total over `count` answers, as seconds with one decimal.
pub fn average_seconds(total_ms: i64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (total_ms as f64 / count as f64 / 1000.0 * 10.0).round() / 10.0
}
