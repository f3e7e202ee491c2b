//! Questionnaire → personality code and tags.

use std::collections::HashMap;

use super::axes::{Answer, Axis, Letter, PersonalityCode};
use super::questionnaire::{AXIS_QUESTION_COUNT, QUESTION_COUNT, letter_for};
use super::tags::{TagSet, base_tags, supplemental_tags};
use crate::error::{Error, Result};

/// Outcome of scoring one questionnaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredProfile {
    pub code: PersonalityCode,
    /// Base ∪ supplemental tags.
    pub tags: TagSet,
    /// Supplemental tags alone, kept so drift can recombine later.
    pub onboarding_tags: TagSet,
}

/// Score exactly 13 answers.
///
/// Pure: the same answers always produce the same result.
pub fn score(answers: &[Answer]) -> Result<ScoredProfile> {
    if answers.len() != QUESTION_COUNT {
        return Err(Error::Validation(format!(
            "exactly {QUESTION_COUNT} answers are required, got {}",
            answers.len()
        )));
    }
    let (axis_answers, onboarding) = answers.split_at(AXIS_QUESTION_COUNT);

    let mut counts: HashMap<Letter, u32> = HashMap::new();
    for (position, answer) in axis_answers.iter().enumerate() {
        *counts.entry(letter_for(position, *answer)).or_default() += 1;
    }

    let resolve = |axis: Axis| {
        let (left, right) = axis.letters();
        let tally = |l: Letter| counts.get(&l).copied().unwrap_or(0);
        if tally(left) >= tally(right) { left } else { right }
    };
    let code = PersonalityCode::new(
        resolve(Axis::Ei),
        resolve(Axis::Sn),
        resolve(Axis::Tf),
        resolve(Axis::Jp),
    )?;

    let onboarding_tags = supplemental_tags(onboarding[0], onboarding[1], onboarding[2]);
    let mut tags = base_tags(&code);
    tags.extend(onboarding_tags.iter().cloned());

    Ok(ScoredProfile {
        code,
        tags,
        onboarding_tags,
    })
}
