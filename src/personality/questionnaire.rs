//! The fixed 13-question onboarding questionnaire.

use serde::Serialize;

use super::axes::{Answer, Letter};

/// Number of answers a complete questionnaire submission carries.
pub const QUESTION_COUNT: usize = 13;

/// Number of leading questions that vote on an axis.
pub const AXIS_QUESTION_COUNT: usize = 10;

/// A question as served to clients.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: u8,
    pub question: &'static str,
    pub choices: [&'static str; 2],
}

pub const QUESTIONS: [Question; QUESTION_COUNT] = [
    q(1, "손주가 예고 없이 찾아오면?", "(A) 반갑다", "(B) 미리 연락이 좋다"),
    q(2, "새로운 기술을 배울 때?", "(A) 직접 시도", "(B) 도움 요청"),
    q(3, "혼자 VS 함께?", "(A) 혼자가 좋다", "(B) 사람들과 함께"),
    q(4, "계획형 VS 즉흥형?", "(A) 미리 계획", "(B) 즉흥 결정"),
    q(5, "새로운 장소 vs 익숙한 장소?", "(A) 익숙한 곳", "(B) 새로운 곳"),
    q(6, "결정할 때?", "(A) 신중하게", "(B) 직감으로"),
    q(7, "사회적 활동?", "(A) 참여한다", "(B) 혼자가 좋다"),
    q(8, "변화를 좋아하는가?", "(A) 변화를 좋아함", "(B) 안정이 좋다"),
    q(9, "여가 시간?", "(A) 새로운 도전", "(B) 익숙한 활동"),
    q(10, "스트레스 해소법?", "(A) 대화", "(B) 혼자 해결"),
    q(11, "운동을 선호하시나요?", "(A) 예", "(B) 아니요"),
    q(12, "혼자 활동을 좋아하시나요?", "(A) 예", "(B) 아니요"),
    q(13, "조용한 활동을 선호하시나요?", "(A) 예", "(B) 아니요"),
];

const fn q(id: u8, question: &'static str, a: &'static str, b: &'static str) -> Question {
    Question {
        id,
        question,
        choices: [a, b],
    }
}

/// Letter voted for by each of the first ten positions: `(on A, on B)`.
const POSITION_LETTERS: [(Letter, Letter); AXIS_QUESTION_COUNT] = [
    (Letter::E, Letter::I),
    (Letter::S, Letter::N),
    (Letter::I, Letter::E),
    (Letter::J, Letter::P),
    (Letter::S, Letter::N),
    (Letter::T, Letter::F),
    (Letter::E, Letter::I),
    (Letter::F, Letter::T),
    (Letter::N, Letter::S),
    (Letter::P, Letter::J),
];

/// Letter voted for by `answer` at zero-based `position` (< 10).
pub fn letter_for(position: usize, answer: Answer) -> Letter {
    let (on_a, on_b) = POSITION_LETTERS[position];
    match answer {
        Answer::A => on_a,
        Answer::B => on_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::axes::Axis;

    #[test]
    fn question_ids_are_sequential() {
        for (i, question) in QUESTIONS.iter().enumerate() {
            assert_eq!(question.id as usize, i + 1);
        }
    }

    #[test]
    fn each_position_votes_within_one_axis() {
        for (a, b) in POSITION_LETTERS {
            assert_eq!(a.axis(), b.axis());
            assert_ne!(a, b);
        }
    }

    #[test]
    fn axis_question_counts() {
        let count = |axis: Axis| {
            POSITION_LETTERS
                .iter()
                .filter(|(a, _)| a.axis() == axis)
                .count()
        };
        assert_eq!(count(Axis::Ei), 3);
        assert_eq!(count(Axis::Sn), 3);
        assert_eq!(count(Axis::Tf), 2);
        assert_eq!(count(Axis::Jp), 2);
    }
}
