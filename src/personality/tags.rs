//! Tag vocabulary and the axis/questionnaire → tag tables.

use std::collections::BTreeSet;

use super::axes::{Answer, Letter, PersonalityCode};

/// Ordered, de-duplicated set of tags.
pub type TagSet = BTreeSet<String>;

/// Every tag a profile or program may carry.
pub const TAG_VOCABULARY: [&str; 17] = [
    "외향적", "사회적", "내향적", "정적인", "현실적", "체험형", "창의적", "예술적", "분석적",
    "논리적", "감성적", "교류형", "구조적", "조직적", "자유로운", "유동적", "활동적",
];

/// The two base tags implied by one resolved letter.
pub fn letter_tags(letter: Letter) -> [&'static str; 2] {
    match letter {
        Letter::E => ["외향적", "사회적"],
        Letter::I => ["내향적", "정적인"],
        Letter::S => ["현실적", "체험형"],
        Letter::N => ["창의적", "예술적"],
        Letter::T => ["분석적", "논리적"],
        Letter::F => ["감성적", "교류형"],
        Letter::J => ["구조적", "조직적"],
        Letter::P => ["자유로운", "유동적"],
    }
}

/// Base tags for a full code: two per axis.
pub fn base_tags(code: &PersonalityCode) -> TagSet {
    code.letters()
        .into_iter()
        .flat_map(letter_tags)
        .map(str::to_string)
        .collect()
}

/// Supplemental tags from answers 11–13: exercise, solitary, quiet.
pub fn supplemental_tags(exercise: Answer, solitary: Answer, quiet: Answer) -> TagSet {
    let pick = |answer: Answer, yes: &str, no: &str| match answer {
        Answer::A => yes.to_string(),
        Answer::B => no.to_string(),
    };
    [
        pick(exercise, "활동적", "정적인"),
        pick(solitary, "내향적", "외향적"),
        pick(quiet, "정적인", "활동적"),
    ]
    .into_iter()
    .collect()
}

pub fn is_known_tag(tag: &str) -> bool {
    TAG_VOCABULARY.contains(&tag)
}

/// Parse a comma-separated tag list, dropping blanks.
pub fn parse_tag_list(raw: &str) -> TagSet {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_tag_list`].
pub fn join_tags(tags: &TagSet) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_tags_cover_every_axis() {
        let code: PersonalityCode = "ISFP".parse().unwrap();
        let tags = base_tags(&code);
        let expected: TagSet = ["내향적", "정적인", "현실적", "체험형", "감성적", "교류형", "자유로운", "유동적"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn supplemental_tags_deduplicate() {
        // "not exercise" and "quiet" both yield 정적인.
        let tags = supplemental_tags(Answer::B, Answer::A, Answer::A);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("정적인"));
        assert!(tags.contains("내향적"));
    }

    #[test]
    fn tag_list_round_trip_skips_blanks() {
        let tags = parse_tag_list(" 외향적, ,사회적,외향적 ");
        assert_eq!(tags.len(), 2);
        assert_eq!(join_tags(&tags), "사회적,외향적");
    }

    #[test]
    fn vocabulary_contains_every_table_tag() {
        for letter in [
            Letter::E,
            Letter::I,
            Letter::S,
            Letter::N,
            Letter::T,
            Letter::F,
            Letter::J,
            Letter::P,
        ] {
            for tag in letter_tags(letter) {
                assert!(is_known_tag(tag), "{tag} missing from vocabulary");
            }
        }
        assert!(is_known_tag("활동적"));
        assert!(!is_known_tag("수영"));
    }
}
