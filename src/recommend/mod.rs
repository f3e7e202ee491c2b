//! Tag-intersection recommender.
//!
//! A program is a candidate for a profile when the two share at least
//! [`MIN_TAG_OVERLAP`] tags. Candidates keep catalog order; single picks are
//! uniform over candidates using an injectable, seedable random source.

use std::sync::Mutex;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::catalog::model::Program;
use crate::personality::TagSet;

/// Minimum number of shared tags for a program to be a candidate.
pub const MIN_TAG_OVERLAP: usize = 2;

/// Number of tags `program` shares with `tags`.
pub fn overlap(tags: &TagSet, program: &Program) -> usize {
    program.tags.intersection(tags).count()
}

/// Every candidate program, in catalog order.
pub fn candidates<'a>(tags: &TagSet, catalog: &'a [Program]) -> Vec<&'a Program> {
    catalog
        .iter()
        .filter(|program| overlap(tags, program) >= MIN_TAG_OVERLAP)
        .collect()
}

/// All-matches result as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateList {
    pub owner_id: String,
    pub matched_programs: Vec<Program>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl CandidateList {
    pub fn new(owner_id: impl Into<String>, matched: Vec<Program>) -> Self {
        let message = matched.is_empty().then_some("no candidates");
        Self {
            owner_id: owner_id.into(),
            matched_programs: matched,
            message,
        }
    }
}

/// Picks programs for a tag set.
pub struct Recommender {
    rng: Mutex<StdRng>,
}

impl Recommender {
    /// Reproducible picks from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Uniform pick among candidates, `None` when nothing matches.
    pub fn pick<'a>(&self, tags: &TagSet, catalog: &'a [Program]) -> Option<&'a Program> {
        let matched = candidates(tags, catalog);
        self.choose(&matched).copied()
    }

    /// Uniform choice from any slice, sharing the recommender's random source.
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        items.choose(&mut *rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_set(tags: &[&str]) -> TagSet {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn program(id: i64, tags: &[&str]) -> Program {
        Program {
            id,
            name: format!("program{id}"),
            days: Vec::new(),
            start_time: None,
            end_time: None,
            price: 0,
            main_category: "교양".into(),
            sub_category: "실내".into(),
            headcount: "개인".into(),
            tags: tag_set(tags),
            center_id: 1,
        }
    }

    #[test]
    fn single_pick_prefers_only_candidate() {
        let user = tag_set(&["외향적", "사회적", "활동적"]);
        let catalog = vec![program(1, &["외향적", "사회적"]), program(2, &["외향적"])];

        for seed in 0..50 {
            let recommender = Recommender::seeded(seed);
            assert_eq!(recommender.pick(&user, &catalog).map(|p| p.id), Some(1));
        }
    }

    #[test]
    fn candidates_are_exactly_overlap_two_or_more() {
        let user = tag_set(&["외향적", "사회적", "창의적"]);
        let catalog = vec![
            program(1, &["외향적", "사회적", "창의적"]),
            program(2, &["내향적", "정적인"]),
            program(3, &["창의적", "외향적", "정적인"]),
            program(4, &[]),
            program(5, &["사회적"]),
        ];
        let ids: Vec<i64> = candidates(&user, &catalog).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn pick_is_always_a_candidate_and_seed_is_reproducible() {
        let user = tag_set(&["외향적", "사회적", "창의적", "예술적"]);
        let catalog: Vec<Program> = (1..=6)
            .map(|id| {
                if id % 2 == 0 {
                    program(id, &["외향적", "예술적"])
                } else {
                    program(id, &["정적인"])
                }
            })
            .collect();

        let a = Recommender::seeded(42);
        let b = Recommender::seeded(42);
        for _ in 0..20 {
            let picked = a.pick(&user, &catalog).unwrap();
            assert_eq!(picked.id % 2, 0);
            assert_eq!(b.pick(&user, &catalog).unwrap().id, picked.id);
        }
    }

    #[test]
    fn no_match_is_none_not_error() {
        let recommender = Recommender::from_entropy();
        let catalog = vec![program(1, &["정적인"])];
        assert!(recommender.pick(&tag_set(&["외향적"]), &catalog).is_none());
        assert!(recommender.pick(&tag_set(&["외향적"]), &[]).is_none());
    }

    #[test]
    fn empty_list_carries_message() {
        let list = CandidateList::new("u1", Vec::new());
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["message"], "no candidates");
        assert_eq!(json["matched_programs"], serde_json::json!([]));

        let list = CandidateList::new("u1", vec![program(1, &["외향적", "사회적"])]);
        let json = serde_json::to_value(&list).unwrap();
        assert!(json.get("message").is_none());
    }
}
