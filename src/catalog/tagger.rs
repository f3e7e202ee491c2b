//! Oracle-assisted program classification.
//!
//! Programs imported without tags are classified into fixed category
//! vocabularies and up to five personality tags, which is what makes them
//! reachable by the recommender.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::model::{
    DEFAULT_HEADCOUNT, DEFAULT_MAIN_CATEGORY, DEFAULT_SUB_CATEGORY, Program,
    ProgramClassification,
};
use crate::error::{Error, Result};
use crate::llm::{Oracle, TAGGING_MAX_TOKENS, extract_json_object};
use crate::personality::{TAG_VOCABULARY, TagSet, is_known_tag};
use crate::store::Database;

pub const MAIN_CATEGORIES: [&str; 7] = ["운동", "음악", "예술", "디지털", "어학", "문해", "교양"];
pub const SUB_CATEGORIES: [&str; 2] = ["실내", "실외"];
pub const HEADCOUNTS: [&str; 2] = ["개인", "단체"];
pub const MAX_PROGRAM_TAGS: usize = 5;

const TAGGER_PERSONA: &str = "\
당신은 노인 복지 프로그램 분류 담당자입니다. 아래 JSON 형태로만 출력하세요.
{\"main_category\": \"...\", \"sub_category\": \"...\", \"headcount\": \"...\", \"tags\": [\"...\", \"...\"]}";

/// Per-batch outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaggingReport {
    pub tagged: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct ProgramTagger {
    db: Arc<dyn Database>,
    oracle: Arc<dyn Oracle>,
}

impl ProgramTagger {
    pub fn new(db: Arc<dyn Database>, oracle: Arc<dyn Oracle>) -> Self {
        Self { db, oracle }
    }

    /// Ask the oracle to classify one program. Nothing is written.
    pub async fn classify(&self, program: &Program) -> Result<ProgramClassification> {
        let raw = self
            .oracle
            .generate(TAGGER_PERSONA, &classification_request(&program.name), TAGGING_MAX_TOKENS)
            .await?;
        let object = extract_json_object(&raw).ok_or_else(|| Error::UpstreamFormat {
            reason: format!("classification of '{}' returned no JSON object", program.name),
        })?;
        Ok(parse_classification(&object))
    }

    /// Classify one program and store the result.
    pub async fn tag_program(&self, program: &Program) -> Result<ProgramClassification> {
        let classification = self.classify(program).await?;
        self.db
            .update_program_classification(program.id, &classification)
            .await?;
        debug!(program = %program.name, tags = classification.tags.len(), "Program classified");
        Ok(classification)
    }

    /// Classify every program that has no tags yet.
    ///
    /// A failure on one program is counted and the batch moves on; only a
    /// failure to read the catalog aborts it.
    pub async fn tag_untagged(&self) -> Result<TaggingReport> {
        let mut report = TaggingReport::default();
        for program in self.db.list_programs().await? {
            if !program.tags.is_empty() {
                report.skipped += 1;
                continue;
            }
            match self.tag_program(&program).await {
                Ok(_) => report.tagged += 1,
                Err(e) => {
                    warn!(program = %program.name, error = %e, "Program classification failed");
                    report.failed += 1;
                }
            }
        }
        info!(
            tagged = report.tagged,
            skipped = report.skipped,
            failed = report.failed,
            "Catalog tagging finished"
        );
        Ok(report)
    }
}

fn classification_request(program_name: &str) -> String {
    format!(
        "강좌명: '{program_name}'\n\
         이 강좌를 다음과 같이 분류해 주세요:\n\
         1) main_category: {} 중에서만 하나\n\
         2) sub_category: {} 중에서만 하나\n\
         3) headcount: {} 중에서만 하나\n\
         4) tags: {} 중에서만 최대 {MAX_PROGRAM_TAGS}개",
        MAIN_CATEGORIES.join(", "),
        SUB_CATEGORIES.join(", "),
        HEADCOUNTS.join(", "),
        TAG_VOCABULARY.join(", "),
    )
}

/// Keep in-vocabulary values; anything else falls back to the defaults.
pub fn parse_classification(object: &Map<String, Value>) -> ProgramClassification {
    ProgramClassification {
        main_category: pick(object, "main_category", &MAIN_CATEGORIES, DEFAULT_MAIN_CATEGORY),
        sub_category: pick(object, "sub_category", &SUB_CATEGORIES, DEFAULT_SUB_CATEGORY),
        headcount: pick(object, "headcount", &HEADCOUNTS, DEFAULT_HEADCOUNT),
        tags: known_tags(object.get("tags")),
    }
}

fn pick(object: &Map<String, Value>, key: &str, allowed: &[&str], default: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default)
        .to_string()
}

/// Tags as a JSON array or a comma-separated string, first five known ones.
fn known_tags(value: Option<&Value>) -> TagSet {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(list)) => list.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    let mut tags = TagSet::new();
    for tag in raw.iter().map(|t| t.trim().trim_matches('\'')) {
        if tags.len() == MAX_PROGRAM_TAGS {
            break;
        }
        if is_known_tag(tag) {
            tags.insert(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::oracle::testing::ScriptedOracle;
    use crate::store::LibSqlBackend;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn out_of_vocabulary_values_fall_back() {
        let parsed = parse_classification(&object(json!({
            "main_category": "요리",
            "sub_category": "실외",
            "headcount": 3,
            "tags": ["활동적", "신나는", "사회적"]
        })));
        assert_eq!(parsed.main_category, "교양");
        assert_eq!(parsed.sub_category, "실외");
        assert_eq!(parsed.headcount, "개인");
        assert_eq!(parsed.tags.len(), 2);
        assert!(parsed.tags.contains("활동적"));
    }

    #[test]
    fn tags_accept_comma_list_and_cap_at_five() {
        let parsed = parse_classification(&object(json!({
            "main_category": "운동",
            "tags": "외향적, 사회적,활동적,체험형,현실적,교류형"
        })));
        assert_eq!(parsed.main_category, "운동");
        assert_eq!(parsed.tags.len(), MAX_PROGRAM_TAGS);
        assert!(!parsed.tags.contains("교류형"));
    }

    #[tokio::test]
    async fn batch_counts_outcomes_and_skips_bad_output() {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        for raw in [
            r#"{"id": 1, "name": "요가", "center_id": 1}"#,
            r#"{"id": 2, "name": "합창", "center_id": 1}"#,
            r#"{"id": 3, "name": "바둑", "center_id": 1, "tags": ["분석적", "정적인"]}"#,
        ] {
            let program: Program = serde_json::from_str(raw).unwrap();
            db.upsert_program(&program).await.unwrap();
        }
        let oracle = Arc::new(ScriptedOracle::answering([
            r#"결과: {"main_category":"운동","sub_category":"실내","headcount":"단체","tags":["활동적","사회적"]}"#,
            "잘 모르겠습니다",
        ]));
        let tagger = ProgramTagger::new(db.clone(), oracle.clone());

        let report = tagger.tag_untagged().await.unwrap();

        assert_eq!(
            report,
            TaggingReport {
                tagged: 1,
                skipped: 1,
                failed: 1
            }
        );
        let yoga = db.get_program(1).await.unwrap().unwrap();
        assert_eq!(yoga.main_category, "운동");
        assert_eq!(yoga.headcount, "단체");
        assert!(yoga.tags.contains("활동적"));

        let choir = db.get_program(2).await.unwrap().unwrap();
        assert!(choir.tags.is_empty());
        assert_eq!(choir.main_category, "교양");

        assert!(oracle.calls()[0].user_text.contains("강좌명: '요가'"));
    }
}
