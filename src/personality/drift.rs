//! Conversation-driven personality drift.
//!
//! Recent user messages are sent to the oracle, which answers per axis with
//! either a new letter or `NO_CHANGE`. The answer is merged into the current
//! profile; a merge that changes nothing writes nothing.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::axes::{Axis, Letter, PersonalityCode};
use super::profile::PersonalityProfile;
use crate::error::{Error, Result};
use crate::llm::{DRIFT_MAX_TOKENS, Oracle, extract_json_object};
use crate::store::Database;

/// Longest accepted reanalysis window, about ten years.
pub const MAX_REANALYSIS_DAYS: u32 = 3650;

const NO_CHANGE: &str = "NO_CHANGE";
const NEW_PREFIX: &str = "NEW_";

pub const DRIFT_PERSONA: &str = "\
당신은 노인 복지센터의 AI 분석가입니다.
사용자의 최근 대화를 읽고 네 가지 성향 축(외향 E / 내향 I, 감각 S / 직관 N, 사고 T / 감정 F, 판단 J / 인식 P)의 변화를 감지하세요.
반드시 아래 JSON 객체 하나만 출력하세요. 다른 설명은 쓰지 마세요.
{\"ei\": \"...\", \"sn\": \"...\", \"tf\": \"...\", \"jp\": \"...\"}
각 값은 성향이 바뀌었다면 \"NEW_\" 뒤에 새 글자를 붙인 값(예: \"NEW_I\"),
변화가 없거나 불확실하다면 \"NO_CHANGE\"입니다.";

/// Result of one reanalysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftOutcome {
    /// Every axis kept its letter; nothing was written.
    NoChange { code: PersonalityCode },
    /// A new current profile was stored.
    Changed {
        previous: PersonalityCode,
        profile: PersonalityProfile,
    },
}

/// Re-estimates personality axes from recent conversation.
pub struct DriftReanalyzer {
    db: Arc<dyn Database>,
    oracle: Arc<dyn Oracle>,
    default_days: u32,
}

impl DriftReanalyzer {
    pub fn new(db: Arc<dyn Database>, oracle: Arc<dyn Oracle>, default_days: u32) -> Self {
        Self {
            db,
            oracle,
            default_days,
        }
    }

    /// Reanalyze `owner_id` over the last `days` days (or the default window).
    ///
    /// Fails with `Validation` when `days` is outside `1..=MAX_REANALYSIS_DAYS`,
    /// with `NotFound` when the window is empty or no profile exists,
    /// and with `UpstreamFormat` when the oracle answer holds no JSON object.
    /// Oracle failures propagate. In every failure case nothing is written.
    pub async fn reanalyze(&self, owner_id: &str, days: Option<u32>) -> Result<DriftOutcome> {
        let days = days.unwrap_or(self.default_days);
        let since = window_start(Utc::now(), days)?;

        let messages = self.db.user_messages_since(owner_id, since).await?;
        if messages.is_empty() {
            return Err(Error::not_found(
                "Conversation history",
                format!("{owner_id} (last {days} days)"),
            ));
        }

        let current = self
            .db
            .latest_profile(owner_id)
            .await?
            .ok_or_else(|| Error::not_found("Personality profile", owner_id))?;

        let user_text = format!(
            "최근 {days}일간의 사용자 대화 내용:\n{}",
            messages.join("\n")
        );
        debug!(owner_id, days, messages = messages.len(), "Requesting drift analysis");
        let raw = self
            .oracle
            .generate(DRIFT_PERSONA, &user_text, DRIFT_MAX_TOKENS)
            .await?;

        let verdict = extract_json_object(&raw).ok_or_else(|| {
            warn!(owner_id, raw = %raw, "Drift answer holds no JSON object");
            Error::UpstreamFormat {
                reason: "drift analysis returned no JSON object".to_string(),
            }
        })?;

        let merged = merge(current.code, &verdict);
        if merged == current.code {
            info!(owner_id, code = %current.code, "No personality drift");
            return Ok(DriftOutcome::NoChange { code: current.code });
        }

        let profile = current.successor(merged);
        self.db.insert_profile(&profile).await?;
        info!(owner_id, from = %current.code, to = %merged, "Personality drift recorded");
        Ok(DriftOutcome::Changed {
            previous: current.code,
            profile,
        })
    }
}

/// Start of a `days`-long window ending at `now`.
fn window_start(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    if !(1..=MAX_REANALYSIS_DAYS).contains(&days) {
        return Err(Error::Validation(format!(
            "days must be between 1 and {MAX_REANALYSIS_DAYS}, got {days}"
        )));
    }
    TimeDelta::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| Error::Validation(format!("days {days} is out of range")))
}

/// Apply every explicit new letter in `verdict` to `current`.
fn merge(current: PersonalityCode, verdict: &Map<String, Value>) -> PersonalityCode {
    Axis::ALL.into_iter().fold(current, |code, axis| {
        match verdict.get(axis.key()).and_then(|v| new_letter(axis, v)) {
            Some(letter) => code.with(axis, letter),
            None => code,
        }
    })
}

/// `"NEW_X"` or bare `"X"` for a letter of `axis`; anything else is no change.
fn new_letter(axis: Axis, value: &Value) -> Option<Letter> {
    let raw = value.as_str()?.trim().to_ascii_uppercase();
    if raw == NO_CHANGE {
        return None;
    }
    let letter = raw.strip_prefix(NEW_PREFIX).unwrap_or(&raw);
    axis.parse_letter(letter)
}
