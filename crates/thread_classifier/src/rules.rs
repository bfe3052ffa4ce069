//! Classifier rule data.
//!
//! Ignore patterns and request keywords are data, not code: one
//! [`ClassifierRules`] value carries every list the classifier consults, so
//! language coverage grows by editing data (JSON or the engine's TOML config).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::text::normalize;
use crate::verdict::{Direction, SuppressionReason};

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to parse classifier rules: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Ignore rule '{pattern}' uses unsupported reason {reason:?}")]
    UnsupportedReason {
        pattern: String,
        reason: SuppressionReason,
    },
}

/// One ignore-list entry.
///
/// `IgnoredSender` rules are matched against the sender header,
/// `AutomatedContent` rules against the snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    pub pattern: String,
    pub reason: SuppressionReason,
}

impl IgnoreRule {
    pub fn sender(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            reason: SuppressionReason::IgnoredSender,
        }
    }

    pub fn content(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            reason: SuppressionReason::AutomatedContent,
        }
    }
}

/// Phrases that imply the other party is expected to answer.
///
/// `inbound` covers requests addressed to the account owner; `outbound`
/// covers the owner's own requests that are still waiting on the counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSets {
    #[serde(default)]
    pub inbound: Vec<String>,
    #[serde(default)]
    pub outbound: Vec<String>,
}

impl KeywordSets {
    pub fn for_direction(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }

    fn for_direction_mut(&mut self, direction: Direction) -> &mut Vec<String> {
        match direction {
            Direction::Inbound => &mut self.inbound,
            Direction::Outbound => &mut self.outbound,
        }
    }
}

impl Default for KeywordSets {
    fn default() -> Self {
        let common = build_request_keywords();
        let mut outbound = common.clone();
        outbound.extend(build_follow_up_keywords());
        Self {
            inbound: common,
            outbound,
        }
    }
}

/// Ordered ignore list plus keyword sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRules {
    #[serde(default)]
    pub ignore: Vec<IgnoreRule>,
    #[serde(default)]
    pub keywords: KeywordSets,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        let mut ignore: Vec<IgnoreRule> = build_ignored_senders()
            .into_iter()
            .map(IgnoreRule::sender)
            .collect();
        ignore.extend(build_automated_phrases().into_iter().map(IgnoreRule::content));

        Self {
            ignore,
            keywords: KeywordSets::default(),
        }
    }
}

impl ClassifierRules {
    /// Empty rule set: nothing ignored, only question marks count as a signal.
    pub fn empty() -> Self {
        Self {
            ignore: Vec::new(),
            keywords: KeywordSets {
                inbound: Vec::new(),
                outbound: Vec::new(),
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: ClassifierRules = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject ignore rules whose reason has no field to match against.
    pub fn validate(&self) -> Result<(), RulesError> {
        for rule in &self.ignore {
            match rule.reason {
                SuppressionReason::IgnoredSender | SuppressionReason::AutomatedContent => {}
                other => {
                    return Err(RulesError::UnsupportedReason {
                        pattern: rule.pattern.clone(),
                        reason: other,
                    })
                }
            }
        }
        Ok(())
    }

    pub fn ignore_sender(&mut self, pattern: &str) {
        self.ignore.push(IgnoreRule::sender(pattern));
    }

    pub fn ignore_phrase(&mut self, phrase: &str) {
        self.ignore.push(IgnoreRule::content(phrase));
    }

    pub fn add_keyword(&mut self, direction: Direction, keyword: &str) {
        self.keywords.for_direction_mut(direction).push(keyword.to_string());
    }

    /// Normalized copy: lowercased, apostrophes folded, blanks and
    /// duplicates removed, first occurrence order kept.
    pub(crate) fn normalized(&self) -> ClassifierRules {
        let mut seen: HashSet<(String, SuppressionReason)> = HashSet::new();
        let ignore = self
            .ignore
            .iter()
            .filter_map(|rule| {
                let pattern = normalize(rule.pattern.trim());
                if pattern.is_empty() || !seen.insert((pattern.clone(), rule.reason)) {
                    return None;
                }
                Some(IgnoreRule {
                    pattern,
                    reason: rule.reason,
                })
            })
            .collect();

        ClassifierRules {
            ignore,
            keywords: KeywordSets {
                inbound: normalize_list(&self.keywords.inbound),
                outbound: normalize_list(&self.keywords.outbound),
            },
        }
    }
}

fn normalize_list(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|s| normalize(s.trim()))
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Default lists
// ---------------------------------------------------------------------------

fn build_ignored_senders() -> Vec<String> {
    [
        // Automated mailboxes
        "noreply",
        "no-reply",
        "donotreply",
        "do-not-reply",
        "automail@",
        "mailer-daemon",
        "postmaster@",
        "notifications@",
        "notification@",
        "newsletter@",
        "news@",
        "info@",
        "support@",
        // Calendar systems
        "calendar",
        "kalender",
        // Platforms that only send notices
        "facebookmail.com",
        "facebook.com",
        "zoom.us",
        "accounts.google.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn build_automated_phrases() -> Vec<String> {
    [
        // English
        "unsubscribe",
        "automated message",
        "you are receiving this",
        "you're receiving this",
        "no reply needed",
        "please do not reply",
        "do not reply to this email",
        "update your notification settings",
        "this email was sent to",
        "download on the app store",
        "get it on google play",
        "password reset",
        "meeting invitation",
        "calendar invitation",
        "view this email in your browser",
        "ticket-id",
        // German
        "nicht antworten",
        "automatisch generiert",
        "du erhältst diese nachricht",
        "sie erhalten diese e-mail",
        "abmelden",
        "keine antwort erforderlich",
        "benachrichtigungseinstellungen",
        "e-mail-einstellungen",
        "email-einstellungen",
        "dies ist keine antwortadresse",
        "passwort zurücksetzen",
        "passwort reset",
        "pdf ist bereit",
        "csv ist bereit",
        "aktualisierte einladung",
        "kalendereinladung",
        "termin abgesagt",
        "bestätige deine transaktion",
        // Dutch
        "afmelden",
        "uitschrijven",
        "niet beantwoorden",
        "dit is een automatisch",
        "je ontvangt deze e-mail",
        "u ontvangt deze e-mail",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn build_request_keywords() -> Vec<String> {
    [
        // English
        "can you",
        "could you",
        "would you",
        "will you",
        "should we",
        "shall we",
        "should i",
        "let me know",
        "please",
        "i need",
        "we need",
        "would be great",
        "i'd like",
        "send me",
        "is it possible",
        "get back to me",
        "any update",
        "what do you think",
        "are you available",
        "do you have time",
        "your input",
        "your opinion",
        "your feedback",
        "i'd appreciate",
        // German
        "kannst du",
        "könntest du",
        "würdest du",
        "können sie",
        "könnten sie",
        "würden sie",
        "wäre gut",
        "bitte",
        "brauchst du",
        "schickst du",
        "gib mir",
        "meld dich",
        "melde dich",
        "lass uns wissen",
        "teile mir mit",
        "wollen wir",
        "sollen wir",
        "soll ich",
        "hättest du",
        "ist das möglich",
        "wäre das möglich",
        "klären wir",
        "passt dir",
        "wann passt",
        "wie sieht es aus",
        "was meinst du",
        "geht das",
        "wir bräuchten",
        "ich würde dich bitten",
        "rückmeldung",
        "deine meinung",
        // Dutch
        "kun je",
        "kunt u",
        "zou je",
        "zou u",
        "alsjeblieft",
        "alstublieft",
        "moet ik",
        "laat me weten",
        "laat even weten",
        "graag",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn build_follow_up_keywords() -> Vec<String> {
    [
        "looking forward to your reply",
        "looking forward to hearing",
        "hope to hear from you",
        "i hope to hear",
        "waiting for your",
        "ich freue mich auf deine antwort",
        "ich freue mich auf ihre antwort",
        "gib mir bescheid",
        "sag bescheid",
        "ik hoor graag",
        "ik hoor het graag",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_validate() {
        let rules = ClassifierRules::default();
        assert!(rules.validate().is_ok());
        assert!(rules
            .ignore
            .iter()
            .any(|r| r.reason == SuppressionReason::IgnoredSender));
        assert!(rules
            .ignore
            .iter()
            .any(|r| r.reason == SuppressionReason::AutomatedContent));
    }

    #[test]
    fn test_outbound_keywords_extend_inbound() {
        let sets = KeywordSets::default();
        assert!(sets.outbound.len() > sets.inbound.len());
        for kw in &sets.inbound {
            assert!(sets.outbound.contains(kw), "missing {kw}");
        }
    }

    #[test]
    fn test_from_json_rejects_unsupported_reason() {
        let json = r#"{
            "ignore": [{"pattern": "x", "reason": "AlreadyHandled"}]
        }"#;
        let err = ClassifierRules::from_json(json).unwrap_err();
        assert!(matches!(err, RulesError::UnsupportedReason { .. }));
    }

    #[test]
    fn test_from_json_defaults_missing_sections() {
        let json = r#"{"ignore": [{"pattern": "bot@", "reason": "IgnoredSender"}]}"#;
        let rules = ClassifierRules::from_json(json).unwrap();
        assert_eq!(rules.ignore, vec![IgnoreRule::sender("bot@")]);
        assert!(!rules.keywords.inbound.is_empty());
    }

    #[test]
    fn test_normalized_dedupes_and_lowercases() {
        let mut rules = ClassifierRules::empty();
        rules.ignore_sender("NoReply");
        rules.ignore_sender("noreply");
        rules.ignore_sender("   ");
        rules.add_keyword(Direction::Inbound, "I\u{2019}d Like");

        let normalized = rules.normalized();
        assert_eq!(normalized.ignore, vec![IgnoreRule::sender("noreply")]);
        assert_eq!(normalized.keywords.inbound, vec!["i'd like".to_string()]);
    }
}
