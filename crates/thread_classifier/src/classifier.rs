use crate::rules::ClassifierRules;
use crate::text::{first_match, has_question_mark, normalize};
use crate::thread::{MessageRef, Thread};
use crate::verdict::{ClassificationVerdict, Direction, Explanation, SuppressionReason};

/// Label providers put on messages sent by the account owner.
pub const DEFAULT_SENT_LABEL: &str = "SENT";

/// Heuristic reply-needed classifier.
///
/// Pipeline, applied to the last message of a thread:
/// 1. **Sender filter**: sender header against `IgnoredSender` rules.
/// 2. **Content filter**: snippet against `AutomatedContent` rules.
/// 3. **Direction**: sent label present means outbound.
/// 4. **Signal**: a question mark, or a keyword from the direction's set.
/// 5. **Verdict**: inbound needs a reply on signal; outbound needs one on
///    signal only while no third-party message is newer than it.
///
/// Filters run before signal detection because automated mail is full of
/// question marks and "please confirm" phrasing.
#[derive(Debug, Clone)]
pub struct ThreadClassifier {
    rules: ClassifierRules,
    sent_label: String,
}

impl Default for ThreadClassifier {
    fn default() -> Self {
        Self::new(&ClassifierRules::default())
    }
}

impl ThreadClassifier {
    pub fn new(rules: &ClassifierRules) -> Self {
        Self {
            rules: rules.normalized(),
            sent_label: DEFAULT_SENT_LABEL.to_string(),
        }
    }

    pub fn with_sent_label(mut self, label: impl Into<String>) -> Self {
        self.sent_label = label.into();
        self
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    pub fn direction_of(&self, message: &MessageRef) -> Direction {
        if message.has_label(&self.sent_label) {
            Direction::Outbound
        } else {
            Direction::Inbound
        }
    }

    pub fn classify(&self, thread: &Thread) -> ClassificationVerdict {
        self.explain(thread).verdict
    }

    /// Classify and report which pattern or keyword decided the outcome.
    pub fn explain(&self, thread: &Thread) -> Explanation {
        let Some(last) = thread.last_message() else {
            return suppressed(SuppressionReason::NoQuestionSignal, None);
        };

        let sender = normalize(&last.sender);
        let snippet = normalize(&last.snippet);

        if let Some(pattern) = self.matching_rule(&sender, SuppressionReason::IgnoredSender) {
            return suppressed(SuppressionReason::IgnoredSender, Some(pattern));
        }
        if let Some(pattern) = self.matching_rule(&snippet, SuppressionReason::AutomatedContent) {
            return suppressed(SuppressionReason::AutomatedContent, Some(pattern));
        }

        let direction = self.direction_of(last);
        let signal = self.question_signal(&snippet, direction);

        match (direction, signal) {
            (_, None) => suppressed(SuppressionReason::NoQuestionSignal, None),
            (Direction::Inbound, Some(signal)) => Explanation {
                verdict: ClassificationVerdict::NeedsReply(Direction::Inbound),
                matched: Some(signal),
            },
            (Direction::Outbound, Some(signal)) => {
                if self.answered_after(thread, last) {
                    suppressed(SuppressionReason::AlreadyHandled, Some(signal))
                } else {
                    Explanation {
                        verdict: ClassificationVerdict::NeedsReply(Direction::Outbound),
                        matched: Some(signal),
                    }
                }
            }
        }
    }

    fn matching_rule(&self, haystack: &str, reason: SuppressionReason) -> Option<String> {
        let patterns = self
            .rules
            .ignore
            .iter()
            .filter(|rule| rule.reason == reason)
            .map(|rule| &rule.pattern);
        first_match(haystack, patterns).map(str::to_string)
    }

    fn question_signal(&self, snippet: &str, direction: Direction) -> Option<String> {
        if has_question_mark(snippet) {
            return Some("?".to_string());
        }
        first_match(snippet, self.rules.keywords.for_direction(direction)).map(str::to_string)
    }

    /// A third-party message newer than the owner's last message.
    ///
    /// Providers may order a thread by position rather than time, so a reply
    /// can sit before the owner's message in the sequence and still be newer.
    fn answered_after(&self, thread: &Thread, last: &MessageRef) -> bool {
        thread.messages.iter().any(|m| {
            m.id != last.id
                && self.direction_of(m) == Direction::Inbound
                && m.timestamp > last.timestamp
        })
    }
}

fn suppressed(reason: SuppressionReason, matched: Option<String>) -> Explanation {
    Explanation {
        verdict: ClassificationVerdict::Suppressed(reason),
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    fn make_message(id: &str, from: &str, snippet: &str, sent: bool, minutes: i64) -> MessageRef {
        let mut labels = BTreeSet::new();
        labels.insert(if sent { "SENT" } else { "INBOX" }.to_string());
        MessageRef {
            id: id.to_string(),
            thread_id: "t1".to_string(),
            sender: from.to_string(),
            subject_line: "Subject".to_string(),
            snippet: snippet.to_string(),
            direction_labels: labels,
            timestamp: base_time() + Duration::minutes(minutes),
        }
    }

    fn thread(messages: Vec<MessageRef>) -> Thread {
        Thread::new("t1", messages)
    }

    #[test]
    fn test_empty_thread_has_no_signal() {
        let classifier = ThreadClassifier::default();
        assert_eq!(
            classifier.classify(&thread(vec![])),
            ClassificationVerdict::Suppressed(SuppressionReason::NoQuestionSignal)
        );
    }

    #[test]
    fn test_ignored_sender_beats_question_mark() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![make_message(
            "m1",
            "Service <noreply@service.example>",
            "Please confirm your subscription?",
            false,
            0,
        )]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::Suppressed(SuppressionReason::IgnoredSender)
        );
    }

    #[test]
    fn test_automated_content_beats_keywords() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![make_message(
            "m1",
            "Shop <orders@shop.example>",
            "Could you rate your order? To unsubscribe click here.",
            false,
            0,
        )]);
        let explanation = classifier.explain(&t);
        assert_eq!(
            explanation.verdict,
            ClassificationVerdict::Suppressed(SuppressionReason::AutomatedContent)
        );
        assert_eq!(explanation.matched.as_deref(), Some("unsubscribe"));
    }

    #[test]
    fn test_sender_rules_checked_before_content_rules() {
        let mut rules = ClassifierRules::empty();
        rules.ignore_phrase("unsubscribe");
        rules.ignore_sender("bot@");
        let classifier = ThreadClassifier::new(&rules);
        let t = thread(vec![make_message("m1", "bot@x.example", "unsubscribe?", false, 0)]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::Suppressed(SuppressionReason::IgnoredSender)
        );
    }

    #[test]
    fn test_inbound_question_needs_reply() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![make_message(
            "m1",
            "colleague@example.com",
            "Can you send me the report by Friday?",
            false,
            0,
        )]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::NeedsReply(Direction::Inbound)
        );
    }

    #[test]
    fn test_inbound_keyword_without_question_mark() {
        let classifier = ThreadClassifier::default();
        for snippet in [
            "Kannst du mir die Unterlagen schicken.",
            "Zou je dit willen nakijken.",
            "Let me know when it's done.",
            "I\u{2019}d like the slides by Monday.",
        ] {
            let t = thread(vec![make_message("m1", "friend@example.com", snippet, false, 0)]);
            assert_eq!(
                classifier.classify(&t),
                ClassificationVerdict::NeedsReply(Direction::Inbound),
                "snippet: {snippet}"
            );
        }
    }

    #[test]
    fn test_inbound_statement_is_suppressed() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![make_message(
            "m1",
            "friend@example.com",
            "Thanks, the slides look good.",
            false,
            0,
        )]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::Suppressed(SuppressionReason::NoQuestionSignal)
        );
    }

    #[test]
    fn test_outbound_question_waiting_for_answer() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![
            make_message("m1", "colleague@example.com", "Meeting next week.", false, 0),
            make_message("m2", "me@example.com", "Could you confirm the meeting time?", true, 10),
        ]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::NeedsReply(Direction::Outbound)
        );
    }

    #[test]
    fn test_outbound_assertion_not_flagged() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![make_message(
            "m1",
            "me@example.com",
            "Attached are the minutes from today.",
            true,
            0,
        )]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::Suppressed(SuppressionReason::NoQuestionSignal)
        );
    }

    #[test]
    fn test_outbound_followed_by_reply_is_suppressed() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![
            make_message("m1", "me@example.com", "Could you confirm the meeting time?", true, 0),
            make_message("m2", "colleague@example.com", "Confirmed, 3pm works.", false, 30),
        ]);
        assert!(!classifier.classify(&t).needs_reply());
    }

    #[test]
    fn test_outbound_with_newer_reply_out_of_position() {
        let classifier = ThreadClassifier::default();
        // Provider placed the reply before the owner's message, but it is newer.
        let t = thread(vec![
            make_message("m2", "colleague@example.com", "Sure, done.", false, 45),
            make_message("m1", "me@example.com", "Could you confirm the meeting time?", true, 0),
        ]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::Suppressed(SuppressionReason::AlreadyHandled)
        );
    }

    #[test]
    fn test_custom_sent_label() {
        let classifier = ThreadClassifier::default().with_sent_label("\\Sent");
        let mut msg = make_message("m1", "me@example.com", "Could you check?", false, 0);
        msg.direction_labels = ["\\Sent".to_string()].into_iter().collect();
        assert_eq!(classifier.direction_of(&msg), Direction::Outbound);
    }

    #[test]
    fn test_outbound_follow_up_keyword() {
        let classifier = ThreadClassifier::default();
        let t = thread(vec![make_message(
            "m1",
            "me@example.com",
            "Ich freue mich auf deine Antwort.",
            true,
            0,
        )]);
        assert_eq!(
            classifier.classify(&t),
            ClassificationVerdict::NeedsReply(Direction::Outbound)
        );
    }
}
