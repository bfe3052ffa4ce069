use serde::{Deserialize, Serialize};
use std::fmt;

/// Who holds the last word in a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Last message came from someone else; the owner owes a reply.
    Inbound,
    /// Last message is the owner's own; the counterpart owes a reply.
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a thread was not flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuppressionReason {
    IgnoredSender,
    AutomatedContent,
    NoQuestionSignal,
    AlreadyHandled,
}

impl SuppressionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IgnoredSender => "ignored_sender",
            Self::AutomatedContent => "automated_content",
            Self::NoQuestionSignal => "no_question_signal",
            Self::AlreadyHandled => "already_handled",
        }
    }
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationVerdict {
    NeedsReply(Direction),
    Suppressed(SuppressionReason),
}

impl ClassificationVerdict {
    pub fn needs_reply(&self) -> bool {
        matches!(self, Self::NeedsReply(_))
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::NeedsReply(direction) => Some(*direction),
            Self::Suppressed(_) => None,
        }
    }
}

/// A verdict plus the rule or keyword that decided it, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub verdict: ClassificationVerdict,
    pub matched: Option<String>,
}
