//! Plain-text digest of flagged threads, grouped by direction.

use crate::types::responses::FlaggedItem;
use crate::types::Direction;

/// Digest for chat front ends. Empty when nothing is flagged.
pub fn build_summary(items: &[FlaggedItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut sections = Vec::new();
    for (direction, heading) in [
        (Direction::Inbound, "Waiting for your reply"),
        (Direction::Outbound, "Waiting for their reply"),
    ] {
        let group: Vec<&FlaggedItem> = items.iter().filter(|i| i.direction == direction).collect();
        if group.is_empty() {
            continue;
        }

        let mut section = format!("{} ({}):", heading, group.len());
        for item in group {
            section.push_str(&format!(
                "\n- {} ({})\n  {}",
                display_subject(&item.subject_line),
                item.sender,
                item.deep_link
            ));
        }
        sections.push(section);
    }

    let noun = if items.len() == 1 { "thread" } else { "threads" };
    format!(
        "Unanswered mail: {} {}\n\n{}",
        items.len(),
        noun,
        sections.join("\n\n")
    )
}

fn display_subject(subject: &str) -> &str {
    if subject.is_empty() {
        "(no subject)"
    } else {
        subject
    }
}
