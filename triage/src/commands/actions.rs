use super::CommandContext;
use crate::error::{Result, TriageError};
use crate::services::{hours_to_duration, ActionOutcome, ActionRequest};

pub(super) async fn archive(context: &CommandContext, id: &str) -> Result<()> {
    apply(context, ActionRequest::Archive { id: id.to_string() }).await
}

pub(super) async fn defer(context: &CommandContext, id: &str, hours: Option<i64>) -> Result<()> {
    let duration = match hours {
        Some(hours) if hours <= 0 => {
            return Err(TriageError::InvalidInput(
                "--hours must be positive".to_string(),
            ))
        }
        Some(hours) => Some(hours_to_duration(hours)?),
        None => None,
    };
    apply(
        context,
        ActionRequest::Defer {
            id: id.to_string(),
            duration,
        },
    )
    .await
}

pub(super) async fn callback(context: &CommandContext, payload: &str) -> Result<()> {
    let request: ActionRequest = payload.parse()?;
    apply(context, request).await
}

async fn apply(context: &CommandContext, request: ActionRequest) -> Result<()> {
    // Only archive reaches the mailbox.
    let needs_mailbox = matches!(request, ActionRequest::Archive { .. });
    let engine = context.engine(needs_mailbox).await?;
    let outcome: ActionOutcome = engine.apply(request).await?;
    context.emit(&outcome, || outcome.message())
}
