//! Local argument checks that run before any request is sent.

use crate::config::ServerProfile;
use crate::error::{McpClientError, Result};

/// Reject empty or whitespace-only tool/prompt names.
pub(crate) fn require_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(McpClientError::InvalidArgument(format!(
            "{kind} name must not be empty"
        )));
    }
    Ok(())
}

/// Check `id` against the server's documented resource id range.
pub(crate) fn resource_id(profile: &ServerProfile, id: i64) -> Result<u32> {
    let range = profile.resource_ids();
    u32::try_from(id)
        .ok()
        .filter(|id| range.contains(id))
        .ok_or_else(|| {
            McpClientError::InvalidArgument(format!(
                "resource id {id} is outside the valid range {}..={}",
                range.start(),
                range.end()
            ))
        })
}
