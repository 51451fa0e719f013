//! Shared User-Agent string for verification traffic.

/// Default User-Agent for verification requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("doclink/{version} (research-tool; link-verification)")
}
