//! Shared User-Agent strings for page and download HTTP clients.
//!
//! Both clients present a browser UA with the tool identifier appended.

/// Project URL appended to the User-Agent.
const PROJECT_UA_URL: &str = "https://github.com/hostdl/hostdl";

const BROWSER_UA_PREFIX: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// User-Agent for driver page requests.
#[must_use]
pub(crate) fn default_page_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{BROWSER_UA_PREFIX} hostdl/{version} (+{PROJECT_UA_URL})")
}

/// User-Agent for direct-link streaming requests.
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    default_page_user_agent()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version_and_project_url() {
        let ua = default_page_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"), "browser prefix expected: {ua}");
        assert!(ua.contains(&format!("hostdl/{}", env!("CARGO_PKG_VERSION"))));
        assert!(ua.contains(PROJECT_UA_URL));
    }

    #[test]
    fn test_page_and_download_user_agents_match() {
        assert_eq!(default_page_user_agent(), default_download_user_agent());
    }
}
