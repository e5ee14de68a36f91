use rand::seq::SliceRandom;
use std::sync::Arc;

/// Fallback when neither the configured list nor the built-in list has a match
const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// User agent rotator used to give each fetch strategy its own identity
#[derive(Debug, Clone)]
pub struct UserAgentRotator {
    user_agents: Arc<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOS,
    Linux,
}

impl Browser {
    fn matches(self, ua: &str) -> bool {
        match self {
            Browser::Chrome => ua.contains("Chrome") && !ua.contains("Edg"),
            Browser::Firefox => ua.contains("Firefox"),
            Browser::Safari => ua.contains("Safari") && !ua.contains("Chrome"),
            Browser::Edge => ua.contains("Edg"),
        }
    }
}

impl OsFamily {
    fn matches(self, ua: &str) -> bool {
        match self {
            OsFamily::Windows => ua.contains("Windows NT"),
            OsFamily::MacOS => ua.contains("Macintosh"),
            OsFamily::Linux => ua.contains("X11; Linux"),
        }
    }
}

impl UserAgentRotator {
    pub fn new(user_agents: &[String]) -> Self {
        let agents = if user_agents.is_empty() {
            Self::default_user_agents()
        } else {
            user_agents.to_vec()
        };

        Self {
            user_agents: Arc::new(agents),
        }
    }

    /// Get a random user agent
    pub fn get_random_user_agent(&self) -> &str {
        let mut rng = rand::thread_rng();
        self.user_agents
            .choose(&mut rng)
            .map(String::as_str)
            .unwrap_or(FALLBACK_USER_AGENT)
    }

    /// Get a random user agent for a browser/OS pair.
    ///
    /// Looks in the configured list first, then in the built-in list, so a
    /// strategy that needs e.g. a macOS identity keeps it even when the
    /// configured list is Windows-only.
    pub fn get_random_user_agent_for(&self, browser: Option<Browser>, os: Option<OsFamily>) -> String {
        let accept = |ua: &&String| {
            browser.map_or(true, |b| b.matches(ua)) && os.map_or(true, |o| o.matches(ua))
        };

        let mut rng = rand::thread_rng();
        let configured: Vec<&String> = self.user_agents.iter().filter(accept).collect();
        if let Some(ua) = configured.choose(&mut rng) {
            return (*ua).clone();
        }

        let builtin = Self::default_user_agents();
        let candidates: Vec<&String> = builtin.iter().filter(accept).collect();
        candidates
            .choose(&mut rng)
            .map(|ua| (*ua).clone())
            .unwrap_or_else(|| self.get_random_user_agent().to_string())
    }

    /// Get count of available user agents
    pub fn count(&self) -> usize {
        self.user_agents.len()
    }

    /// Default user agents covering the desktop browsers the strategies impersonate
    fn default_user_agents() -> Vec<String> {
        vec![
            // Chrome on Windows
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),

            // Firefox and Edge on Windows
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0".to_string(),

            // macOS
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15".to_string(),

            // Linux
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
        ]
    }
}

impl Default for UserAgentRotator {
    fn default() -> Self {
        Self::new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_rotation() {
        let rotator = UserAgentRotator::default();
        assert!(!rotator.get_random_user_agent().is_empty());
        assert!(rotator.count() > 0);
    }

    #[test]
    fn test_combined_filtering() {
        let rotator = UserAgentRotator::default();

        let chrome_windows = rotator.get_random_user_agent_for(Some(Browser::Chrome), Some(OsFamily::Windows));
        assert!(chrome_windows.contains("Chrome"));
        assert!(chrome_windows.contains("Windows NT"));
        assert!(!chrome_windows.contains("Edg"));

        let linux = rotator.get_random_user_agent_for(None, Some(OsFamily::Linux));
        assert!(linux.contains("X11; Linux"));
    }

    #[test]
    fn test_builtin_fallback_for_missing_identity() {
        let rotator = UserAgentRotator::new(&["CustomBot/1.0 (Windows NT 10.0)".to_string()]);
        assert_eq!(rotator.get_random_user_agent(), "CustomBot/1.0 (Windows NT 10.0)");

        let mac = rotator.get_random_user_agent_for(None, Some(OsFamily::MacOS));
        assert!(mac.contains("Macintosh"));
    }
}
