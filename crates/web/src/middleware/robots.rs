//! User-agent classification.

use crate::models::RobotClass;

/// Substrings that mark an agent as automated.
pub const CRAWLER_MARKERS: &[&str] = &[
    "bot",
    "crawl",
    "spider",
    "slurp",
    "curl",
    "wget",
    "python-requests",
    "headless",
];

/// Classify a `User-Agent` header.
///
/// The allowlist is checked first, case-insensitively, so a listed crawler
/// whose agent also carries a marker is still allowed. A missing or blank
/// header is treated as a human.
#[must_use]
pub fn classify(user_agent: Option<&str>, allowlist: &[String]) -> RobotClass {
    let Some(agent) = user_agent.map(str::trim).filter(|a| !a.is_empty()) else {
        return RobotClass::Human;
    };
    let agent = agent.to_ascii_lowercase();

    if allowlist
        .iter()
        .any(|allowed| !allowed.is_empty() && agent.contains(&allowed.to_ascii_lowercase()))
    {
        return RobotClass::AllowedRobot;
    }

    if CRAWLER_MARKERS.iter().any(|marker| agent.contains(marker)) {
        RobotClass::DisallowedRobot
    } else {
        RobotClass::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist() -> Vec<String> {
        vec!["Googlebot".to_string(), "bingbot".to_string()]
    }

    #[test]
    fn test_browsers_are_human() {
        let firefox = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
        assert_eq!(classify(Some(firefox), &allowlist()), RobotClass::Human);
        assert_eq!(classify(None, &allowlist()), RobotClass::Human);
        assert_eq!(classify(Some("  "), &allowlist()), RobotClass::Human);
    }

    #[test]
    fn test_allowlisted_crawlers() {
        let google = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
        assert_eq!(classify(Some(google), &allowlist()), RobotClass::AllowedRobot);
        assert_eq!(
            classify(Some("Mozilla/5.0 (compatible; BINGBOT/2.0)"), &allowlist()),
            RobotClass::AllowedRobot
        );
    }

    #[test]
    fn test_other_automation_is_disallowed() {
        for agent in [
            "Mozilla/5.0 (compatible; AhrefsBot/7.0)",
            "curl/8.5.0",
            "Wget/1.21",
            "python-requests/2.31",
            "Mozilla/5.0 HeadlessChrome/120.0",
            "Baiduspider",
        ] {
            assert_eq!(
                classify(Some(agent), &allowlist()),
                RobotClass::DisallowedRobot,
                "{agent}"
            );
        }
    }

    #[test]
    fn test_empty_allowlist_entry_matches_nothing() {
        assert_eq!(
            classify(Some("curl/8.5.0"), &[String::new()]),
            RobotClass::DisallowedRobot
        );
    }
}
