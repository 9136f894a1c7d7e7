//! Return-path detection from the navigation referrer.

use url::Url;

use crate::config::Config;

/// Env var carrying the referrer of the current load.
pub const ENV_REFERRER: &str = "TUNESTAT_REFERRER";

/// Infers whether this load follows a redirect from the auth provider.
pub trait ReturnPathDetector {
    fn was_referred_from_auth_domain(&self) -> bool;
}

/// Matches a referrer captured at mount against the auth provider's host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerDetector {
    referrer: Option<String>,
    auth_domain: String,
}

impl ReferrerDetector {
    pub fn new(referrer: Option<String>, auth_domain: impl Into<String>) -> Self {
        Self {
            referrer,
            auth_domain: auth_domain.into(),
        }
    }

    pub fn from_config(config: &Config, referrer: Option<String>) -> Self {
        Self::new(referrer, config.auth_domain.clone())
    }

    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }
}

impl ReturnPathDetector for ReferrerDetector {
    fn was_referred_from_auth_domain(&self) -> bool {
        let Some(raw) = self.referrer.as_deref().map(str::trim) else {
            return false;
        };
        let Ok(url) = Url::parse(raw) else {
            return false;
        };
        url.host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(self.auth_domain.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(referrer: Option<&str>) -> bool {
        ReferrerDetector::new(referrer.map(ToString::to_string), "accounts.spotify.com")
            .was_referred_from_auth_domain()
    }

    #[test]
    fn auth_domain_referrer_matches() {
        assert!(detect(Some("https://accounts.spotify.com/")));
        assert!(detect(Some("https://accounts.spotify.com/en/authorize?client_id=x")));
        assert!(detect(Some("https://ACCOUNTS.spotify.com")));
    }

    #[test]
    fn absent_or_unparseable_fails_closed() {
        assert!(!detect(None));
        assert!(!detect(Some("")));
        assert!(!detect(Some("accounts.spotify.com")));
        assert!(!detect(Some("::not a url::")));
        assert!(!detect(Some("data:text/plain,accounts.spotify.com")));
    }

    #[test]
    fn other_hosts_do_not_match() {
        assert!(!detect(Some("https://open.spotify.com/")));
        assert!(!detect(Some("https://accounts.spotify.com.evil.test/")));
        assert!(!detect(Some("https://evil.test/?r=accounts.spotify.com")));
    }
}
