//! Report link localization
//!
//! Report viewers take a `lang` query parameter; it is set from the
//! requesting user's preferred locale.

use async_trait::async_trait;
use reqwest::Url;
use uwrite_common::Result;

/// Source of per-user locale preferences
#[async_trait]
pub trait LocaleResolver: Send + Sync {
    /// Preferred locale ("en_US") or None when the user has no preference
    async fn preferred_locale(&self, user_id: &str) -> Result<Option<String>>;
}

/// Resolver for hosts without per-user preferences
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreferences;

#[async_trait]
impl LocaleResolver for NoPreferences {
    async fn preferred_locale(&self, _user_id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Replace (or add) the `lang` query parameter of `link`
///
/// Returns the link unmodified when it cannot be parsed.
pub fn inject_language(link: &str, locale: &str) -> String {
    let mut url = match Url::parse(link) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(link, error = %e, "Failed to inject language");
            return link.to_string();
        }
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != "lang")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("lang", locale);

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_lang_param() {
        assert_eq!(
            inject_language("https://uwrite.test/report/1", "uk_UA"),
            "https://uwrite.test/report/1?lang=uk_UA"
        );
    }

    #[test]
    fn test_replaces_existing_lang_and_keeps_other_params() {
        assert_eq!(
            inject_language("https://uwrite.test/report/1?token=abc&lang=en", "de_DE"),
            "https://uwrite.test/report/1?token=abc&lang=de_DE"
        );
    }

    #[test]
    fn test_unparseable_link_returned_unmodified() {
        assert_eq!(inject_language("not a url", "en_US"), "not a url");
    }
}
