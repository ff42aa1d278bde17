//! Photo URL resolution against a media base URL.

use anyhow::Context;
use url::Url;

use crate::domain::ports::PhotoUrlResolver;

/// Resolves relative storage references (`event_photos/a.jpg`) onto a base
/// URL; absolute `http(s)` URLs pass through untouched.
pub struct MediaUrlResolver {
    base: Url,
}

impl MediaUrlResolver {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let mut raw = base.trim().to_string();
        // Without a trailing slash `join` would replace the last path segment
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw).with_context(|| format!("invalid media_base_url '{base}'"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("media_base_url '{base}' cannot be used as a base URL");
        }
        Ok(Self { base })
    }
}

impl PhotoUrlResolver for MediaUrlResolver {
    fn resolve(&self, reference: &str) -> String {
        let reference = reference.trim();
        if let Ok(url) = Url::parse(reference) {
            if matches!(url.scheme(), "http" | "https") {
                return url.into();
            }
        }
        match self.base.join(reference.trim_start_matches('/')) {
            Ok(url) => url.into(),
            Err(e) => {
                tracing::warn!("cannot resolve photo reference '{}': {}", reference, e);
                reference.to_string()
            }
        }
    }
}
