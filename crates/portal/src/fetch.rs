//! Paste-service URL classification and log retrieval.
//!
//! Only a fixed allow-list of paste hosts is fetched; anything else is
//! rejected before a single request goes out. Gists go through the GitHub
//! API (the raw content sits inside a JSON envelope), every other host
//! serves the log as plain text at a derivable raw URL.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{FetchError, FetchResult};

static GIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?gist\.github\.com/(?:[\w.-]+/)?(?P<id>[0-9a-fA-F]+)\b").unwrap()
});
static HASTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?hastebin\.com/(?:raw/)?(?P<key>[A-Za-z0-9]+)\b").unwrap()
});
static OBS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?obsproject\.com/logs/(?P<key>[\w-]+)\b").unwrap()
});
static PASTEBIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?pastebin\.com/(?:raw/)?(?P<key>[A-Za-z0-9]+)\b").unwrap()
});
static DISCORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?cdn\.discordapp\.com/attachments/(?P<path>\d+/\d+/[^\s]+)").unwrap()
});

/// A recognized paste host together with the captured resource key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteHost {
    Gist { id: String },
    Haste { key: String },
    ObsLog { key: String },
    Pastebin { key: String },
    Discord { path: String },
}

impl PasteHost {
    /// Classify a user-supplied URL. `None` means the URL is not on the
    /// allow-list and must not be fetched.
    pub fn classify(url: &str) -> Option<Self> {
        if let Some(caps) = GIST_RE.captures(url) {
            return Some(Self::Gist { id: caps["id"].to_string() });
        }
        if let Some(caps) = OBS_RE.captures(url) {
            return Some(Self::ObsLog { key: caps["key"].to_string() });
        }
        if let Some(caps) = HASTE_RE.captures(url) {
            return Some(Self::Haste { key: caps["key"].to_string() });
        }
        if let Some(caps) = PASTEBIN_RE.captures(url) {
            return Some(Self::Pastebin { key: caps["key"].to_string() });
        }
        if let Some(caps) = DISCORD_RE.captures(url) {
            return Some(Self::Discord { path: caps["path"].to_string() });
        }
        None
    }

    /// URL that serves the raw log text (or, for gists, the JSON envelope).
    pub fn raw_url(&self) -> String {
        match self {
            Self::Gist { id } => format!("https://api.github.com/gists/{id}"),
            Self::Haste { key } => format!("https://hastebin.com/raw/{key}"),
            Self::ObsLog { key } => format!("https://obsproject.com/logs/{key}"),
            Self::Pastebin { key } => format!("https://pastebin.com/raw/{key}"),
            Self::Discord { path } => format!("https://cdn.discordapp.com/attachments/{path}"),
        }
    }
}

/// HTTP retrieval with a shared client, a per-request timeout and a hard
/// body size limit.
pub struct Fetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    /// Fetch the log text behind a classified URL.
    pub async fn fetch(&self, host: &PasteHost) -> FetchResult<String> {
        let url = host.raw_url();
        debug!(%url, "fetching log");
        let text = match host {
            PasteHost::Gist { .. } => self.fetch_gist(&url).await?,
            _ => self
                .client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?,
        };
        if text.len() as u64 > self.max_bytes {
            return Err(FetchError::TooLarge { limit: self.max_bytes });
        }
        if text.trim().is_empty() {
            return Err(FetchError::EmptyDocument);
        }
        Ok(text)
    }

    /// The gist API wraps file contents in JSON; take the first file.
    async fn fetch_gist(&self, api_url: &str) -> FetchResult<String> {
        let envelope: serde_json::Value = self
            .client
            .get(api_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        envelope["files"]
            .as_object()
            .and_then(|files| files.values().next())
            .and_then(|file| file["content"].as_str())
            .map(str::to_owned)
            .ok_or(FetchError::MalformedResponse)
    }
}

/// Read a log from the local filesystem, for the one-shot CLI path.
/// Shares the fetch path's empty-document rejection.
pub async fn read_file(path: &std::path::Path) -> FetchResult<String> {
    let text = tokio::fs::read_to_string(path).await?;
    if text.trim().is_empty() {
        return Err(FetchError::EmptyDocument);
    }
    Ok(text)
}

/// Classify and fetch in one step, for callers holding a raw URL.
pub async fn fetch_url(fetcher: &Fetcher, url: &str) -> FetchResult<String> {
    let host = PasteHost::classify(url).ok_or_else(|| FetchError::UnsupportedUrl(url.to_string()))?;
    fetcher.fetch(&host).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gist_urls_classify_with_and_without_user() {
        let host = PasteHost::classify("https://gist.github.com/someone/9f72f8bb01f9c1e77312").unwrap();
        assert_eq!(host, PasteHost::Gist { id: "9f72f8bb01f9c1e77312".into() });
        assert_eq!(host.raw_url(), "https://api.github.com/gists/9f72f8bb01f9c1e77312");

        let bare = PasteHost::classify("gist.github.com/9f72f8bb01f9c1e77312").unwrap();
        assert!(matches!(bare, PasteHost::Gist { .. }));
    }

    #[test]
    fn obsproject_log_urls_classify() {
        let host = PasteHost::classify("https://obsproject.com/logs/t8Phl0hkxozZLGkd").unwrap();
        assert_eq!(host.raw_url(), "https://obsproject.com/logs/t8Phl0hkxozZLGkd");
    }

    #[test]
    fn haste_and_pastebin_normalize_to_raw() {
        let haste = PasteHost::classify("https://hastebin.com/ukakayala").unwrap();
        assert_eq!(haste.raw_url(), "https://hastebin.com/raw/ukakayala");
        let raw = PasteHost::classify("https://hastebin.com/raw/ukakayala").unwrap();
        assert_eq!(haste, raw);

        let paste = PasteHost::classify("https://pastebin.com/BWGcLN5F").unwrap();
        assert_eq!(paste.raw_url(), "https://pastebin.com/raw/BWGcLN5F");
    }

    #[test]
    fn discord_attachments_classify() {
        let host = PasteHost::classify(
            "https://cdn.discordapp.com/attachments/123456/789012/2024-08-12.txt",
        )
        .unwrap();
        assert!(matches!(host, PasteHost::Discord { .. }));
    }

    #[tokio::test]
    async fn missing_file_surfaces_io_error() {
        let err = read_file(std::path::Path::new("/no/such/log.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let path = std::env::temp_dir().join("portal-empty-log.txt");
        std::fs::write(&path, "  \n").unwrap();
        let err = read_file(&path).await.unwrap_err();
        assert!(matches!(err, FetchError::EmptyDocument));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unrelated_urls_are_rejected() {
        assert_eq!(PasteHost::classify("https://example.com/log.txt"), None);
        assert_eq!(PasteHost::classify("https://evilgist.github.com.example.com/x"), None);
        assert_eq!(PasteHost::classify("not a url"), None);
    }
}
