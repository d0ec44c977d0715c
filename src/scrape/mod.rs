//! Documentation page scraping and download-link extraction.
//!
//! [`PageScraper::fetch_links`] fetches one platform's setup page and returns
//! the artifact links found in the toolchain section. An empty result is not
//! an error here: it is reported as [`LinkExtraction::NoLinksFound`] and the
//! orchestrator decides what to do with it.

mod html;

pub use html::{anchor_hrefs, extract_section_links, find_section, hosts_match};

use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::download::{DownloadError, HttpClient};

/// Id of the page section that lists the toolchain downloads.
pub const DEFAULT_SECTION_ID: &str = "toolchain-setup";

/// Host that serves the toolchain archives.
pub const DEFAULT_DOWNLOAD_HOST: &str = "dl.espressif.com";

/// Where on the page to look and which links to trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRules {
    /// Element id of the section whose anchors are considered.
    pub section_id: String,
    /// Only links to this host are returned.
    pub download_host: String,
}

impl Default for ScrapeRules {
    fn default() -> Self {
        Self {
            section_id: DEFAULT_SECTION_ID.to_string(),
            download_host: DEFAULT_DOWNLOAD_HOST.to_string(),
        }
    }
}

/// Result of scraping one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkExtraction {
    /// At least one qualifying link, in page order.
    LinksFound(Vec<Url>),
    /// The section is missing or holds no link to the download host.
    NoLinksFound,
}

impl LinkExtraction {
    fn from_links(links: Vec<Url>) -> Self {
        if links.is_empty() {
            Self::NoLinksFound
        } else {
            Self::LinksFound(links)
        }
    }
}

/// Errors fetching a documentation page.
#[derive(Debug, Error)]
#[error("failed to fetch documentation page {page}: {source}")]
pub struct ScrapeError {
    /// Page that could not be fetched.
    pub page: String,
    #[source]
    pub source: DownloadError,
}

/// Fetches documentation pages and extracts artifact links.
#[derive(Debug, Clone)]
pub struct PageScraper {
    client: HttpClient,
    rules: ScrapeRules,
}

impl PageScraper {
    #[must_use]
    pub fn new(client: HttpClient, rules: ScrapeRules) -> Self {
        Self { client, rules }
    }

    /// Fetches `page_url` and extracts the qualifying download links.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the page cannot be fetched or answers with
    /// a non-success status.
    #[instrument(skip(self), fields(page = %page_url))]
    pub async fn fetch_links(&self, page_url: &Url) -> Result<LinkExtraction, ScrapeError> {
        let html = self
            .client
            .fetch_text(page_url)
            .await
            .map_err(|source| ScrapeError {
                page: page_url.to_string(),
                source,
            })?;

        let links = extract_section_links(
            &html,
            page_url,
            &self.rules.section_id,
            &self.rules.download_host,
        );
        debug!(count = links.len(), "extracted download links");

        Ok(LinkExtraction::from_links(links))
    }
}
