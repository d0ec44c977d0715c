//! User-Agent sent with every request.
//!
//! The documentation host varies its markup by client, so requests present
//! themselves as desktop Firefox on Linux to get the same page a person sees.

/// Desktop Firefox on Linux.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";
