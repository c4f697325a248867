//! Web page fetching and HTML-to-text conversion

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Client;

use super::{ReaderError, ensure_success, parse_url, transport_error};

/// Sent with link reads; some sites refuse non-browser agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

static NON_TEXT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<(script|style)\b(?:[^>"']|"[^"]*"|'[^']*')*>.*?</(?:script|style)\s*>|<!--.*?-->"#,
    )
    .expect("valid non-text block regex")
});

/// A tag, with `>` allowed inside quoted attribute values
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid tag regex")
});

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex")
});

pub struct LinkReader {
    client: Client,
}

impl LinkReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` and returns the response body as text.
    pub async fn read_link_raw(&self, url: &str) -> Result<String, ReaderError> {
        let url = parse_url(url)?;
        tracing::debug!("Reading link {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        ensure_success(response)?
            .text()
            .await
            .map_err(|e| transport_error(&url, e))
    }

    /// Fetches `url` and returns its visible text.
    ///
    /// A body that already starts with `Error` is returned untouched.
    pub async fn read_link_text(&self, url: &str) -> Result<String, ReaderError> {
        let raw_html = self.read_link_raw(url).await?;
        if raw_html.starts_with("Error") {
            return Ok(raw_html);
        }
        Ok(html_to_text(&raw_html))
    }
}

/// Extracts the text of an HTML document.
///
/// Scripts, styles and comments are dropped. Every text run between two tags is
/// entity-decoded and trimmed, and the non-empty runs are concatenated without a
/// separator.
///
/// ```
/// use plugin_apis::services::link_reader::html_to_text;
///
/// let html = "<p> Fish &amp; chips </p><script>var x;</script><b>today</b>";
/// assert_eq!(html_to_text(html), "Fish & chipstoday");
/// ```
pub fn html_to_text(html: &str) -> String {
    let visible = NON_TEXT_BLOCK.replace_all(html, "");
    TAG.split(&visible)
        .map(decode_entities)
        .filter_map(|run| {
            let trimmed = run.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let ch = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        char::from_u32(u32::from_str_radix(hex, 16).ok()?)?
    } else if let Some(dec) = entity.strip_prefix('#') {
        char::from_u32(dec.parse().ok()?)?
    } else {
        match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            "copy" => '©',
            "reg" => '®',
            "hellip" => '…',
            "mdash" => '—',
            "ndash" => '–',
            _ => return None,
        }
    };
    Some(ch.to_string())
}
