use std::path::PathBuf;

use quick_xml::{
    Reader,
    escape::{escape, unescape},
    events::{BytesStart, Event},
};
use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "https://digital.library.unt.edu";
pub const DEFAULT_CACHE_FILE: &str = "cached_untl_metadata.xml";
pub const UNTL_METADATA_PREFIX: &str = "untl";

/// OAI error code for an empty result set; not a failure.
pub const NO_RECORDS_MATCH: &str = "noRecordsMatch";

#[derive(Debug, Clone)]
pub struct OaiConfig {
    pub cache_file: PathBuf,
    pub base_url: String,
    pub collection: String,
    pub metadata_prefix: String,
    pub oai_timeout: u64,
}

impl OaiConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/explore/collections/{}/oai/",
            self.base_url.trim_end_matches('/'),
            self.collection
        )
    }

    /// First page by metadata prefix, later pages by resumption token only.
    pub fn list_records_url(&self, resumption_token: Option<&str>) -> anyhow::Result<Url> {
        let endpoint = self.endpoint();
        let url = match resumption_token {
            Some(token) => Url::parse_with_params(
                &endpoint,
                [("verb", "ListRecords"), ("resumptionToken", token)],
            ),
            None => Url::parse_with_params(
                &endpoint,
                [
                    ("verb", "ListRecords"),
                    ("metadataPrefix", self.metadata_prefix.as_str()),
                ],
            ),
        };
        url.map_err(|e| anyhow::anyhow!("invalid OAI endpoint {}: {}", endpoint, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiError {
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for OaiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// What the harvest loop needs to know about one ListRecords response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub records: usize,
    pub resumption_token: Option<String>,
    pub error: Option<OaiError>,
}

/// Scan a response for records, its resumption token and any OAI error.
/// Fails when the response is not well-formed XML.
pub fn inspect_page(xml: &str) -> anyhow::Result<PageInfo> {
    let mut reader = Reader::from_str(xml);
    let mut info = PageInfo::default();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut text = String::new();
    let mut error_code: Option<String> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => anyhow::bail!(
                "malformed XML near byte {}: {}",
                reader.buffer_position(),
                e
            ),
        };

        match event {
            Event::Start(e) => {
                depth += 1;
                saw_root = true;
                text.clear();
                match e.local_name().as_ref() {
                    b"record" => info.records += 1,
                    b"error" => error_code = Some(code(&e)?),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                match e.local_name().as_ref() {
                    b"record" => info.records += 1,
                    b"error" => {
                        info.error.get_or_insert(OaiError {
                            code: code(&e)?,
                            message: String::new(),
                        });
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"resumptionToken" => {
                        let token = text.trim();
                        if !token.is_empty() {
                            info.resumption_token = Some(token.to_string());
                        }
                    }
                    b"error" => {
                        if let Some(code) = error_code.take() {
                            info.error.get_or_insert(OaiError {
                                code,
                                message: text.trim().to_string(),
                            });
                        }
                    }
                    _ => {}
                }
                text.clear();
            }
            Event::Text(t) => text.push_str(&unescape(&String::from_utf8_lossy(t.as_ref()))?),
            Event::GeneralRef(r) => text.push_str(&unescape(&format!(
                "&{};",
                String::from_utf8_lossy(r.as_ref())
            ))?),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root || depth != 0 {
        anyhow::bail!("malformed XML: incomplete document");
    }
    Ok(info)
}

/// Join response bodies into one harvest document under a `<harvest>`
/// root, dropping each page's XML declaration.
pub fn wrap_pages(collection: &str, pages: &[String]) -> String {
    let mut document = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    document.push_str(&format!("<harvest collection=\"{}\">\n", escape(collection)));
    for page in pages {
        document.push_str(strip_declaration(page).trim());
        document.push('\n');
    }
    document.push_str("</harvest>\n");
    document
}

fn strip_declaration(page: &str) -> &str {
    let page = page.trim_start_matches('\u{feff}').trim_start();
    page.strip_prefix("<?xml")
        .and_then(|rest| rest.split_once("?>"))
        .map(|(_, body)| body)
        .unwrap_or(page)
}

fn code(e: &BytesStart<'_>) -> anyhow::Result<String> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"code" {
            return Ok(String::from_utf8_lossy(attr.value.as_ref()).into_owned());
        }
    }
    Ok(String::new())
}
