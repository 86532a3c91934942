#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use quick_xml::{Reader, escape::unescape, events::Event};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use untl2zotero::{ConvertConfig, Converter, OaiConfig, RunSummary, UNTL_METADATA_PREFIX};

pub const COLLECTION: &str = "UNTMDP";
pub const DEFAULT_DATESTAMP: &str = "2025-06-01";

#[derive(Clone)]
pub enum MockOaiMode {
    /// Record XML per page; every page but the last carries a token.
    Pages(Vec<Vec<String>>),
    OaiError(String),
    HttpStatus(u16),
    Malformed,
    RepeatToken,
}

pub struct MockOaiServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl MockOaiServer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Drop for MockOaiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct RecordSpec<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub creators: &'a [&'a str],
    pub date: Option<&'a str>,
}

impl<'a> RecordSpec<'a> {
    pub fn new(id: &'a str, title: &'a str) -> Self {
        Self {
            id,
            title,
            creators: &[],
            date: None,
        }
    }

    pub fn creators(mut self, creators: &'a [&'a str]) -> Self {
        self.creators = creators;
        self
    }

    pub fn date(mut self, date: &'a str) -> Self {
        self.date = Some(date);
        self
    }
}

/// One OAI `<record>` carrying a UNTL presentation.
pub fn untl_record(spec: &RecordSpec<'_>) -> String {
    let creators: String = spec
        .creators
        .iter()
        .map(|name| {
            format!(
                "<untl:creator qualifier=\"aut\"><untl:type>per</untl:type><untl:name>{}</untl:name></untl:creator>",
                escape(name)
            )
        })
        .collect();
    let date = spec
        .date
        .map(|date| format!("<untl:date qualifier=\"creation\">{date}</untl:date>"))
        .unwrap_or_default();

    format!(
        r#"<record>
  <header>
    <identifier>info:ark/67531/{id}</identifier>
    <datestamp>{DEFAULT_DATESTAMP}</datestamp>
  </header>
  <metadata>
    <untl:metadata xmlns:untl="http://digital2.library.unt.edu/untl/">
      <untl:title qualifier="officialtitle">{title}</untl:title>
      {creators}
      {date}
      <untl:language>eng</untl:language>
      <untl:rights qualifier="access">public</untl:rights>
      <untl:source qualifier="conference">Texas Conference on Digital Libraries 2025, Austin, Texas</untl:source>
      <untl:identifier qualifier="itemURL">https://digital.library.unt.edu/ark:/67531/{id}/</untl:identifier>
      <untl:meta qualifier="resourceType">image_presentation</untl:meta>
    </untl:metadata>
  </metadata>
</record>"#,
        id = spec.id,
        title = escape(spec.title),
    )
}

pub fn deleted_record(id: &str) -> String {
    format!(
        r#"<record><header status="deleted"><identifier>info:ark/67531/{id}</identifier><datestamp>{DEFAULT_DATESTAMP}</datestamp></header></record>"#
    )
}

pub fn oai_config(base_url: &str, cache_file: PathBuf) -> OaiConfig {
    OaiConfig {
        cache_file,
        base_url: base_url.to_string(),
        collection: COLLECTION.to_string(),
        metadata_prefix: UNTL_METADATA_PREFIX.to_string(),
        oai_timeout: 10,
    }
}

pub async fn run_convert(
    base_url: &str,
    dir: &Path,
    year: Option<i32>,
    use_cache: bool,
) -> anyhow::Result<RunSummary> {
    let config = ConvertConfig {
        oai: oai_config(base_url, dir.join("cached_untl_metadata.xml")),
        output: dir.join("zotero_rdf.xml"),
        year,
        use_cache,
    };
    Converter::new(config)?.run().await
}

pub async fn start_mock_oai_server(mode: MockOaiMode) -> anyhow::Result<MockOaiServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    let base_url = format!("http://{}", address);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let requests_for_task = requests.clone();
    let shared_mode = Arc::new(mode);

    let handle = tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(value) => value,
                Err(_) => break,
            };
            let mode = shared_mode.clone();
            let requests = requests_for_task.clone();
            tokio::spawn(async move {
                if let Err(error) = handle_connection(&mut socket, &mode, &requests).await {
                    eprintln!("mock OAI server request handling failed: {}", error);
                }
            });
        }
    });

    Ok(MockOaiServer {
        base_url,
        requests,
        handle,
    })
}

async fn handle_connection(
    socket: &mut TcpStream,
    mode: &MockOaiMode,
    requests: &Mutex<Vec<String>>,
) -> anyhow::Result<()> {
    let mut buf = vec![0u8; 8192];
    let mut total = 0usize;

    loop {
        let bytes_read = socket.read(&mut buf[total..]).await?;
        if bytes_read == 0 {
            return Ok(());
        }
        total += bytes_read;
        if buf[..total].windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
        if total == buf.len() {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buf[..total]);
    let request_line = request.lines().next().unwrap_or_default();
    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    if let Ok(mut requests) = requests.lock() {
        requests.push(path.to_string());
    }

    let params = parse_query_params(path);
    let (status_code, body) = build_oai_response(mode, &params);
    let status_text = if status_code == 200 { "OK" } else { "ERROR" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_code,
        status_text,
        body.len(),
        body
    );

    socket.write_all(response.as_bytes()).await?;
    Ok(())
}

fn parse_query_params(path: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let query = path.split_once('?').map(|(_, query)| query).unwrap_or("");
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(key.to_string(), value.to_string());
    }
    params
}

fn build_oai_response(mode: &MockOaiMode, params: &HashMap<String, String>) -> (u16, String) {
    match mode {
        MockOaiMode::Pages(pages) => {
            let index = params
                .get("resumptionToken")
                .and_then(|token| token.strip_prefix("page-"))
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0);
            let records = pages.get(index).map(|r| r.join("\n")).unwrap_or_default();
            let token = if index + 1 < pages.len() {
                format!("<resumptionToken cursor=\"{index}\">page-{}</resumptionToken>", index + 1)
            } else {
                "<resumptionToken/>".to_string()
            };
            (200, list_records_response(&records, &token))
        }
        MockOaiMode::OaiError(code) => (200, error_response(code, "Request failed")),
        MockOaiMode::HttpStatus(status) => (*status, "server error".to_string()),
        MockOaiMode::Malformed => (200, "<OAI-PMH><ListRecords><record>".to_string()),
        MockOaiMode::RepeatToken => (
            200,
            list_records_response("", "<resumptionToken>same</resumptionToken>"),
        ),
    }
}

fn list_records_response(records: &str, token: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2025-06-01T00:00:00Z</responseDate>
  <request verb="ListRecords" metadataPrefix="untl">https://digital.library.unt.edu/explore/collections/{COLLECTION}/oai/</request>
  <ListRecords>
{records}
{token}
  </ListRecords>
</OAI-PMH>"#
    )
}

fn error_response(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2025-06-01T00:00:00Z</responseDate>
  <request verb="ListRecords">https://digital.library.unt.edu/explore/collections/{COLLECTION}/oai/</request>
  <error code="{code}">{message}</error>
</OAI-PMH>"#
    )
}

fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

/// The fields of one `bib:ConferenceProceedings`, read back from output.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RdfItem {
    pub about: String,
    pub title: Option<String>,
    pub presenters: Vec<(String, String)>,
    pub date: Option<String>,
}

pub fn read_rdf_items(xml: &str) -> anyhow::Result<Vec<RdfItem>> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<RdfItem> = None;
    let mut surname = String::new();
    let mut text = String::new();
    let mut depth = 0i32;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                text.clear();
                if e.name().as_ref() == b"bib:ConferenceProceedings" {
                    let about = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"rdf:about")
                        .map(|a| String::from_utf8_lossy(a.value.as_ref()).into_owned())
                        .unwrap_or_default();
                    current = Some(RdfItem {
                        about,
                        ..Default::default()
                    });
                }
            }
            Event::End(e) => {
                depth -= 1;
                let value = text.trim().to_string();
                if let Some(item) = current.as_mut() {
                    match e.name().as_ref() {
                        b"dc:title" => item.title = Some(value),
                        b"dc:date" => item.date = Some(value),
                        b"foaf:surname" => surname = value,
                        b"foaf:givenName" => {
                            item.presenters.push((std::mem::take(&mut surname), value))
                        }
                        b"bib:ConferenceProceedings" => items.extend(current.take()),
                        _ => {}
                    }
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

    anyhow::ensure!(depth == 0, "unbalanced RDF document");
    Ok(items)
}
