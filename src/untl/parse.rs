use quick_xml::{
    Reader,
    escape::unescape,
    events::{BytesStart, Event},
};
use tracing::debug;

use super::{UntlContent, UntlElement, UntlRecord};

/// Parse a harvest document (or a single OAI-PMH response) into UNTL
/// records, in document order. Records without a metadata payload are
/// skipped.
pub fn parse_collection(xml: &str) -> anyhow::Result<Vec<UntlRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut parser = CollectionParser::default();

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
            Event::Start(e) => parser.start(&e)?,
            Event::Empty(e) => {
                parser.start(&e)?;
                parser.end();
            }
            Event::End(_) => parser.end(),
            Event::Text(t) => parser.text(&String::from_utf8_lossy(t.as_ref()))?,
            Event::GeneralRef(r) => {
                parser.text(&format!("&{};", String::from_utf8_lossy(r.as_ref())))?
            }
            Event::CData(c) => parser.text_raw(&String::from_utf8_lossy(c.as_ref())),
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}

#[derive(Default)]
struct CollectionParser {
    depth: usize,
    saw_root: bool,
    text: String,
    record: Option<PendingRecord>,
    records: Vec<UntlRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Header,
    Metadata,
}

/// Depths below are relative to the OAI `<record>` element:
/// 1 = header/metadata, 2 = header child or UNTL root,
/// 3 = UNTL field, 4 = structured field child.
struct PendingRecord {
    depth: usize,
    section: Section,
    has_metadata: bool,
    record: UntlRecord,
    field: Option<PendingField>,
    child: Option<String>,
}

struct PendingField {
    name: String,
    qualifier: Option<String>,
    children: Vec<(String, String)>,
}

impl PendingRecord {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            section: Section::Other,
            has_metadata: false,
            record: UntlRecord::default(),
            field: None,
            child: None,
        }
    }

    fn push_field(&mut self, field: PendingField, text: String) {
        let content = if field.children.is_empty() {
            UntlContent::Text(text)
        } else {
            UntlContent::Children(field.children)
        };
        let element = UntlElement {
            qualifier: field.qualifier,
            content,
        };
        let record = std::mem::take(&mut self.record);
        self.record = record.with_element(field.name, element);
    }
}

impl CollectionParser {
    fn start(&mut self, e: &BytesStart<'_>) -> anyhow::Result<()> {
        self.depth += 1;
        self.saw_root = true;
        self.text.clear();

        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        let Some(pending) = self.record.as_mut() else {
            if name == "record" {
                self.record = Some(PendingRecord::new(self.depth));
            }
            return Ok(());
        };

        match (self.depth - pending.depth, pending.section) {
            (1, _) => {
                pending.section = match name.as_str() {
                    "header" => Section::Header,
                    "metadata" => Section::Metadata,
                    _ => Section::Other,
                };
            }
            (2, Section::Header) => pending.child = Some(name),
            (2, Section::Metadata) => pending.has_metadata = true,
            (3, Section::Metadata) => {
                pending.field = Some(PendingField {
                    name,
                    qualifier: attribute(e, b"qualifier")?,
                    children: Vec::new(),
                });
            }
            (4, Section::Metadata) if pending.field.is_some() => pending.child = Some(name),
            _ => {}
        }

        Ok(())
    }

    fn end(&mut self) {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);
        let text = std::mem::take(&mut self.text).trim().to_string();

        let Some(pending) = self.record.as_mut() else {
            return;
        };

        match (depth - pending.depth, pending.section) {
            (0, _) => {
                if let Some(done) = self.record.take() {
                    self.finish_record(done);
                }
            }
            (1, _) => pending.section = Section::Other,
            (2, Section::Header) => match pending.child.take().as_deref() {
                Some("identifier") => pending.record.identifier = Some(text),
                Some("datestamp") => pending.record.datestamp = Some(text),
                _ => {}
            },
            (3, Section::Metadata) => {
                if let Some(field) = pending.field.take() {
                    pending.push_field(field, text);
                }
            }
            (4, Section::Metadata) => {
                if let (Some(field), Some(child)) = (pending.field.as_mut(), pending.child.take())
                {
                    field.children.push((child, text));
                }
            }
            _ => {}
        }
    }

    fn finish_record(&mut self, pending: PendingRecord) {
        if pending.has_metadata {
            self.records.push(pending.record);
        } else {
            debug!(
                "Skipping record without metadata: {}",
                pending.record.identifier.as_deref().unwrap_or("<unknown>")
            );
        }
    }

    fn text(&mut self, raw: &str) -> anyhow::Result<()> {
        let decoded = unescape(raw)?;
        self.text.push_str(&decoded);
        Ok(())
    }

    fn text_raw(&mut self, raw: &str) {
        self.text.push_str(raw);
    }

    fn finish(self) -> anyhow::Result<Vec<UntlRecord>> {
        if !self.saw_root {
            anyhow::bail!("malformed XML: document has no root element");
        }
        if self.depth != 0 {
            anyhow::bail!("malformed XML: {} element(s) left unclosed", self.depth);
        }
        Ok(self.records)
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> anyhow::Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            let raw = String::from_utf8_lossy(attr.value.as_ref());
            return Ok(Some(unescape(&raw)?.into_owned()));
        }
    }
    Ok(None)
}
