use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use tempfile::NamedTempFile;
use tracing::debug;

use super::ZoteroItem;

pub const DEFAULT_OUTPUT: &str = "zotero_rdf.xml";

const NAMESPACES: [(&str, &str); 7] = [
    ("xmlns:rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("xmlns:z", "http://www.zotero.org/namespaces/export#"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:vcard", "http://nwalsh.com/rdf/vCard#"),
    ("xmlns:foaf", "http://xmlns.com/foaf/0.1/"),
    ("xmlns:dcterms", "http://purl.org/dc/terms/"),
    ("xmlns:bib", "http://purl.org/net/biblio#"),
];

type XmlWriter = Writer<Vec<u8>>;

/// Render items as a Zotero RDF document, one `bib:ConferenceProceedings`
/// per item in input order.
pub fn render(items: &[ZoteroItem]) -> anyhow::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("rdf:RDF").with_attributes(NAMESPACES),
    ))?;
    for (index, item) in items.iter().enumerate() {
        write_item(&mut writer, item, index)?;
    }
    writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;

    let mut document = writer.into_inner();
    document.push(b'\n');
    Ok(document)
}

/// Render and write atomically: the document goes to a temporary file
/// next to `path`, which is then renamed over it.
pub fn write(items: &[ZoteroItem], path: &Path) -> anyhow::Result<PathBuf> {
    let document = render(items)?;

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to write Zotero RDF to {}", path.display()))?;
    file.write_all(&document)
        .with_context(|| format!("Failed to write Zotero RDF to {}", path.display()))?;
    file.as_file().sync_all()?;
    file.persist(path)
        .with_context(|| format!("Failed to write Zotero RDF to {}", path.display()))?;

    debug!("Wrote {} bytes to {}", document.len(), path.display());
    Ok(path.to_path_buf())
}

fn write_item(writer: &mut XmlWriter, item: &ZoteroItem, index: usize) -> anyhow::Result<()> {
    let about = match &item.about_uri {
        Some(uri) => uri.clone(),
        None => format!("#item_{}", index + 1),
    };
    let element = "bib:ConferenceProceedings";
    writer.write_event(Event::Start(
        BytesStart::new(element).with_attributes([("rdf:about", about.as_str())]),
    ))?;

    text_element(writer, "z:itemType", item.item_type)?;

    if let Some(locality) = &item.locality {
        let path = [
            "dc:publisher",
            "foaf:Organization",
            "vcard:adr",
            "vcard:Address",
        ];
        for name in path {
            start(writer, name)?;
        }
        text_element(writer, "vcard:locality", locality)?;
        for name in path.iter().rev() {
            end(writer, name)?;
        }
    }

    if !item.presenters.is_empty() {
        start(writer, "z:presenters")?;
        start(writer, "rdf:Seq")?;
        for presenter in &item.presenters {
            start(writer, "rdf:li")?;
            start(writer, "foaf:Person")?;
            text_element(writer, "foaf:surname", &presenter.surname)?;
            text_element(writer, "foaf:givenName", &presenter.given_name)?;
            end(writer, "foaf:Person")?;
            end(writer, "rdf:li")?;
        }
        end(writer, "rdf:Seq")?;
        end(writer, "z:presenters")?;
    }

    for subject in &item.subjects {
        text_element(writer, "dc:subject", subject)?;
    }
    optional_element(writer, "dc:title", &item.title)?;
    optional_element(writer, "dcterms:abstract", &item.abstract_note)?;
    optional_element(writer, "dc:date", &item.date)?;
    for language in &item.languages {
        text_element(writer, "z:language", language)?;
    }

    if let Some(uri) = &item.about_uri {
        start(writer, "dc:identifier")?;
        start(writer, "dcterms:URI")?;
        text_element(writer, "rdf:value", uri)?;
        end(writer, "dcterms:URI")?;
        end(writer, "dc:identifier")?;
    }

    optional_element(writer, "dc:rights", &item.rights)?;
    optional_element(writer, "dc:description", &item.description)?;
    optional_element(writer, "z:meetingName", &item.meeting_name)?;

    end(writer, element)
}

fn start(writer: &mut XmlWriter, name: &str) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> anyhow::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> anyhow::Result<()> {
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    end(writer, name)
}

fn optional_element(
    writer: &mut XmlWriter,
    name: &str,
    value: &Option<String>,
) -> anyhow::Result<()> {
    match value {
        Some(value) => text_element(writer, name, value),
        None => Ok(()),
    }
}
