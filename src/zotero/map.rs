use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::untl::UntlRecord;

use super::{ITEM_TYPE_PRESENTATION, Presenter, ZoteroItem};

const PUBLIC_ACCESS_URI: &str = "https://digital2.library.unt.edu/vocabularies/rights-access/#public";
const PRESENTATION_RESOURCE_TYPE: &str = "image_presentation";

/// Meeting name ending in a year, optionally followed by ", Locality".
static MEETING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<meeting>.*\d{4})(?:[,.] (?P<locality>[^0-9]+))?")
        .expect("meeting pattern is valid")
});

/// Map one UNTL record to a Zotero presentation item.
pub fn map_record(record: &UntlRecord) -> ZoteroItem {
    if let Some(resource_type) = record.first_text("meta", "resourceType")
        && resource_type != PRESENTATION_RESOURCE_TYPE
    {
        debug!(
            "Mapping {} resource as a presentation: {}",
            resource_type,
            record.identifier.as_deref().unwrap_or("<unknown>")
        );
    }

    let (meeting_name, locality) = extract_meeting(record);

    ZoteroItem {
        item_type: ITEM_TYPE_PRESENTATION,
        about_uri: record.last_text("identifier", "itemURL").map(String::from),
        title: record.first_text("title", "officialtitle").map(String::from),
        presenters: extract_presenters(record),
        subjects: record.texts("subject").map(String::from).collect(),
        abstract_note: record.first_text("description", "content").map(String::from),
        date: record.creation_date().map(String::from),
        languages: record.texts("language").map(String::from).collect(),
        rights: extract_access(record),
        description: extract_related(record),
        meeting_name,
        locality,
    }
}

fn extract_presenters(record: &UntlRecord) -> Vec<Presenter> {
    record
        .elements("creator")
        .iter()
        .filter(|creator| creator.child("type") == Some("per"))
        .filter_map(|creator| creator.child("name"))
        .map(Presenter::from_name)
        .collect()
}

fn extract_access(record: &UntlRecord) -> Option<String> {
    record
        .first_text("rights", "access")
        .map(|access| match access {
            "public" => PUBLIC_ACCESS_URI.to_string(),
            other => other.to_string(),
        })
}

fn extract_related(record: &UntlRecord) -> Option<String> {
    let description: String = record
        .texts("relation")
        .map(|relation| format!("Related to: {relation}.\n"))
        .collect();

    (!description.is_empty()).then_some(description)
}

fn extract_meeting(record: &UntlRecord) -> (Option<String>, Option<String>) {
    let Some(conference) = record.last_text("source", "conference") else {
        return (None, None);
    };
    let Some(captures) = MEETING_PATTERN.captures(conference) else {
        return (None, None);
    };

    let meeting = captures
        .name("meeting")
        .map(|m| m.as_str().to_string())
        .filter(|m| !m.is_empty());
    let locality = captures
        .name("locality")
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .filter(|l| !l.is_empty());

    (meeting, locality)
}
