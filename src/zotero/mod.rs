mod map;
pub mod rdf;

pub use map::map_record;

pub const ITEM_TYPE_PRESENTATION: &str = "presentation";

/// A Zotero item built from exactly one UNTL record. Empty values are
/// left out of the RDF output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoteroItem {
    pub item_type: &'static str,
    pub about_uri: Option<String>,
    pub title: Option<String>,
    pub presenters: Vec<Presenter>,
    pub subjects: Vec<String>,
    pub abstract_note: Option<String>,
    pub date: Option<String>,
    pub languages: Vec<String>,
    pub rights: Option<String>,
    pub description: Option<String>,
    pub meeting_name: Option<String>,
    pub locality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presenter {
    pub surname: String,
    pub given_name: String,
}

impl Presenter {
    /// Split a "Surname, Given" personal name at its first comma.
    pub fn from_name(name: &str) -> Self {
        match name.split_once(',') {
            Some((surname, given_name)) => Self {
                surname: surname.trim().to_string(),
                given_name: given_name.trim().to_string(),
            },
            None => Self {
                surname: name.trim().to_string(),
                given_name: String::new(),
            },
        }
    }
}
