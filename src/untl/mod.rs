mod parse;

use std::collections::BTreeMap;

pub use parse::parse_collection;

/// One harvested UNTL record: the OAI header fields plus the UNTL elements
/// grouped by field name, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UntlRecord {
    pub identifier: Option<String>,
    pub datestamp: Option<String>,
    fields: BTreeMap<String, Vec<UntlElement>>,
}

impl UntlRecord {
    pub fn new(identifier: Option<String>, datestamp: Option<String>) -> Self {
        Self {
            identifier,
            datestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_element(mut self, field: impl Into<String>, element: UntlElement) -> Self {
        self.fields.entry(field.into()).or_default().push(element);
        self
    }

    pub fn elements(&self, field: &str) -> &[UntlElement] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn qualified<'a, 'q>(
        &'a self,
        field: &str,
        qualifier: &'q str,
    ) -> impl Iterator<Item = &'a UntlElement> {
        self.elements(field)
            .iter()
            .filter(move |element| element.qualifier.as_deref() == Some(qualifier))
    }

    /// Non-empty text values of a field, any qualifier.
    pub fn texts<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a str> {
        self.elements(field).iter().filter_map(UntlElement::text)
    }

    pub fn first_text(&self, field: &str, qualifier: &str) -> Option<&str> {
        self.qualified(field, qualifier)
            .filter_map(UntlElement::text)
            .next()
    }

    pub fn last_text(&self, field: &str, qualifier: &str) -> Option<&str> {
        self.qualified(field, qualifier)
            .filter_map(UntlElement::text)
            .last()
    }

    /// The first non-empty `date` qualified `creation`.
    pub fn creation_date(&self) -> Option<&str> {
        self.first_text("date", "creation")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntlElement {
    pub qualifier: Option<String>,
    pub content: UntlContent,
}

/// Leaf elements carry text; structured ones (creator, publisher, ...)
/// carry their child values keyed by local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntlContent {
    Text(String),
    Children(Vec<(String, String)>),
}

impl UntlElement {
    pub fn leaf(qualifier: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.map(ToString::to_string),
            content: UntlContent::Text(value.into()),
        }
    }

    pub fn structured(qualifier: Option<&str>, children: &[(&str, &str)]) -> Self {
        Self {
            qualifier: qualifier.map(ToString::to_string),
            content: UntlContent::Children(
                children
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            ),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            UntlContent::Text(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<&str> {
        match &self.content {
            UntlContent::Children(children) => children
                .iter()
                .find(|(child, value)| child == name && !value.is_empty())
                .map(|(_, value)| value.as_str()),
            UntlContent::Text(_) => None,
        }
    }
}
