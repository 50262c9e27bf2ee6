//! Conversions from domain types into [`gtmpl_value::Value`]s. Everything
//! the templates can see is assembled here or in [`crate::write`]; the pure
//! core in [`crate::summary`] stays free of template types.

use crate::config::{Contact, Site};
use crate::summary::PostSummary;
use crate::write::{NavLink, TagLink};
use gtmpl_value::Value;
use std::collections::HashMap;
use url::Url;

/// Builds the template value for a post card: every [`PostSummary`] field
/// plus the post page URL, which only the rendering layer knows how to
/// derive.
pub fn summary_value(summary: &PostSummary, blog_url: &Url) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("slug".to_owned(), (&summary.slug).into());
    m.insert("title".to_owned(), (&summary.title).into());
    m.insert("excerpt".to_owned(), (&summary.excerpt).into());
    m.insert("date".to_owned(), (&summary.date).into());
    m.insert("tag".to_owned(), (&summary.tag).into());
    // Slugs come from file names, so the join always succeeds.
    let url = blog_url.join(&format!("{}.html", summary.slug)).unwrap();
    m.insert("url".to_owned(), Value::String(url.to_string()));
    Value::Object(m)
}

impl From<&Site> for Value {
    /// Converts the site metadata into a template value with the fields
    /// `name`, `title`, `description`, `author`, and `contacts`.
    fn from(site: &Site) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), (&site.name).into());
        m.insert("title".to_owned(), (&site.title).into());
        m.insert("description".to_owned(), (&site.description).into());
        m.insert("author".to_owned(), (&site.author.name).into());
        m.insert(
            "contacts".to_owned(),
            Value::Array(site.contacts.iter().map(Value::from).collect()),
        );
        Value::Object(m)
    }
}

impl From<&Contact> for Value {
    /// Converts a contact link into a template value. `external` is derived
    /// here so the templates need nothing beyond simple conditionals;
    /// external links get `target="_blank"` treatment.
    fn from(contact: &Contact) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("platform".to_owned(), (&contact.platform).into());
        m.insert("label".to_owned(), (&contact.label).into());
        m.insert("href".to_owned(), (&contact.href).into());
        m.insert(
            "external".to_owned(),
            Value::from(contact.href.starts_with("http")),
        );
        Value::Object(m)
    }
}

impl From<&NavLink> for Value {
    fn from(link: &NavLink) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), (&link.name).into());
        m.insert("url".to_owned(), Value::String(link.url.to_string()));
        m.insert("active".to_owned(), Value::from(link.active));
        Value::Object(m)
    }
}

impl From<&TagLink> for Value {
    fn from(link: &TagLink) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), (&link.name).into());
        m.insert("url".to_owned(), Value::String(link.url.to_string()));
        m.insert("active".to_owned(), Value::from(link.active));
        Value::Object(m)
    }
}
