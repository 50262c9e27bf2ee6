//! Support for creating an Atom feed from a list of posts.

use crate::config::Author;
use crate::post::Post;
use crate::summary;
use atom_syndication::{Entry, Error as AtomError, Feed, Link, Person};
use chrono::{FixedOffset, TimeZone, Utc};
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Author,
    /// The feed's alternate link, i.e. the landing page.
    pub home_page: Url,
    /// The base URL for post detail pages, from which entry links are
    /// derived.
    pub blog_url: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s and writes the result to a [`std::io::Write`]. Entries appear
/// most recent first regardless of the input order. This function takes
/// ownership of the provided [`FeedConfig`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

fn feed(config: FeedConfig, posts: &[Post]) -> Feed {
    Feed {
        entries: feed_entries(&config, posts),
        title: config.title.into(),
        id: config.id,
        updated: FixedOffset::east(0).from_utc_datetime(&Utc::now().naive_utc()),
        authors: vec![author_to_person(&config.author)],
        categories: Vec::new(),
        contributors: Vec::new(),
        generator: None,
        icon: None,
        logo: None,
        rights: None,
        subtitle: None,
        base: None,
        lang: None,
        extensions: Default::default(),
        namespaces: Default::default(),
        links: vec![Link {
            href: config.home_page.to_string(),
            rel: "alternate".to_string(),
            title: None,
            hreflang: None,
            mime_type: None,
            length: None,
        }],
    }
}

fn feed_entries(config: &FeedConfig, posts: &[Post]) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::with_capacity(posts.len());

    for post in summary::sort_by_date_desc(posts) {
        // Post dates are naive; the feed presents them at UTC.
        let date = FixedOffset::east(0).from_utc_datetime(&post.published);

        // Slugs come from file names, so the join always succeeds.
        let url = config
            .blog_url
            .join(&format!("{}.html", post.slug))
            .unwrap();

        entries.push(Entry {
            id: url.to_string(),
            title: post.title.clone().into(),
            updated: date,
            authors: vec![author_to_person(&config.author)],
            links: vec![Link {
                href: url.to_string(),
                rel: "alternate".to_owned(),
                title: None,
                mime_type: None,
                hreflang: None,
                length: None,
            }],
            rights: None,
            summary: Some(post.description.clone().into()),
            categories: Vec::new(),
            contributors: Vec::new(),
            published: Some(date),
            source: None,
            content: None,
            extensions: Default::default(),
        })
    }
    entries
}

fn author_to_person(author: &Author) -> Person {
    Person {
        name: author.name.clone(),
        email: author.email.clone(),
        uri: None,
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn fixture_post(slug: &str, title: &str, date: &str) -> Post {
        Post {
            slug: slug.to_owned(),
            title: title.to_owned(),
            description: format!("{}-description", slug),
            published: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms(0, 0, 0),
            tags: Vec::new(),
            draft: false,
            body: String::new(),
        }
    }

    fn fixture_config() -> FeedConfig {
        FeedConfig {
            title: "DESIGNER.BLOG".to_owned(),
            id: "https://example.com/".to_owned(),
            author: Author {
                name: "方植贤".to_owned(),
                email: None,
            },
            home_page: Url::parse("https://example.com/").unwrap(),
            blog_url: Url::parse("https://example.com/blog/").unwrap(),
        }
    }

    #[test]
    fn test_write_feed() {
        let posts = vec![
            fixture_post("older", "旧文", "2024-01-01"),
            fixture_post("newer", "新文", "2024-03-01"),
        ];

        let mut out = Vec::new();
        write_feed(fixture_config(), &posts, &mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains("<feed"));
        assert!(xml.contains("https://example.com/blog/newer.html"));

        // entries come most recent first regardless of input order
        let newer = xml.find("新文").unwrap();
        let older = xml.find("旧文").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn test_entry_fields() {
        let entries = feed_entries(&fixture_config(), &[fixture_post("a", "标题", "2024-01-15")]);
        assert_eq!(1, entries.len());
        assert_eq!("https://example.com/blog/a.html", entries[0].id);
        assert_eq!("标题", entries[0].title.value);
        assert_eq!(
            Some("a-description".to_owned()),
            entries[0].summary.clone().map(|summary| summary.value)
        );
        assert_eq!("方植贤", entries[0].authors[0].name);
    }
}
