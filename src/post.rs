//! Defines the [`Post`] content record and the logic for loading records
//! from source files. A post source file is YAML frontmatter between `---`
//! fences followed by a markdown body:
//!
//! ```text
//! ---
//! title: 你好，世界
//! description: 第一篇文章
//! pubDate: 2024-01-15
//! tags: [技术]
//! ---
//! 正文从这里开始。
//! ```
//!
//! `title` and `description` are required. `pubDate` accepts either a
//! calendar date (taken as midnight) or a date-time. `tags` defaults to the
//! empty list and `draft` to `false`. The markdown body is rendered to HTML
//! at load time, so the rest of the pipeline only ever sees HTML.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pulldown_cmark::{html, Options, Parser};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs::{read_dir, File};
use std::io::prelude::*;
use std::path::{Path, PathBuf};

/// A single blog entry as supplied by the posts directory. This is the raw
/// record; the display projection lives in [`crate::summary`].
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// Unique identifier, taken from the source file name less the `.md`
    /// extension.
    pub slug: String,

    /// The post title.
    pub title: String,

    /// A short description, used as the card excerpt and the feed summary.
    pub description: String,

    /// The publish date. Posts are presented most recent first.
    pub published: NaiveDateTime,

    /// The tag list in frontmatter order; the first entry is the post's
    /// display tag. May be empty.
    pub tags: Vec<String>,

    /// Draft posts are skipped by [`load_posts`] unless drafts are requested.
    /// Nothing downstream of loading consults this flag.
    pub draft: bool,

    /// The post body, already rendered from markdown to HTML.
    pub body: String,
}

/// The frontmatter schema. Field names mirror the source files, hence the
/// `pubDate` rename.
#[derive(Deserialize)]
struct Frontmatter {
    title: String,
    description: String,
    #[serde(rename = "pubDate", deserialize_with = "deserialize_date")]
    pub_date: NaiveDateTime,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    draft: bool,
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(|e| D::Error::custom(format!("date `{}`: {}", raw, e)))
}

/// Parses a frontmatter date. Accepted forms, tried in order: `YYYY-MM-DD`
/// (taken as midnight), `YYYY-MM-DDTHH:MM:SS` with optional fractional
/// seconds (a trailing `Z` is ignored), and `YYYY-MM-DD HH:MM:SS`.
fn parse_date(raw: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim().trim_end_matches('Z');
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(NaiveDateTime::new(date, NaiveTime::from_hms(0, 0, 0)));
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(datetime);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
}

impl Post {
    /// Parses a post from its slug and source text. The text must begin with
    /// a `---` fence, followed by YAML frontmatter, a closing `---` fence,
    /// and the markdown body.
    pub fn from_str(slug: &str, input: &str) -> Result<Post> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::MissingOpeningFence);
            }
            match input[FENCE.len()..].find(FENCE) {
                None => Err(Error::MissingClosingFence),
                Some(offset) => Ok((
                    FENCE.len(),                        // yaml_start
                    FENCE.len() + offset,               // yaml_stop
                    FENCE.len() + offset + FENCE.len(), // body_start
                )),
            }
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let mut body = String::new();
        html::push_html(
            &mut body,
            Parser::new_ext(&input[body_start..], markdown_options()),
        );

        Ok(Post {
            slug: slug.to_owned(),
            title: frontmatter.title,
            description: frontmatter.description,
            published: frontmatter.pub_date,
            tags: frontmatter.tags,
            draft: frontmatter.draft,
            body,
        })
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

const MARKDOWN_EXTENSION: &str = ".md";

/// Scans `dir` for `*.md` files and returns one [`Post`] per file. The slug
/// is the file name less the extension. Records marked `draft: true` are
/// dropped unless `include_drafts` is set.
pub fn load_posts(dir: &Path, include_drafts: bool) -> Result<Vec<Post>> {
    let mut entries: Vec<(String, PathBuf)> = Vec::new();
    for result in read_dir(dir)? {
        let entry = result?;
        let os_file_name = entry.file_name();
        let file_name = os_file_name.to_string_lossy();
        if file_name.ends_with(MARKDOWN_EXTENSION) {
            entries.push((file_name.to_string(), entry.path()));
        }
    }

    // `read_dir` order varies by platform; file name order keeps the record
    // order deterministic, which first-seen tag ordering depends on.
    entries.sort();

    let mut posts = Vec::new();
    for (file_name, path) in entries {
        let slug = file_name.trim_end_matches(MARKDOWN_EXTENSION);
        let post = parse_post(slug, &path)?;
        if post.draft && !include_drafts {
            continue;
        }
        posts.push(post);
    }
    Ok(posts)
}

fn parse_post(slug: &str, path: &Path) -> Result<Post> {
    match read_post(slug, path) {
        Ok(post) => Ok(post),
        Err(e) => Err(Error::Annotated(
            format!("parsing post `{}`", path.display()),
            Box::new(e),
        )),
    }
}

fn read_post(slug: &str, path: &Path) -> Result<Post> {
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    Post::from_str(slug, &contents)
}

/// An alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents the errors that can occur while loading posts.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source doesn't begin with a `---` fence.
    MissingOpeningFence,

    /// Returned when the frontmatter's closing `---` fence is missing.
    MissingClosingFence,

    /// Represents frontmatter deserialization errors.
    DeserializeYaml(serde_yaml::Error),

    /// Represents I/O errors reading post files.
    Io(std::io::Error),

    /// Wraps an error with the context in which it occurred.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingOpeningFence => write!(f, "Post must begin with `---`"),
            Error::MissingClosingFence => write!(f, "Missing closing `---`"),
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingOpeningFence => None,
            Error::MissingClosingFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`enum@Error`]. This allows
    /// us to use the `?` operator.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`enum@Error`]. This allows us
    /// to use the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Test binaries are not guaranteed a working directory, so fixture
    // paths are anchored to the crate root.
    fn posts_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/site/posts")
    }

    #[test]
    fn test_from_str() {
        let input = "---
title: 你好，世界
description: 第一篇文章
pubDate: 2024-01-15
tags: [技术, 随笔]
---
正文从这里开始。
";
        let post = Post::from_str("hello-world", input).unwrap();
        assert_eq!("hello-world", post.slug);
        assert_eq!("你好，世界", post.title);
        assert_eq!("第一篇文章", post.description);
        assert_eq!(
            "2024-01-15 00:00:00",
            post.published.format("%Y-%m-%d %H:%M:%S").to_string()
        );
        assert_eq!(vec!["技术", "随笔"], post.tags);
        assert!(!post.draft);
        assert!(post.body.contains("<p>正文从这里开始。</p>"));
    }

    #[test]
    fn test_from_str_defaults() {
        let input = "---
title: 一些生活碎片
description: 没有标签的一篇
pubDate: 2023-12-20
---
冬天的清晨适合散步。
";
        let post = Post::from_str("life-notes", input).unwrap();
        assert!(post.tags.is_empty());
        assert!(!post.draft);
    }

    #[test]
    fn test_from_str_draft() {
        let input = "---
title: 草稿
description: 未完成
pubDate: 2024-04-01
draft: true
---
还没写完。
";
        assert!(Post::from_str("draft-note", input).unwrap().draft);
    }

    #[test]
    fn test_from_str_missing_opening_fence() {
        match Post::from_str("x", "title: 没有围栏") {
            Err(Error::MissingOpeningFence) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_str_missing_closing_fence() {
        match Post::from_str("x", "---\ntitle: 没有结束围栏") {
            Err(Error::MissingClosingFence) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let format = |dt: NaiveDateTime| dt.format("%Y-%m-%d %H:%M:%S").to_string();
        assert_eq!(
            "2024-01-15 00:00:00",
            format(parse_date("2024-01-15").unwrap())
        );
        assert_eq!(
            "2024-01-15 08:30:00",
            format(parse_date("2024-01-15T08:30:00").unwrap())
        );
        assert_eq!(
            "2024-01-15 08:30:00",
            format(parse_date("2024-01-15T08:30:00.000Z").unwrap())
        );
        assert_eq!(
            "2024-01-15 08:30:00",
            format(parse_date("2024-01-15 08:30:00").unwrap())
        );
        assert!(parse_date("后天").is_err());
    }

    #[test]
    fn test_load_posts() {
        let posts = load_posts(&posts_dir(), false).unwrap();
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        // file name order, with the draft dropped
        assert_eq!(
            vec!["hello-world", "life-notes", "minimal-design", "rust-rewrite"],
            slugs
        );
    }

    #[test]
    fn test_load_posts_with_drafts() {
        let posts = load_posts(&posts_dir(), true).unwrap();
        assert_eq!(5, posts.len());
        assert!(posts.iter().any(|p| p.slug == "draft-note" && p.draft));
    }
}
