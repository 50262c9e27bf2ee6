//! Renders pages from [`Post`] sources: the landing page, the about page,
//! the post listing (one page per tag-filter selection), and one detail page
//! per post. Responsible for assembling template values, applying the gtmpl
//! templates, and writing the output files to disk.
//!
//! Every page value carries a shared set of fields injected by
//! [`Writer::write_page`] (site metadata, common URLs, the navigation bar,
//! the current year), so templates never need to know which page kind they
//! are rendering to draw the chrome.

use crate::config::Site;
use crate::post::Post;
use crate::summary::{self, PostSummary, ALL_TAG};
use crate::value::summary_value;
use chrono::{Datelike, NaiveDateTime, Utc};
use gtmpl::{Template, Value};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The navigation bar labels, in display order.
const NAV_HOME: &str = "首页";
const NAV_POSTS: &str = "文章";
const NAV_ABOUT: &str = "关于";

/// The navigation section a page belongs to, used to mark the matching
/// navigation link active. Post detail pages highlight the listing entry.
#[derive(Clone, Copy, PartialEq)]
enum Section {
    Home,
    Posts,
    About,
}

/// A navigation bar entry.
pub struct NavLink {
    pub name: String,
    pub url: Url,
    /// Whether the entry corresponds to the page being rendered.
    pub active: bool,
}

/// An entry in the listing page's tag filter control.
pub struct TagLink {
    pub name: String,
    pub url: Url,
    /// Whether the entry is the current selection.
    pub active: bool,
}

/// Responsible for assembling, templating, and writing HTML pages to disk
/// from [`Post`] sources.
pub struct Writer<'a> {
    /// The template for the landing page.
    pub home_template: &'a Template,

    /// The template for the about page.
    pub about_template: &'a Template,

    /// The template for listing pages: the unfiltered listing and one page
    /// per tag.
    pub list_template: &'a Template,

    /// The template for post detail pages.
    pub post_template: &'a Template,

    /// Site metadata injected into every page.
    pub site: &'a Site,

    /// The URL of the landing page, typically the destination for the
    /// site-header link.
    pub home_page: &'a Url,

    /// The base URL for listing and post pages. The unfiltered listing lives
    /// at `{blog_url}index.html`, the page for tag `t` at
    /// `{blog_url}tags/{slug}/index.html`, and the detail page for post `p`
    /// at `{blog_url}{slug}.html`.
    pub blog_url: &'a Url,

    /// The URL prefix for the theme's static assets, typically for the
    /// stylesheet.
    pub static_url: &'a Url,

    /// The URL of the Atom feed.
    pub atom_url: &'a Url,

    /// The directory receiving `index.html` and `about.html`.
    pub root_output_directory: &'a Path,

    /// The directory receiving listing and post pages, mirroring
    /// [`Writer::blog_url`].
    pub blog_output_directory: &'a Path,

    /// How many posts the landing page shows.
    pub home_posts: usize,
}

impl Writer<'_> {
    /// Renders the whole site and returns the number of pages written.
    pub fn write_site(&self, posts: &[Post]) -> Result<usize> {
        use std::collections::HashSet;
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let pages = self.pages(posts);
        for page in &pages {
            let dir = page.file_path.parent().unwrap(); // there should always be a dir
            if seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
            self.write_page(page)?;
        }
        Ok(pages.len())
    }

    /// Creates every [`Page`] for a set of posts: the landing page, the
    /// about page, one listing page per tag vocabulary entry, and one detail
    /// page per post.
    fn pages(&self, posts: &[Post]) -> Vec<Page> {
        let all = summary::all_summaries(posts);
        let tags = summary::unique_tags(&all);
        let slugs = tag_slugs(&tags);

        let mut pages = vec![self.home_page_for(posts), self.about_page()];
        for active in 0..tags.len() {
            pages.push(self.list_page(&all, &tags, &slugs, active));
        }
        for post in summary::sort_by_date_desc(posts) {
            pages.push(self.post_page(post));
        }
        pages
    }

    /// Takes a single [`Page`], injects the fields shared by every page,
    /// templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        debug!("writing `{}`", page.file_path.display());
        let mut value = page.value.clone();
        if let Value::Object(obj) = &mut value {
            obj.insert("site".to_owned(), Value::from(self.site));
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "blog_url".to_owned(),
                Value::String(self.blog_index_url().to_string()),
            );
            obj.insert(
                "about_url".to_owned(),
                Value::String(self.about_url().to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
            obj.insert(
                "atom_url".to_owned(),
                Value::String(self.atom_url.to_string()),
            );
            obj.insert(
                "year".to_owned(),
                Value::String(Utc::now().year().to_string()),
            );
            obj.insert("nav".to_owned(), self.nav_value(page.section));
        }
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value).unwrap(),
        )?;
        Ok(())
    }

    /// The landing page: the hero block, the most recent posts, and the
    /// contact call-to-action.
    fn home_page_for(&self, posts: &[Post]) -> Page {
        let recent = summary::recent_summaries(posts, self.home_posts);
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), (&self.site.title).into());
        m.insert(
            "posts".to_owned(),
            Value::Array(
                recent
                    .iter()
                    .map(|summary| summary_value(summary, self.blog_url))
                    .collect(),
            ),
        );
        m.insert(
            "contact_email".to_owned(),
            Value::String(self.contact_email()),
        );
        Page {
            value: Value::Object(m),
            file_path: self.root_output_directory.join("index.html"),
            template: self.home_template,
            section: Section::Home,
        }
    }

    /// The about page. All of its content comes from the site metadata and
    /// the template itself.
    fn about_page(&self) -> Page {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "title".to_owned(),
            Value::String(format!("关于 · {}", self.site.title)),
        );
        Page {
            value: Value::Object(m),
            file_path: self.root_output_directory.join("about.html"),
            template: self.about_template,
            section: Section::About,
        }
    }

    /// One listing page per tag-filter selection: the page for [`ALL_TAG`]
    /// lists everything, the page for tag `t` only the summaries whose
    /// display tag equals `t`. Every listing page carries the full filter
    /// control with the current selection marked active. `active` indexes
    /// into the vocabulary and its parallel slug list.
    fn list_page(
        &self,
        all: &[PostSummary],
        tags: &[String],
        slugs: &[String],
        active: usize,
    ) -> Page {
        let active_tag = tags[active].as_str();
        let filtered = summary::filter_by_tag(all, active_tag);
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "title".to_owned(),
            Value::String(match active_tag == ALL_TAG {
                true => format!("全部文章 · {}", self.site.title),
                false => format!("{} · {}", active_tag, self.site.title),
            }),
        );
        m.insert("active_tag".to_owned(), Value::String(active_tag.to_owned()));
        m.insert(
            "tags".to_owned(),
            self.tag_links_value(tags, slugs, active_tag),
        );
        m.insert("empty".to_owned(), Value::from(filtered.is_empty()));
        m.insert(
            "posts".to_owned(),
            Value::Array(
                filtered
                    .iter()
                    .map(|summary| summary_value(summary, self.blog_url))
                    .collect(),
            ),
        );
        Page {
            value: Value::Object(m),
            file_path: self.list_page_path(active_tag, &slugs[active]),
            template: self.list_template,
            section: Section::Posts,
        }
    }

    /// A post detail page. The tag chip and date come from the same
    /// projection the cards use, so the two can never disagree.
    fn post_page(&self, post: &Post) -> Page {
        let summary = summary::to_summary(post);
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "title".to_owned(),
            Value::String(format!("{} · {}", post.title, self.site.title)),
        );

        let mut p: HashMap<String, Value> = HashMap::new();
        p.insert("slug".to_owned(), (&post.slug).into());
        p.insert("title".to_owned(), (&post.title).into());
        p.insert("description".to_owned(), (&post.description).into());
        p.insert("tag".to_owned(), (&summary.tag).into());
        p.insert("date".to_owned(), (&summary.date).into());
        p.insert(
            "date_display".to_owned(),
            Value::String(display_date(&post.published)),
        );
        p.insert("body".to_owned(), (&post.body).into());
        m.insert("post".to_owned(), Value::Object(p));

        Page {
            value: Value::Object(m),
            file_path: self
                .blog_output_directory
                .join(format!("{}.html", post.slug)),
            template: self.post_template,
            section: Section::Posts,
        }
    }

    /// The output path for a listing page: `index.html` for the unfiltered
    /// page, `tags/{slug}/index.html` for a tag page. `slug` is the entry's
    /// assigned directory slug from [`tag_slugs`].
    fn list_page_path(&self, tag: &str, slug: &str) -> PathBuf {
        match tag == ALL_TAG {
            true => self.blog_output_directory.join("index.html"),
            false => self
                .blog_output_directory
                .join("tags")
                .join(slug)
                .join("index.html"),
        }
    }

    /// The URL for a listing page; mirrors [`Writer::list_page_path`].
    fn list_page_url(&self, tag: &str, slug: &str) -> Url {
        match tag == ALL_TAG {
            true => self.blog_index_url(),
            false => self
                .blog_url
                .join(&format!("tags/{}/index.html", slug))
                .unwrap(),
        }
    }

    fn tag_links_value(&self, tags: &[String], slugs: &[String], active_tag: &str) -> Value {
        let links: Vec<TagLink> = tags
            .iter()
            .zip(slugs)
            .map(|(tag, slug)| TagLink {
                name: tag.clone(),
                url: self.list_page_url(tag, slug),
                active: tag == active_tag,
            })
            .collect();
        Value::Array(links.iter().map(Value::from).collect())
    }

    fn nav_value(&self, section: Section) -> Value {
        let links = vec![
            NavLink {
                name: NAV_HOME.to_owned(),
                url: self.home_page.clone(),
                active: section == Section::Home,
            },
            NavLink {
                name: NAV_POSTS.to_owned(),
                url: self.blog_index_url(),
                active: section == Section::Posts,
            },
            NavLink {
                name: NAV_ABOUT.to_owned(),
                url: self.about_url(),
                active: section == Section::About,
            },
        ];
        Value::Array(links.iter().map(Value::from).collect())
    }

    fn blog_index_url(&self) -> Url {
        // Joining a plain file name onto a directory URL always succeeds.
        self.blog_url.join("index.html").unwrap()
    }

    fn about_url(&self) -> Url {
        self.home_page.join("about.html").unwrap()
    }

    /// The `href` for the landing page's contact button: the configured
    /// email contact if there is one, else the author's email.
    fn contact_email(&self) -> String {
        if let Some(contact) = self.site.contacts.iter().find(|c| c.platform == "email") {
            return contact.href.clone();
        }
        match &self.site.author.email {
            Some(email) => format!("mailto:{}", email),
            None => "#".to_owned(),
        }
    }
}

/// Formats a date in the long form used on detail pages (`2024年1月15日`).
fn display_date(datetime: &NaiveDateTime) -> String {
    format!(
        "{}年{}月{}日",
        datetime.year(),
        datetime.month(),
        datetime.day()
    )
}

/// Assigns each vocabulary entry the directory slug its listing page lives
/// under. Distinct tags can share a transliteration (for example 设计 and
/// 社记 both slugify to `she-ji`), so later entries take a numeric suffix
/// instead of silently reusing an earlier entry's path.
fn tag_slugs(tags: &[String]) -> Vec<String> {
    use std::collections::HashSet;
    let mut taken: HashSet<String> = HashSet::new();
    tags.iter()
        .map(|tag| {
            let base = slug::slugify(tag);
            let mut slug = base.clone();
            let mut n = 1;
            while !taken.insert(slug.clone()) {
                n += 1;
                slug = format!("{}-{}", base, n);
            }
            slug
        })
        .collect()
}

/// An object representing an output HTML file: the page-specific template
/// value, the target location on disk, the template to apply, and the
/// navigation section the page belongs to.
struct Page<'a> {
    value: Value,
    file_path: PathBuf,
    template: &'a Template,
    section: Section,
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}
