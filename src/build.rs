//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output static site: loading the posts
//! ([`crate::post`]), rendering the landing, about, listing, and detail
//! pages ([`crate::write`]), copying the theme's static assets into the
//! output directory, and generating the Atom feed ([`crate::feed`]).

use crate::config::Config;
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::post::{load_posts, Error as ParseError};
use crate::write::{Error as WriteError, Writer};
use gtmpl::Template;
use log::{debug, info};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Builds the site from a [`Config`] object. This calls into
/// [`load_posts`] and [`Writer::write_site`] which do the heavy lifting.
/// This function also copies the theme's static assets into the output
/// directory and writes the Atom feed.
pub fn build_site(config: Config) -> Result<()> {
    let posts = load_posts(&config.posts_source_directory, config.include_drafts)?;
    info!(
        "loaded {} posts from `{}`",
        posts.len(),
        config.posts_source_directory.display()
    );

    // Parse the template files.
    let home_template = parse_template(config.home_template.iter())?;
    let about_template = parse_template(config.about_template.iter())?;
    let list_template = parse_template(config.list_template.iter())?;
    let post_template = parse_template(config.post_template.iter())?;

    // Blow away the generated subdirectories so stale pages from a previous
    // build don't linger. The root output directory itself is left alone in
    // case the user pointed the build at a directory holding other files.
    rmdir(&config.blog_output_directory)?;
    rmdir(&config.static_output_directory)?;

    let writer = Writer {
        home_template: &home_template,
        about_template: &about_template,
        list_template: &list_template,
        post_template: &post_template,
        site: &config.site,
        home_page: &config.site_root,
        blog_url: &config.blog_url,
        static_url: &config.static_url,
        atom_url: &config.atom_url,
        root_output_directory: &config.root_output_directory,
        blog_output_directory: &config.blog_output_directory,
        home_posts: config.recent_posts,
    };
    let pages = writer.write_site(&posts)?;
    info!("rendered {} pages", pages);

    copy_dir(
        &config.static_source_directory,
        &config.static_output_directory,
    )?;

    write_feed(
        FeedConfig {
            title: config.site.title.clone(),
            id: config.site_root.to_string(),
            author: config.site.author.clone(),
            home_page: config.site_root.clone(),
            blog_url: config.blog_url.clone(),
        },
        &posts,
        File::create(config.root_output_directory.join("feed.atom"))?,
    )?;
    info!("wrote feed.atom");

    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    // Themes without static assets are fine.
    if !src.is_dir() {
        debug!("no static assets at `{}`", src.display());
        return Ok(());
    }

    for result in WalkDir::new(src) {
        let entry = result?;
        if entry.file_type().is_file() {
            // strip_prefix can't fail; every entry sits under `src`
            let target = dst.join(entry.path().strip_prefix(src).unwrap());
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading posts,
/// writing pages, cleaning output directories, parsing template files, and
/// other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors while loading posts.
    Parse(ParseError),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors walking the static asset directory.
    WalkDir(walkdir::Error),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::WalkDir(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}
