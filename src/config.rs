//! Loads the project configuration. A project is a directory holding a
//! `blog.yaml` file (site metadata), a `posts` directory (the content), and
//! a `theme` directory (templates and static assets, described by its own
//! `theme/theme.yaml`). [`Config`] flattens all of that plus the relevant
//! command line arguments into the one structure the build pipeline takes.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The project file name searched for by [`Config::from_directory`].
const PROJECT_FILE: &str = "blog.yaml";

#[derive(Deserialize)]
struct RecentPosts(usize);
impl Default for RecentPosts {
    fn default() -> Self {
        RecentPosts(3)
    }
}

/// The site author. The name appears in page footers and the feed; the
/// email address only in the feed.
#[derive(Clone, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A contact link rendered on the landing and about pages.
#[derive(Clone, Deserialize)]
pub struct Contact {
    /// A short machine-readable name, e.g. `github` or `email`.
    pub platform: String,
    /// The human-readable link text.
    pub label: String,
    pub href: String,
}

/// Site metadata handed to every template.
#[derive(Clone, Deserialize)]
pub struct Site {
    /// The short site name shown in the navigation bar.
    pub name: String,
    /// The full site title, used for page titles and the feed.
    pub title: String,
    pub description: String,
    pub author: Author,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// The `blog.yaml` schema: the site metadata plus the site root URL and the
/// landing page's post count.
#[derive(Deserialize)]
struct Project {
    site_root: Url,
    #[serde(flatten)]
    site: Site,
    #[serde(default)]
    recent_posts: RecentPosts,
}

/// The theme's template lists. Each template is a list of files concatenated
/// in order, so themes can share common fragments between templates.
#[derive(Deserialize)]
struct Theme {
    home_template: Vec<PathBuf>,
    about_template: Vec<PathBuf>,
    list_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,
}

/// Everything the build pipeline needs, assembled from the project file, the
/// theme file, and the command line.
pub struct Config {
    /// Site metadata handed to every template.
    pub site: Site,

    /// The site root URL, normalized to end with a `/`. Doubles as the
    /// landing page URL.
    pub site_root: Url,

    /// The base URL for listing and post pages.
    pub blog_url: Url,

    /// The URL prefix for the theme's static assets.
    pub static_url: Url,

    /// The URL of the Atom feed.
    pub atom_url: Url,

    /// The directory holding the post source files.
    pub posts_source_directory: PathBuf,

    /// The theme directory holding static assets to copy verbatim.
    pub static_source_directory: PathBuf,

    pub home_template: Vec<PathBuf>,
    pub about_template: Vec<PathBuf>,
    pub list_template: Vec<PathBuf>,
    pub post_template: Vec<PathBuf>,

    /// The directory receiving `index.html`, `about.html`, and `feed.atom`.
    pub root_output_directory: PathBuf,

    /// The directory receiving listing and post pages.
    pub blog_output_directory: PathBuf,

    /// The directory receiving the theme's static assets.
    pub static_output_directory: PathBuf,

    /// How many posts the landing page shows.
    pub recent_posts: usize,

    /// Whether posts marked `draft: true` are included.
    pub include_drafts: bool,
}

impl Config {
    /// Searches `dir` and its ancestors for a `blog.yaml` and loads the
    /// configuration from the first directory that has one.
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        include_drafts: bool,
    ) -> Result<Config> {
        // Relative starting points such as `.` run out of textual parents
        // before they reach the file system root, so resolve the path up
        // front and walk the real ancestor chain.
        let mut dir = dir.canonicalize().map_err(|err| Error::Open {
            kind: "project directory".to_owned(),
            path: dir.to_owned(),
            err,
        })?;
        loop {
            let path = dir.join(PROJECT_FILE);
            if path.exists() {
                return Config::from_project_file(&path, output_directory, include_drafts);
            }
            if !dir.pop() {
                return Err(Error::ProjectFileNotFound);
            }
        }
    }

    /// Loads the configuration given an explicit project file path.
    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        include_drafts: bool,
    ) -> Result<Config> {
        let project: Project = read_yaml(path, "project file")?;
        let project_root = match path.parent() {
            Some(project_root) => project_root,
            None => return Err(Error::NoParentDirectory(path.to_owned())),
        };
        let theme_dir = project_root.join("theme");
        let theme: Theme = read_yaml(&theme_dir.join("theme.yaml"), "theme file")?;

        // A trailing slash is significant to `Url::join`: without it the
        // last path segment is treated as a file name and replaced.
        let mut site_root = project.site_root;
        if !site_root.path().ends_with('/') {
            let path = format!("{}/", site_root.path());
            site_root.set_path(&path);
        }

        Ok(Config {
            blog_url: site_root.join("blog/")?,
            static_url: site_root.join("static/")?,
            atom_url: site_root.join("feed.atom")?,
            posts_source_directory: project_root.join("posts"),
            static_source_directory: theme_dir.join("static"),
            home_template: prefix_all(&theme_dir, &theme.home_template),
            about_template: prefix_all(&theme_dir, &theme.about_template),
            list_template: prefix_all(&theme_dir, &theme.list_template),
            post_template: prefix_all(&theme_dir, &theme.post_template),
            root_output_directory: output_directory.to_owned(),
            blog_output_directory: output_directory.join("blog"),
            static_output_directory: output_directory.join("static"),
            recent_posts: project.recent_posts.0,
            include_drafts,
            site: project.site,
            site_root,
        })
    }
}

fn prefix_all(dir: &Path, relative: &[PathBuf]) -> Vec<PathBuf> {
    relative.iter().map(|relpath| dir.join(relpath)).collect()
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let file = File::open(path).map_err(|err| Error::Open {
        kind: kind.to_owned(),
        path: path.to_owned(),
        err,
    })?;
    serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
        path: path.to_owned(),
        err,
    })
}

/// An alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents the errors that can occur while loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `blog.yaml` exists in the starting directory or any
    /// of its ancestors.
    ProjectFileNotFound,

    /// Returned when a project file path has no parent directory.
    NoParentDirectory(PathBuf),

    /// Represents I/O errors opening or resolving a configuration path.
    /// `kind` says which one (`project file`, `theme file`, or `project
    /// directory`) for friendlier messages.
    Open {
        kind: String,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Represents deserialization errors in a configuration file.
    Yaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Represents errors joining a derived URL onto the site root.
    Url(url::ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::NoParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file `{}`",
                path.display()
            ),
            Error::Open { kind, path, err } => {
                write!(f, "Opening {} `{}`: {}", kind, path.display(), err)
            }
            Error::Yaml { path, err } => write!(f, "Parsing `{}`: {}", path.display(), err),
            Error::Url(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectFileNotFound => None,
            Error::NoParentDirectory(_) => None,
            Error::Open { err, .. } => Some(err),
            Error::Yaml { err, .. } => Some(err),
            Error::Url(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`enum@Error`]. This allows
    /// us to use the `?` operator.
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::env;
    use std::fs;

    // Test binaries are not guaranteed a working directory, so fixture
    // paths are anchored to the crate root.
    fn site_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/site")
    }

    #[test]
    fn test_from_directory() {
        let config = Config::from_directory(&site_dir(), Path::new("/tmp/out"), false).unwrap();

        // the project file declares the root without a trailing slash
        assert_eq!("https://example.com/site/", config.site_root.as_str());
        assert_eq!("https://example.com/site/blog/", config.blog_url.as_str());
        assert_eq!(
            "https://example.com/site/static/",
            config.static_url.as_str()
        );
        assert_eq!(
            "https://example.com/site/feed.atom",
            config.atom_url.as_str()
        );

        assert_eq!("DESIGNER.BLOG", config.site.name);
        assert_eq!("方植贤", config.site.author.name);
        assert_eq!(3, config.recent_posts);
        assert!(!config.include_drafts);

        assert!(config.posts_source_directory.ends_with("testdata/site/posts"));
        assert!(config.home_template[0].ends_with("testdata/site/theme/home.html"));
        assert!(config.blog_output_directory.ends_with("out/blog"));
    }

    #[test]
    fn test_from_directory_walks_up() {
        let config =
            Config::from_directory(&site_dir().join("posts"), Path::new("/tmp/out"), true).unwrap();
        assert_eq!("DESIGNER.BLOG", config.site.name);
        assert!(config.include_drafts);
    }

    #[test]
    fn test_from_directory_from_inside_project() {
        let project = tempfile::tempdir().unwrap();
        fs::create_dir(project.path().join("posts")).unwrap();
        fs::create_dir(project.path().join("theme")).unwrap();
        fs::write(
            project.path().join("blog.yaml"),
            "site_root: https://example.com
name: 博客
title: 博客
description: 描述
author:
  name: 作者
",
        )
        .unwrap();
        fs::write(
            project.path().join("theme").join("theme.yaml"),
            "home_template: [home.html]
about_template: [about.html]
list_template: [list.html]
post_template: [post.html]
",
        )
        .unwrap();

        // Running `liubai -o out` from inside the posts directory passes
        // `.` as the starting point; the search must still reach the
        // project file one level up.
        let previous = env::current_dir().unwrap();
        env::set_current_dir(project.path().join("posts")).unwrap();
        let result = Config::from_directory(Path::new("."), Path::new("/tmp/out"), false);
        env::set_current_dir(previous).unwrap();

        let config = result.unwrap();
        assert_eq!("博客", config.site.name);
        assert!(config.posts_source_directory.ends_with("posts"));
    }

    #[test]
    fn test_from_directory_not_found() {
        let dir = tempfile::tempdir().unwrap();
        match Config::from_directory(dir.path(), Path::new("/tmp/out"), false) {
            Err(Error::ProjectFileNotFound) => {}
            Ok(_) => panic!("expected an error"),
            Err(err) => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn test_project_defaults() {
        let project: Project = serde_yaml::from_str(
            "site_root: https://example.com
name: 博客
title: 博客
description: 描述
author:
  name: 作者
",
        )
        .unwrap();
        assert_eq!(3, project.recent_posts.0);
        assert!(project.site.contacts.is_empty());
        assert!(project.site.author.email.is_none());
    }
}
