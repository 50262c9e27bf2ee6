//! The library code for the `liubai` static site generator. The architecture
//! can be generally broken down into two distinct steps:
//!
//! 1. Loading posts from source files on disk ([`crate::post`])
//! 2. Rendering the posts into output files on disk ([`crate::write`])
//!
//! Between the two sits a small pure core ([`crate::summary`]) that every
//! page consumes: it orders posts by publish date, projects them into
//! display-ready summaries, and derives the tag vocabulary for the listing
//! page's filter control. Because the output is static, the filter control is
//! materialized as one listing page per vocabulary entry: the sentinel
//! "all" page plus one page per distinct tag.
//!
//! The second step renders four kinds of pages (landing, about, listing, and
//! post detail), copies the theme's static assets, and emits an Atom feed
//! ([`crate::feed`]). Each kind of page gets its own template, loaded from
//! the theme directory and applied by [`crate::write`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod post;
pub mod summary;
pub mod value;
pub mod write;
