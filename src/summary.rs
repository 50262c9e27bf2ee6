//! The pure core of the generator: ordering [`Post`] records by publish
//! date, projecting them into display-ready [`PostSummary`] values, deriving
//! the tag vocabulary behind the listing page's filter control, and filtering
//! summaries by the active tag.
//!
//! Everything in this module is a total function over in-memory data: no
//! I/O, no templates, no configuration. The page-assembly code in
//! [`crate::write`] and the feed generator in [`crate::feed`] are consumers
//! of these functions, never the other way around.

use crate::post::Post;
use std::collections::HashSet;

/// The sentinel tag meaning "no filter applied". The vocabulary returned by
/// [`unique_tags`] always begins with this value, and passing it to
/// [`filter_by_tag`] returns the input unfiltered.
pub const ALL_TAG: &str = "全部";

/// The display tag for posts that declare no tags of their own.
pub const FALLBACK_TAG: &str = "文章";

/// A display-ready projection of a [`Post`]: exactly what a post card on the
/// landing and listing pages needs, and nothing else. URLs are deliberately
/// absent; deriving them is the rendering layer's job ([`crate::value`]).
#[derive(Clone, Debug, PartialEq)]
pub struct PostSummary {
    /// Copied from [`Post::slug`].
    pub slug: String,
    /// Copied from [`Post::title`].
    pub title: String,
    /// The post description, displayed as the card excerpt.
    pub excerpt: String,
    /// The publish date truncated to a calendar date (`YYYY-MM-DD`).
    pub date: String,
    /// The post's first tag, or [`FALLBACK_TAG`] for untagged posts.
    pub tag: String,
}

/// Returns references to `posts` ordered by publish date, most recent first.
/// The sort is stable, so posts sharing a date keep their input order. The
/// input itself is never reordered.
pub fn sort_by_date_desc(posts: &[Post]) -> Vec<&Post> {
    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| b.published.cmp(&a.published));
    sorted
}

/// Projects a single [`Post`] into a [`PostSummary`]. Total over its input:
/// an untagged post gets [`FALLBACK_TAG`] rather than an error.
pub fn to_summary(post: &Post) -> PostSummary {
    PostSummary {
        slug: post.slug.clone(),
        title: post.title.clone(),
        excerpt: post.description.clone(),
        date: post.published.format("%Y-%m-%d").to_string(),
        tag: match post.tags.first() {
            Some(tag) => tag.clone(),
            None => FALLBACK_TAG.to_owned(),
        },
    }
}

/// Returns summaries for the `limit` most recent posts, most recent first.
/// A `limit` of zero yields an empty vector; a `limit` beyond the input
/// length yields everything.
pub fn recent_summaries(posts: &[Post], limit: usize) -> Vec<PostSummary> {
    sort_by_date_desc(posts)
        .into_iter()
        .take(limit)
        .map(to_summary)
        .collect()
}

/// Returns summaries for every post, most recent first. Equivalent to
/// [`recent_summaries`] with `limit` at least `posts.len()`.
pub fn all_summaries(posts: &[Post]) -> Vec<PostSummary> {
    sort_by_date_desc(posts).into_iter().map(to_summary).collect()
}

/// Derives the tag vocabulary for a set of summaries: [`ALL_TAG`] first,
/// followed by each distinct tag in order of first appearance. Scan order is
/// input order, so callers wanting a stable vocabulary pass a sorted input
/// (usually the result of [`all_summaries`]). The ordering is deliberately
/// not alphabetical; the filter control keeps whatever order the summaries
/// establish.
pub fn unique_tags(summaries: &[PostSummary]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    // Seeding with the sentinel keeps the vocabulary duplicate-free even if
    // some post is literally tagged with it.
    seen.insert(ALL_TAG);
    let mut tags = vec![ALL_TAG.to_owned()];
    for summary in summaries {
        if seen.insert(summary.tag.as_str()) {
            tags.push(summary.tag.clone());
        }
    }
    tags
}

/// Filters summaries by the active vocabulary entry. The sentinel
/// [`ALL_TAG`] passes everything through; any other value keeps only the
/// summaries whose display tag matches, preserving order. A tag matching
/// nothing yields an empty vector, which the listing template renders as an
/// explicit empty state rather than an error.
pub fn filter_by_tag<'a>(summaries: &'a [PostSummary], active_tag: &str) -> Vec<&'a PostSummary> {
    if active_tag == ALL_TAG {
        return summaries.iter().collect();
    }
    summaries
        .iter()
        .filter(|summary| summary.tag == active_tag)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn post(slug: &str, date: &str, tags: &[&str]) -> Post {
        Post {
            slug: slug.to_owned(),
            title: format!("{}-title", slug),
            description: format!("{}-description", slug),
            published: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms(0, 0, 0),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            draft: false,
            body: String::new(),
        }
    }

    fn slugs(summaries: &[PostSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.slug.as_str()).collect()
    }

    #[test]
    fn test_sort_by_date_desc() {
        let posts = vec![
            post("a", "2024-01-01", &["技术"]),
            post("c", "2024-03-01", &["设计"]),
            post("b", "2024-02-01", &["技术"]),
        ];

        let sorted: Vec<&str> = sort_by_date_desc(&posts)
            .into_iter()
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(vec!["c", "b", "a"], sorted);

        // the input order is untouched
        assert_eq!("a", posts[0].slug);
        assert_eq!("c", posts[1].slug);
        assert_eq!("b", posts[2].slug);
    }

    #[test]
    fn test_sort_by_date_desc_is_stable() {
        let posts = vec![
            post("first", "2024-01-01", &[]),
            post("second", "2024-01-01", &[]),
            post("third", "2024-01-01", &[]),
        ];
        let sorted: Vec<&str> = sort_by_date_desc(&posts)
            .into_iter()
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(vec!["first", "second", "third"], sorted);
    }

    #[test]
    fn test_sort_by_date_desc_empty() {
        assert!(sort_by_date_desc(&[]).is_empty());
    }

    #[test]
    fn test_to_summary() {
        let mut input = post("hello", "2024-01-15", &["技术", "随笔"]);
        input.published = NaiveDate::parse_from_str("2024-01-15", "%Y-%m-%d")
            .unwrap()
            .and_hms(8, 30, 0);

        let summary = to_summary(&input);
        assert_eq!("hello", summary.slug);
        assert_eq!("hello-title", summary.title);
        assert_eq!("hello-description", summary.excerpt);
        // the time-of-day component is dropped
        assert_eq!("2024-01-15", summary.date);
        // only the first tag is displayed
        assert_eq!("技术", summary.tag);
    }

    #[test]
    fn test_to_summary_untagged() {
        let summary = to_summary(&post("notes", "2023-12-20", &[]));
        assert_eq!(FALLBACK_TAG, summary.tag);
    }

    #[test]
    fn test_recent_summaries() {
        let posts = vec![
            post("a", "2024-01-01", &["技术"]),
            post("c", "2024-03-01", &["设计"]),
            post("b", "2024-02-01", &["技术"]),
        ];
        assert_eq!(vec!["c", "b"], slugs(&recent_summaries(&posts, 2)));
    }

    #[test]
    fn test_recent_summaries_limit_beyond_input() {
        let posts = vec![
            post("a", "2024-01-01", &[]),
            post("b", "2024-02-01", &[]),
        ];
        assert_eq!(vec!["b", "a"], slugs(&recent_summaries(&posts, 10)));
    }

    #[test]
    fn test_recent_summaries_zero_limit() {
        let posts = vec![post("a", "2024-01-01", &[])];
        assert!(recent_summaries(&posts, 0).is_empty());
    }

    #[test]
    fn test_recent_summaries_empty_input() {
        assert!(recent_summaries(&[], 5).is_empty());
    }

    #[test]
    fn test_all_summaries() {
        let posts = vec![
            post("a", "2024-01-01", &["技术"]),
            post("c", "2024-03-01", &["设计"]),
            post("b", "2024-02-01", &["技术"]),
        ];
        let all = all_summaries(&posts);
        assert_eq!(vec!["c", "b", "a"], slugs(&all));
        assert_eq!(all, recent_summaries(&posts, posts.len()));
    }

    #[test]
    fn test_unique_tags() {
        let posts = vec![
            post("a", "2024-03-01", &["技术"]),
            post("b", "2024-02-01", &["设计"]),
            post("c", "2024-01-01", &["技术"]),
        ];
        let tags = unique_tags(&all_summaries(&posts));
        assert_eq!(vec![ALL_TAG, "技术", "设计"], tags);
    }

    #[test]
    fn test_unique_tags_first_seen_order() {
        let summaries = vec![
            to_summary(&post("a", "2024-01-01", &["随笔"])),
            to_summary(&post("b", "2024-01-02", &["技术"])),
            to_summary(&post("c", "2024-01-03", &["随笔"])),
            to_summary(&post("d", "2024-01-04", &[])),
        ];
        assert_eq!(
            vec![ALL_TAG, "随笔", "技术", FALLBACK_TAG],
            unique_tags(&summaries)
        );
    }

    #[test]
    fn test_unique_tags_no_duplicates() {
        let summaries: Vec<PostSummary> = vec![
            to_summary(&post("a", "2024-01-01", &["技术"])),
            to_summary(&post("b", "2024-01-02", &["技术"])),
            to_summary(&post("c", "2024-01-03", &["技术"])),
        ];
        let tags = unique_tags(&summaries);
        assert_eq!(vec![ALL_TAG, "技术"], tags);

        let distinct: HashSet<&str> = tags.iter().map(String::as_str).collect();
        assert_eq!(distinct.len(), tags.len());
    }

    #[test]
    fn test_unique_tags_empty_input() {
        assert_eq!(vec![ALL_TAG], unique_tags(&[]));
    }

    #[test]
    fn test_filter_by_tag() {
        let summaries = vec![
            to_summary(&post("a", "2024-03-01", &["技术"])),
            to_summary(&post("b", "2024-02-01", &["设计"])),
            to_summary(&post("c", "2024-01-01", &["技术"])),
        ];

        let filtered = filter_by_tag(&summaries, "技术");
        assert_eq!(
            vec!["a", "c"],
            filtered.iter().map(|s| s.slug.as_str()).collect::<Vec<&str>>()
        );
    }

    #[test]
    fn test_filter_by_tag_sentinel_passes_everything() {
        let summaries = vec![
            to_summary(&post("a", "2024-03-01", &["技术"])),
            to_summary(&post("b", "2024-02-01", &["设计"])),
        ];
        let filtered = filter_by_tag(&summaries, ALL_TAG);
        assert_eq!(summaries.len(), filtered.len());
        assert_eq!("a", filtered[0].slug);
        assert_eq!("b", filtered[1].slug);
    }

    #[test]
    fn test_filter_by_tag_unknown_tag() {
        let summaries = vec![to_summary(&post("a", "2024-03-01", &["技术"]))];
        assert!(filter_by_tag(&summaries, "生活").is_empty());
    }

    #[test]
    fn test_filter_by_tag_matches_fallback() {
        let summaries = vec![
            to_summary(&post("a", "2024-02-01", &[])),
            to_summary(&post("b", "2024-01-01", &["技术"])),
        ];
        let filtered = filter_by_tag(&summaries, FALLBACK_TAG);
        assert_eq!(1, filtered.len());
        assert_eq!("a", filtered[0].slug);
    }
}
