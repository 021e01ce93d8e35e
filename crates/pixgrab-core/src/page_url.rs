//! Search result page URLs.
//!
//! One search page lists [`ARTWORK_PER_PAGE`] artworks, so a query aiming for
//! `n` images needs `ceil(n / 60)` pages, numbered from 1.
//!
//! URL shape:
//! `{base}/ajax/search/artworks/{kw}?word={kw}&order=date_d&mode=all&p=1&s_mode=s_tag&type=all&lang=zh`

use crate::query::KeywordQuery;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Artworks listed by one search result page.
pub const ARTWORK_PER_PAGE: usize = 60;

/// Keyword as a path segment: unreserved marks and parentheses stay literal, `/` is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'(')
    .remove(b')');

/// Keyword as the `word` query value: unreserved marks and `/` stay literal.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// One search request and the page number it asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageUrl {
    pub url: String,
    pub page: usize,
}

/// Number of pages needed to cover `target_count` artworks.
pub fn page_count(target_count: usize) -> usize {
    target_count.div_ceil(ARTWORK_PER_PAGE)
}

/// Builds search URLs against a site root (e.g. `https://www.pixiv.net`).
#[derive(Debug, Clone)]
pub struct PageUrlBuilder {
    base_url: String,
    lang: String,
}

impl PageUrlBuilder {
    pub fn new(base_url: &str, lang: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.to_string(),
        }
    }

    /// Page URLs for pages `1..=page_count(query.target_count())`, in page order.
    pub fn build(&self, query: &KeywordQuery) -> Vec<PageUrl> {
        let path_kw = utf8_percent_encode(query.keyword(), PATH_SEGMENT).to_string();
        let word = utf8_percent_encode(query.keyword(), QUERY_VALUE).to_string();
        (1..=page_count(query.target_count()))
            .map(|page| PageUrl {
                url: format!(
                    "{}/ajax/search/artworks/{}?word={}&order={}&mode={}&p={}&s_mode=s_tag&type=all&lang={}",
                    self.base_url,
                    path_kw,
                    word,
                    query.order().as_param(),
                    query.mode().as_str(),
                    page,
                    self.lang,
                ),
                page,
            })
            .collect()
    }
}
