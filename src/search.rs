use async_trait::async_trait;
use futures::future::join_all;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::{models::Lang, ranker};

const LINKS_PER_PAGE: usize = 10;

#[async_trait]
pub trait LinkSearcher: Send + Sync {
    /// Raw candidate URLs for a title, in search-result order. Page failures
    /// are swallowed, so the worst case is an empty list.
    async fn candidates(&self, title: &str, lang: Lang) -> Vec<String>;
}

pub struct GoogleSearcher {
    client: reqwest::Client,
    pages: usize,
    max_candidates: usize,
}

impl GoogleSearcher {
    pub fn new(client: reqwest::Client, pages: usize, max_candidates: usize) -> Self {
        Self { client, pages, max_candidates }
    }
}

#[async_trait]
impl LinkSearcher for GoogleSearcher {
    async fn candidates(&self, title: &str, lang: Lang) -> Vec<String> {
        debug!(title = %title, pages = self.pages, "scraping search pages");

        let urls: Vec<String> =
            (0..self.pages).map(|page| search_page_url(title, page, lang)).collect();

        let pages = join_all(urls.iter().map(|url| links_on_page(&self.client, url))).await;

        let mut out: Vec<String> = pages.into_iter().flatten().collect();
        if out.len() > self.max_candidates {
            debug!(dropped = out.len() - self.max_candidates, "truncating candidate list");
            out.truncate(self.max_candidates);
        }

        debug!(title = %title, candidates = out.len(), "completed search scrape");
        out
    }
}

/// A Latin-dominant title still gets the subtitled/original-audio query even
/// for a Russian-display user, since dubbed results would be useless.
pub fn detect_lang(text: &str) -> Lang {
    let total = text.chars().count();
    if total == 0 {
        return Lang::Ru;
    }
    let latin = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if latin as f64 / total as f64 > 0.8 { Lang::En } else { Lang::Ru }
}

pub fn search_page_url(title: &str, page: usize, lang: Lang) -> String {
    let suffix = if lang == Lang::Ru && detect_lang(title) == Lang::Ru {
        "смотреть онлайн"
    } else {
        "watch online с субтитрами в оригинале"
    };
    format!(
        "https://www.google.com/search?q={}+{}&start={}",
        urlencoding::encode(title),
        urlencoding::encode(suffix),
        page * LINKS_PER_PAGE,
    )
}

async fn links_on_page(client: &reqwest::Client, url: &str) -> Vec<String> {
    let html: Result<String, reqwest::Error> =
        async { client.get(url).send().await?.error_for_status()?.text().await }.await;

    match html {
        Ok(html) => {
            let links = links_in_page(&html);
            debug!(url = %url, links = links.len(), "parsed search page");
            links
        },
        Err(err) => {
            warn!(url = %url, error = %err, "search page fetch failed");
            Vec::new()
        },
    }
}

fn links_in_page(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| ranker::is_candidate(href))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_dominant_text_reads_as_english() {
        assert_eq!(detect_lang("Interstellar"), Lang::En);
        assert_eq!(detect_lang("The Matrix"), Lang::En);
        assert_eq!(detect_lang("Интерстеллар"), Lang::Ru);
        assert_eq!(detect_lang("Брат 2"), Lang::Ru);
        assert_eq!(detect_lang(""), Lang::Ru);
    }

    #[test]
    fn russian_title_gets_the_plain_watch_query() {
        let url = search_page_url("Интерстеллар", 0, Lang::Ru);
        assert!(url.contains(urlencoding::encode("смотреть онлайн").as_ref()));
        assert!(url.ends_with("&start=0"));
    }

    #[test]
    fn latin_title_gets_the_subtitled_query_even_for_russian_display() {
        let url = search_page_url("Interstellar", 0, Lang::Ru);
        assert!(url.contains("watch"));
        assert!(url.contains(urlencoding::encode("в оригинале").as_ref()));
    }

    #[test]
    fn page_number_shifts_the_start_offset() {
        let url = search_page_url("Брат", 3, Lang::Ru);
        assert!(url.ends_with("&start=30"));
    }

    #[test]
    fn extracts_only_unblocked_absolute_links() {
        let html = r#"
            <html><body>
              <a href="/search?q=next">next page</a>
              <a href="https://lordfilm.example/watch/1">watch</a>
              <a href="https://netflix.example/title/2">blocked</a>
              <a href="https://blog.example/review">review</a>
              <a>no href</a>
            </body></html>
        "#;
        let links = links_in_page(html);
        assert_eq!(
            links,
            vec!["https://lordfilm.example/watch/1", "https://blog.example/review"]
        );
    }
}
