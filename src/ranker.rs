use std::collections::HashSet;

/// Trusted hosts, earlier entries outrank later ones.
pub const ALLOWED_SITES: &[&str] = &[
    "inoriginal",
    "rutube",
    "mydeaf",
    "lordfilm",
    "gidonline",
    "baksino",
    "hdfilmsurge",
    "rezka",
];

/// Streaming portals and search-engine chrome we never link to. Matching is
/// case-sensitive substring containment, an absolute veto.
pub const BLOCKED_SITES: &[&str] = &[
    "netflix",
    "ivi.",
    "google",
    "yandex",
    "kinopoisk",
    "prime",
    "wink",
    "okko",
    "kion",
    "amazon",
    "kinogo",
    "ok.ru",
    "jut.su",
];

/// Pre-filter shared with the search scraper: keeps hrefs that carry an
/// absolute URL and are not blocked outright.
pub fn is_candidate(href: &str) -> bool {
    href.contains("http") && !is_blocked(href)
}

fn is_blocked(url: &str) -> bool {
    BLOCKED_SITES.iter().any(|site| url.contains(site))
}

/// 1-based rank of the first allow-list entry the URL contains; URLs that
/// match nothing sort last.
fn priority(url: &str) -> usize {
    ALLOWED_SITES
        .iter()
        .position(|site| url.contains(site))
        .map(|i| i + 1)
        .unwrap_or(ALLOWED_SITES.len() + 1)
}

/// Orders candidates by allow-list priority and returns the first `top`.
/// Deterministic for a given input: duplicates collapse onto their first
/// occurrence and the sort is stable, so ties keep input order. An empty
/// return means "no link found", not an error.
pub fn shortlist(candidates: &[String], top: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls: Vec<&String> = candidates
        .iter()
        .filter(|url| seen.insert(url.as_str()))
        .filter(|url| !is_blocked(url))
        .collect();

    urls.sort_by_key(|url| priority(url));
    urls.into_iter().take(top).cloned().collect()
}
