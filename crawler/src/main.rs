use anyhow::{bail, Context, Result};
use clap::Parser;
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "tempest-crawler")]
#[command(about = "Crawl a paginated article listing to JSONL")]
struct Cli {
    /// Listing url, e.g. an encyclopedia browse page
    #[arg(long)]
    listing: String,
    /// Output JSONL file path
    #[arg(long, default_value = "./data/corpus.jsonl")]
    output: String,
    /// Maximum number of articles to fetch (0 = no cap)
    #[arg(long, default_value_t = 0)]
    max_articles: usize,
    /// Number of article fetches in flight at once
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// Delay between listing page fetches, milliseconds
    #[arg(long, default_value_t = 250)]
    page_delay_ms: u64,
    /// User-Agent string
    #[arg(long, default_value = "tempest-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
}

#[derive(Serialize)]
struct Article {
    url: String,
    title: String,
    text: String,
    fetched_at: String,
}

#[derive(Clone)]
struct Selectors {
    page_link: Selector,
    article_link: Selector,
    title: Selector,
    content: Selector,
    paragraph: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            page_link: Selector::parse("ul.pagination li a.page-link").unwrap(),
            article_link: Selector::parse("div.search-single-info a").unwrap(),
            title: Selector::parse("h1").unwrap(),
            content: Selector::parse("div#article-content-def").unwrap(),
            paragraph: Selector::parse("p, h2, h3").unwrap(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    if let Some(dir) = std::path::Path::new(&args.output).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let listing = Url::parse(&args.listing).context("invalid listing url")?;
    let sels = Selectors::new();

    let first = fetch_html(&client, listing.clone())
        .await
        .context("listing page unreachable")?;
    let (pages, mut links) = parse_listing(&first, &listing, &sels);
    tracing::info!(pages, "pagination discovered");

    let mut seen: HashSet<String> = links.iter().map(|u| u.to_string()).collect();
    for page in 2..=pages {
        sleep(Duration::from_millis(args.page_delay_ms)).await;
        let page_url = with_page(&listing, page);
        match fetch_html(&client, page_url.clone()).await {
            Ok(body) => {
                let (_, found) = parse_listing(&body, &page_url, &sels);
                for u in found {
                    if seen.insert(u.to_string()) {
                        links.push(u);
                    }
                }
            }
            Err(err) => tracing::warn!(page, %err, "listing page failed, skipping"),
        }
    }
    if links.is_empty() {
        bail!("no article links found under {listing}");
    }
    if args.max_articles > 0 && links.len() > args.max_articles {
        links.truncate(args.max_articles);
    }
    let total = links.len();
    tracing::info!(articles = total, "article discovery complete");

    // Bounded fan-out; results keep discovery order so the corpus sequence
    // is stable across runs.
    let mut fetched: Vec<Option<Article>> = Vec::new();
    fetched.resize_with(total, || None);
    let mut pending = links.into_iter().enumerate();
    let mut inflight = JoinSet::new();
    let mut done = 0usize;
    loop {
        while inflight.len() < args.concurrency.max(1) {
            match pending.next() {
                Some((idx, url)) => {
                    let client = client.clone();
                    let sels = sels.clone();
                    inflight.spawn(async move { (idx, fetch_article(&client, url, &sels).await) });
                }
                None => break,
            }
        }
        match inflight.join_next().await {
            Some(joined) => {
                let (idx, result) = joined?;
                match result {
                    Ok(article) => fetched[idx] = Some(article),
                    Err(err) => tracing::warn!(%err, "article fetch failed, skipping"),
                }
                done += 1;
                if done % 25 == 0 {
                    tracing::info!(done, total, "fetch progress");
                }
            }
            None => break,
        }
    }

    let mut out = BufWriter::new(File::create(&args.output)?);
    let mut emitted = 0usize;
    for article in fetched.into_iter().flatten() {
        serde_json::to_writer(&mut out, &article)?;
        out.write_all(b"\n")?;
        emitted += 1;
    }
    out.flush()?;
    tracing::info!(emitted, output = %args.output, "crawl complete");
    Ok(())
}

async fn fetch_html(client: &Client, url: Url) -> Result<String> {
    let resp = client.get(url.clone()).send().await?;
    if !resp.status().is_success() {
        bail!("GET {url} returned {}", resp.status());
    }
    if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
        if let Ok(v) = ct.to_str() {
            if !v.starts_with("text/html") {
                bail!("GET {url} returned content type {v}");
            }
        }
    }
    Ok(resp.text().await?)
}

async fn fetch_article(client: &Client, url: Url, sels: &Selectors) -> Result<Article> {
    let body = fetch_html(client, url.clone()).await?;
    let fetched_at = time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    parse_article(&body, &url, sels, fetched_at)
}

/// Page count and article links of one listing page. The count is the
/// largest numeric pagination label; bars mix numbers with "Next"-style
/// labels, which count as zero. No pagination bar means a single page.
fn parse_listing(body: &str, base: &Url, sels: &Selectors) -> (usize, Vec<Url>) {
    let doc = Html::parse_document(body);
    let mut pages = 1usize;
    for link in doc.select(&sels.page_link) {
        let label = link.text().collect::<String>();
        pages = pages.max(numeric_label(label.trim()));
    }
    let mut links = Vec::new();
    for a in doc.select(&sels.article_link) {
        if let Some(href) = a.value().attr("href") {
            if let Ok(u) = Url::parse(href).or_else(|_| base.join(href)) {
                if u.scheme().starts_with("http") {
                    links.push(u);
                }
            }
        }
    }
    (pages, links)
}

fn parse_article(body: &str, url: &Url, sels: &Selectors, fetched_at: String) -> Result<Article> {
    let doc = Html::parse_document(body);
    let title = doc
        .select(&sels.title)
        .next()
        .map(|h| collapse_whitespace(&h.text().collect::<String>()))
        .unwrap_or_default();
    let text = doc
        .select(&sels.content)
        .next()
        .map(|div| content_text(div, &sels.paragraph))
        .unwrap_or_default();
    if title.is_empty() || text.is_empty() {
        bail!("article at {url} has no usable title or body");
    }
    Ok(Article {
        url: url.to_string(),
        title,
        text,
        fetched_at,
    })
}

/// Text of the article container, paragraph-level nodes only, so scripts and
/// navigation chrome inside it stay out of the token stream.
fn content_text(div: ElementRef<'_>, paragraph: &Selector) -> String {
    let mut parts = Vec::new();
    for node in div.select(paragraph) {
        let part = collapse_whitespace(&node.text().collect::<String>());
        if !part.is_empty() {
            parts.push(part);
        }
    }
    parts.join(" ")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn numeric_label(s: &str) -> usize {
    s.parse().unwrap_or(0)
}

fn with_page(listing: &Url, page: usize) -> Url {
    let mut u = listing.clone();
    u.query_pairs_mut().append_pair("page", &page.to_string());
    u
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_labels_count_as_zero() {
        assert_eq!(numeric_label("7"), 7);
        assert_eq!(numeric_label("Next"), 0);
        assert_eq!(numeric_label(""), 0);
    }

    #[test]
    fn pagination_takes_the_largest_page_number() {
        let body = r##"<html><body>
            <ul class="pagination">
              <li><a class="page-link" href="#">1</a></li>
              <li><a class="page-link" href="#">2</a></li>
              <li><a class="page-link" href="#">12</a></li>
              <li><a class="page-link" href="#">Next</a></li>
            </ul>
            <div class="search-single-info"><a href="/en/article/ice-storm">Ice Storm</a></div>
        </body></html>"##;
        let base = Url::parse("https://example.org/browse?type=article").unwrap();
        let (pages, links) = parse_listing(body, &base, &Selectors::new());
        assert_eq!(pages, 12);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.org/en/article/ice-storm");
    }

    #[test]
    fn listing_without_pagination_is_one_page() {
        let body = "<html><body><p>empty</p></body></html>";
        let base = Url::parse("https://example.org/browse").unwrap();
        let (pages, links) = parse_listing(body, &base, &Selectors::new());
        assert_eq!(pages, 1);
        assert!(links.is_empty());
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
