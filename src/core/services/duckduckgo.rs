use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{RequestBuilder, Response, StatusCode};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::services::search::{
    estimate_tokens, ChatMessage, ChatModel, ImageResult, ImageStream, ImagesQuery, NewsQuery,
    NewsResult, SearchClient, SessionState, TextQuery, TextResult,
};
use crate::error::{DdgsError, NetworkError};

const BASE_URL: &str = "https://duckduckgo.com";
const HTML_URL: &str = "https://html.duckduckgo.com/html";
const VQD_HEADER: &str = "x-vqd-4";
const MAX_ATTEMPTS: u32 = 3;

fn vqd_regex() -> &'static Regex {
    static VQD: OnceLock<Regex> = OnceLock::new();
    VQD.get_or_init(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).expect("valid vqd pattern"))
}

fn offset_regex() -> &'static Regex {
    static OFFSET: OnceLock<Regex> = OnceLock::new();
    OFFSET.get_or_init(|| Regex::new(r"[?&]s=(\d+)").expect("valid offset pattern"))
}

/// Typed error for a response that will not be retried
fn status_error(status: StatusCode, url: &str) -> NetworkError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        NetworkError::RateLimit
    } else {
        NetworkError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        }
    }
}

fn timelimit_name(timelimit: &str) -> &'static str {
    match timelimit {
        "d" => "Day",
        "w" => "Week",
        "m" => "Month",
        "y" => "Year",
        _ => "",
    }
}

#[derive(Deserialize)]
struct JsonPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct RawNews {
    #[serde(default)]
    date: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    source: String,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    status: Option<u16>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

struct ImagePager {
    query: ImagesQuery,
    vqd: Option<String>,
    offset: Option<String>,
    buffer: VecDeque<ImageResult>,
    seen: HashSet<String>,
    yielded: usize,
}

/// DuckDuckGo-backed search client
pub struct DuckDuckGoClient {
    client: reqwest::Client,
    session: SessionState,
}

impl DuckDuckGoClient {
    pub fn new(user_agent: &str, proxy: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent);

        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy).with_context(|| format!("invalid proxy '{}'", proxy))?);
        }

        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://duckduckgo.com/"));
        builder = builder.default_headers(headers);

        Ok(Self {
            client: builder.build().context("Failed to create HTTP client")?,
            session: SessionState::default(),
        })
    }

    /// Send with retries on 429, 5xx and network errors
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if (status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
                        && attempt < MAX_ATTEMPTS
                    {
                        let backoff = 2u64.pow(attempt - 1) * 300;
                        debug!("{} from {}, retrying in {}ms", status, response.url(), backoff);
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                        continue;
                    }
                    return Err(DdgsError::from(status_error(status, response.url().as_str())).into());
                }
                Err(e) => {
                    if attempt < MAX_ATTEMPTS && !e.is_timeout() {
                        let backoff = 2u64.pow(attempt - 1) * 300;
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                        continue;
                    }
                    return Err(DdgsError::from(e).into());
                }
            }
        }
    }

    async fn vqd(&self, keywords: &str) -> Result<String> {
        let response = self
            .send_with_retry(|| self.client.get(BASE_URL).query(&[("q", keywords)]))
            .await?;
        let body = response.text().await?;
        extract_vqd(&body).ok_or_else(|| anyhow!("Could not extract vqd for '{}'", keywords))
    }

    async fn images_page(&self, query: &ImagesQuery, vqd: &str, offset: &str) -> Result<JsonPage<ImageResult>> {
        let safesearch = if query.safesearch == "off" { "-1" } else { "1" };
        let filters = image_filters(query);

        let mut params = vec![
            ("l", query.region.as_str()),
            ("o", "json"),
            ("q", query.keywords.as_str()),
            ("vqd", vqd),
            ("f", filters.as_str()),
            ("p", safesearch),
        ];
        if !offset.is_empty() {
            params.push(("s", offset));
        }

        let url = format!("{}/i.js", BASE_URL);
        let response = self.send_with_retry(|| self.client.get(&url).query(&params)).await?;
        Ok(response.json().await?)
    }

    /// Advance the image pager by one result, fetching pages as needed
    async fn next_image(&self, mut pager: ImagePager) -> Result<Option<(ImageResult, ImagePager)>> {
        loop {
            if pager.query.max_results.is_some_and(|max| pager.yielded >= max) {
                return Ok(None);
            }
            if let Some(result) = pager.buffer.pop_front() {
                pager.yielded += 1;
                return Ok(Some((result, pager)));
            }
            let Some(offset) = pager.offset.take() else {
                return Ok(None);
            };

            let vqd = match pager.vqd {
                Some(ref vqd) => vqd.clone(),
                None => {
                    let vqd = self.vqd(&pager.query.keywords).await?;
                    pager.vqd = Some(vqd.clone());
                    vqd
                }
            };

            debug!("Fetching image page at offset '{}'", offset);
            let page = self.images_page(&pager.query, &vqd, &offset).await?;
            pager.offset = next_offset(page.next.as_deref());

            for result in page.results {
                if pager.seen.insert(result.image.clone()) {
                    pager.buffer.push_back(result);
                }
            }
            if pager.buffer.is_empty() {
                // A page with nothing new ends the sequence
                return Ok(None);
            }
        }
    }
}

pub fn extract_vqd(body: &str) -> Option<String> {
    vqd_regex()
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

fn image_filters(query: &ImagesQuery) -> String {
    let filter = |name: &str, value: Option<&str>| {
        value
            .filter(|value| !value.is_empty())
            .map(|value| format!("{}:{}", name, value))
            .unwrap_or_default()
    };

    [
        filter("time", query.timelimit.as_deref().map(timelimit_name)),
        filter("size", query.size.as_deref()),
        filter("color", query.color.as_deref()),
        filter("type", query.type_image.as_deref()),
        filter("layout", query.layout.as_deref()),
        filter("license", query.license_image.as_deref()),
    ]
    .join(",")
}

/// Offset parameter of a `next` cursor such as `i.js?q=x&s=100&...`
fn next_offset(next: Option<&str>) -> Option<String> {
    next.and_then(|next| offset_regex().captures(next))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Concatenate the message chunks of a chat event stream
pub fn parse_chat_events(body: &str) -> Result<String> {
    let mut reply = String::new();
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            break;
        }
        if data.is_empty() {
            continue;
        }
        let chunk: ChatChunk = serde_json::from_str(data)
            .with_context(|| format!("Malformed chat event: {}", data))?;
        if chunk.action.as_deref() == Some("error") {
            bail!(
                "Chat error {}: {}",
                chunk.status.unwrap_or_default(),
                chunk.kind.unwrap_or_default()
            );
        }
        if let Some(message) = chunk.message {
            reply.push_str(&message);
        }
    }
    Ok(reply)
}

fn parse_text_results(html: &str) -> Vec<TextResult> {
    let document = Html::parse_document(html);
    let (Ok(result_sel), Ok(title_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&result_sel)
        .filter(|result| {
            !result
                .value()
                .classes()
                .any(|class| class == "result--ad")
        })
        .filter_map(|result| {
            let link = result.select(&title_sel).next()?;
            let href = link.value().attr("href")?.to_string();
            if href.starts_with("http://www.google.com/search?q=") || !seen.insert(href.clone()) {
                return None;
            }
            let title = link.text().collect::<String>().trim().to_string();
            let body = result
                .select(&snippet_sel)
                .next()
                .map(|snippet| snippet.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            Some(TextResult { title, href, body })
        })
        .collect()
}

#[async_trait]
impl SearchClient for DuckDuckGoClient {
    async fn text(&self, query: &TextQuery) -> Result<Vec<TextResult>> {
        info!("Searching text for '{}'", query.keywords);
        let mut form = vec![
            ("q", query.keywords.as_str()),
            ("b", ""),
            ("kl", query.region.as_str()),
        ];
        if let Some(ref timelimit) = query.timelimit {
            form.push(("df", timelimit.as_str()));
        }

        let response = self.send_with_retry(|| self.client.post(HTML_URL).form(&form)).await?;
        let html = response.text().await?;
        let mut results = parse_text_results(&html);
        if let Some(max) = query.max_results {
            results.truncate(max);
        }
        Ok(results)
    }

    fn images(&self, query: ImagesQuery) -> ImageStream<'_> {
        let pager = ImagePager {
            query,
            vqd: None,
            offset: Some(String::new()),
            buffer: VecDeque::new(),
            seen: HashSet::new(),
            yielded: 0,
        };

        stream::try_unfold(pager, move |pager| self.next_image(pager))
        .boxed()
    }

    async fn news(&self, query: &NewsQuery) -> Result<Vec<NewsResult>> {
        info!("Searching news for '{}'", query.keywords);
        let vqd = self.vqd(&query.keywords).await?;
        let safesearch = match query.safesearch.as_str() {
            "on" => "1",
            "off" => "-2",
            _ => "-1",
        };
        let url = format!("{}/news.js", BASE_URL);

        let mut results = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = Some(String::new());

        while let Some(current) = offset.take() {
            let mut params = vec![
                ("l", query.region.as_str()),
                ("o", "json"),
                ("noamp", "1"),
                ("q", query.keywords.as_str()),
                ("vqd", vqd.as_str()),
                ("p", safesearch),
            ];
            if let Some(ref timelimit) = query.timelimit {
                params.push(("df", timelimit.as_str()));
            }
            if !current.is_empty() {
                params.push(("s", current.as_str()));
            }

            let response = self.send_with_retry(|| self.client.get(&url).query(&params)).await?;
            let page: JsonPage<RawNews> = response.json().await?;
            let before = results.len();

            for raw in page.results {
                if !seen.insert(raw.url.clone()) {
                    continue;
                }
                let date = chrono::DateTime::from_timestamp(raw.date, 0)
                    .map(|date| date.to_rfc3339())
                    .unwrap_or_default();
                results.push(NewsResult {
                    date,
                    title: raw.title,
                    body: raw.excerpt,
                    url: raw.url,
                    image: raw.image,
                    source: raw.source,
                });
            }

            if query.max_results.is_some_and(|max| results.len() >= max) || results.len() == before {
                break;
            }
            offset = next_offset(page.next.as_deref());
        }

        if let Some(max) = query.max_results {
            results.truncate(max);
        }
        Ok(results)
    }

    async fn chat(&mut self, keywords: &str, model: ChatModel, timeout: Duration) -> Result<String> {
        if self.session.vqd.is_none() {
            let status_url = format!("{}/duckchat/v1/status", BASE_URL);
            let response = self
                .send_with_retry(|| self.client.get(&status_url).header("x-vqd-accept", "1"))
                .await?;
            let vqd = response
                .headers()
                .get(VQD_HEADER)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| anyhow!("Chat status response carried no session token"))?;
            self.session.vqd = Some(vqd.to_string());
        }

        let mut messages = self.session.messages.clone();
        messages.push(ChatMessage::user(keywords));
        let payload = serde_json::json!({
            "model": model.api_id(),
            "messages": messages,
        });

        let vqd = self.session.vqd.clone().unwrap_or_default();
        let chat_url = format!("{}/duckchat/v1/chat", BASE_URL);
        let response = self
            .client
            .post(&chat_url)
            .header(VQD_HEADER, vqd)
            .json(&payload)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            bail!("Chat request failed: {}", status);
        }
        let next_vqd = response
            .headers()
            .get(VQD_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        let reply = parse_chat_events(&body)?;

        // Commit only after a complete reply
        if let Some(vqd) = next_vqd {
            self.session.vqd = Some(vqd);
        } else {
            warn!("Chat response carried no refreshed session token");
        }
        self.session.tokens += estimate_tokens(keywords) + estimate_tokens(&reply);
        self.session.messages = messages;
        self.session.messages.push(ChatMessage::assistant(&reply));

        Ok(reply)
    }

    fn session_state(&self) -> SessionState {
        self.session.clone()
    }

    fn set_session_state(&mut self, state: SessionState) {
        self.session = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_is_typed() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "https://duckduckgo.com/i.js"),
            NetworkError::RateLimit
        ));

        let err = status_error(StatusCode::FORBIDDEN, "https://duckduckgo.com/i.js");
        assert!(matches!(err, NetworkError::Status { status: 403, .. }));
        assert_eq!(err.to_string(), "Unexpected status 403 from https://duckduckgo.com/i.js");

        // The dispatcher recovers the typed error through anyhow
        let wrapped: anyhow::Error =
            DdgsError::from(status_error(StatusCode::BAD_GATEWAY, "https://duckduckgo.com")).into();
        assert!(matches!(
            wrapped.downcast_ref::<DdgsError>(),
            Some(DdgsError::Network(NetworkError::Status { status: 502, .. }))
        ));
    }

    #[test]
    fn test_extract_vqd() {
        assert_eq!(
            extract_vqd(r#"<script>vqd="4-1234567890";</script>"#).as_deref(),
            Some("4-1234567890")
        );
        assert_eq!(extract_vqd("...&vqd=3-99887766&p=1").as_deref(), Some("3-99887766"));
        assert_eq!(extract_vqd("no token here"), None);
    }

    #[test]
    fn test_image_filters() {
        let mut query = ImagesQuery::new("cats");
        assert_eq!(image_filters(&query), ",,,,,");

        query.timelimit = Some("w".to_string());
        query.layout = Some("Wide".to_string());
        assert_eq!(image_filters(&query), "time:Week,,,,layout:Wide,");
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(Some("i.js?q=cats&o=json&s=100&u=bing")).as_deref(), Some("100"));
        assert_eq!(next_offset(Some("i.js?q=cats")), None);
        assert_eq!(next_offset(None), None);
    }

    #[test]
    fn test_parse_chat_events() {
        let body = "data: {\"message\":\"Hel\",\"role\":\"assistant\"}\n\n\
                    data: {\"message\":\"lo\"}\n\n\
                    data: {\"action\":\"success\"}\n\n\
                    data: [DONE]\n";
        assert_eq!(parse_chat_events(body).unwrap(), "Hello");

        let error = "data: {\"action\":\"error\",\"status\":429,\"type\":\"ERR_CONVERSATION_LIMIT\"}\n";
        let err = parse_chat_events(error).unwrap_err();
        assert!(err.to_string().contains("ERR_CONVERSATION_LIMIT"));
    }

    #[test]
    fn test_parse_text_results() {
        let html = r#"
            <div class="result results_links">
              <a class="result__a" href="https://example.com/a">First <b>hit</b></a>
              <a class="result__snippet">Snippet one</a>
            </div>
            <div class="result result--ad">
              <a class="result__a" href="https://ads.example.com">Ad</a>
            </div>
            <div class="result">
              <a class="result__a" href="https://example.com/a">Duplicate</a>
            </div>
            <div class="result">
              <a class="result__a" href="https://example.com/b">Second</a>
            </div>
        "#;

        let results = parse_text_results(html);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "First hit");
        assert_eq!(results[0].body, "Snippet one");
        assert_eq!(results[1].href, "https://example.com/b");
        assert_eq!(results[1].body, "");
    }
}
