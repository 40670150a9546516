//! Instagram web client
//!
//! Talks to the same endpoints the Instagram web app uses: the AJAX login
//! form, the GraphQL shortcode query, and plain CDN downloads.

use super::{InstagramApi, MediaItem, Post, Session};
use crate::config::{InstagramConfig, SecretString};
use crate::error::{FetchError, LoginError};
use crate::relay::media::MediaKind;
use crate::utils::truncate_str;
use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Instagram internal app ID (public, embedded in the web app).
const IG_APP_ID: &str = "936619743392459";

/// HTTP implementation of [`InstagramApi`].
pub struct InstagramClient {
    http: Client,
    base_url: String,
    doc_id: String,
}

impl InstagramClient {
    pub fn new(config: &InstagramConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build Instagram HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            doc_id: config.graphql_doc_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn download_to(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                detail: format!("media download failed for {}", path.display()),
            });
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

#[async_trait]
impl InstagramApi for InstagramClient {
    async fn login(&self, username: &str, password: &SecretString) -> Result<Session, LoginError> {
        let unexpected = |e: reqwest::Error| LoginError::Unexpected(e.to_string());
        let mut jar = BTreeMap::new();

        // The login page hands out the csrftoken cookie the form post needs.
        let page = self
            .http
            .get(self.url("/accounts/login/"))
            .send()
            .await
            .map_err(unexpected)?;
        absorb_cookies(&mut jar, page.headers());

        let csrf_token = jar
            .get("csrftoken")
            .cloned()
            .ok_or_else(|| LoginError::Unexpected("Instagram did not issue a CSRF token".to_string()))?;

        let enc_password = format!(
            "#PWD_INSTAGRAM_BROWSER:0:{}:{}",
            chrono::Utc::now().timestamp(),
            password.expose_secret()
        );

        let response = self
            .http
            .post(self.url("/accounts/login/ajax/"))
            .header("X-CSRFToken", &csrf_token)
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", self.url("/accounts/login/"))
            .header("Cookie", cookie_header(&jar))
            .form(&[
                ("username", username),
                ("enc_password", enc_password.as_str()),
                ("queryParams", "{}"),
                ("optIntoOneTap", "false"),
            ])
            .send()
            .await
            .map_err(unexpected)?;

        let status = response.status().as_u16();
        absorb_cookies(&mut jar, response.headers());
        let body = response.text().await.map_err(unexpected)?;

        classify_login(status, &body)?;

        tracing::info!("Instagram: logged in as {}", username);
        Ok(Session {
            username: username.to_string(),
            csrf_token: jar.get("csrftoken").cloned().unwrap_or(csrf_token),
            cookie_header: cookie_header(&jar),
        })
    }

    async fn resolve_post(&self, session: &Session, shortcode: &str) -> Result<Post, FetchError> {
        let variables = serde_json::json!({ "shortcode": shortcode }).to_string();

        let response = self
            .http
            .post(self.url("/api/graphql"))
            .header("X-CSRFToken", &session.csrf_token)
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Cookie", &session.cookie_header)
            .body(format!(
                "doc_id={}&variables={}",
                self.doc_id,
                urlencoding::encode(&variables)
            ))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                detail: truncate_str(&text, 200).to_string(),
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                "Instagram: GraphQL returned non-JSON ({}): {}",
                e,
                truncate_str(&text, 300)
            );
            FetchError::Parse(e.to_string())
        })?;

        let post = parse_post(shortcode, &body)?;
        tracing::info!(
            "Instagram: resolved {} by {} with {} media item(s)",
            shortcode,
            post.owner.as_deref().unwrap_or("unknown owner"),
            post.items.len()
        );
        Ok(post)
    }

    async fn download_post(
        &self,
        _session: &Session,
        post: &Post,
        target: &Path,
    ) -> Result<Vec<PathBuf>, FetchError> {
        tokio::fs::create_dir_all(target).await?;

        let mut written = Vec::with_capacity(post.items.len());
        for (index, item) in post.items.iter().enumerate() {
            let path = target.join(media_file_name(&post.shortcode, index, item.kind));
            let bytes = self.download_to(&item.url, &path).await?;
            tracing::debug!("Instagram: wrote {} bytes to {:?}", bytes, path);
            written.push(path);
        }
        Ok(written)
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    authenticated: Option<bool>,
    two_factor_required: Option<bool>,
    checkpoint_url: Option<String>,
    error_type: Option<String>,
    message: Option<String>,
}

/// Map the login endpoint's answer onto the three failure kinds.
fn classify_login(status: u16, body: &str) -> Result<(), LoginError> {
    let Ok(response) = serde_json::from_str::<LoginResponse>(body) else {
        return Err(LoginError::Unexpected(format!(
            "login failed (HTTP {}): {}",
            status,
            truncate_str(body, 200)
        )));
    };

    if response.two_factor_required == Some(true) {
        return Err(LoginError::TwoFactorRequired);
    }
    if response.authenticated == Some(true) {
        return Ok(());
    }

    let bad_credentials = matches!(
        response.error_type.as_deref(),
        Some("bad_password") | Some("invalid_user")
    ) || (response.authenticated == Some(false) && response.checkpoint_url.is_none());
    if bad_credentials {
        return Err(LoginError::BadCredentials);
    }

    Err(LoginError::Unexpected(response.message.unwrap_or_else(|| {
        format!("login rejected (HTTP {})", status)
    })))
}

fn parse_post(shortcode: &str, body: &Value) -> Result<Post, FetchError> {
    let media = body
        .pointer("/data/xdt_shortcode_media")
        .or_else(|| body.pointer("/data/shortcode_media"))
        .filter(|v| !v.is_null())
        .ok_or_else(|| {
            let message = body.pointer("/message").and_then(Value::as_str).unwrap_or("");
            if message.contains("login_required") || message.contains("checkpoint_required") {
                FetchError::NotFound("private account or login required".to_string())
            } else {
                FetchError::NotFound(shortcode.to_string())
            }
        })?;

    let caption = media
        .pointer("/edge_media_to_caption/edges/0/node/text")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .map(String::from);

    let owner = media
        .pointer("/owner/username")
        .and_then(Value::as_str)
        .map(String::from);

    let items = match media
        .pointer("/edge_sidecar_to_children/edges")
        .and_then(Value::as_array)
    {
        Some(edges) => edges
            .iter()
            .filter_map(|edge| edge.get("node"))
            .filter_map(media_item)
            .collect(),
        None => media_item(media).into_iter().collect(),
    };

    Ok(Post {
        shortcode: shortcode.to_string(),
        caption,
        owner,
        items,
    })
}

fn media_item(node: &Value) -> Option<MediaItem> {
    let is_video = node.get("is_video").and_then(Value::as_bool).unwrap_or(false);
    let video_url = node.get("video_url").and_then(Value::as_str);
    let display_url = node.get("display_url").and_then(Value::as_str);

    match (is_video, video_url, display_url) {
        (true, Some(url), _) => Some(MediaItem {
            kind: MediaKind::Video,
            url: url.to_string(),
        }),
        (_, _, Some(url)) => Some(MediaItem {
            kind: MediaKind::Photo,
            url: url.to_string(),
        }),
        _ => None,
    }
}

fn media_file_name(shortcode: &str, index: usize, kind: MediaKind) -> String {
    format!("{}_{:02}.{}", shortcode, index + 1, kind.extension())
}

fn absorb_cookies(jar: &mut BTreeMap<String, String>, headers: &HeaderMap) {
    for value in headers.get_all(SET_COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        let pair = raw.split(';').next().unwrap_or("");
        let Some((name, val)) = pair.split_once('=') else {
            continue;
        };
        let (name, val) = (name.trim(), val.trim().trim_matches('"'));
        if name.is_empty() {
            continue;
        }
        if val.is_empty() {
            jar.remove(name);
        } else {
            jar.insert(name.to_string(), val.to_string());
        }
    }
}

fn cookie_header(jar: &BTreeMap<String, String>) -> String {
    jar.iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::header::HeaderValue;
    use tempfile::TempDir;

    fn client_for(server: &mockito::ServerGuard) -> InstagramClient {
        let config = InstagramConfig {
            base_url: server.url(),
            ..InstagramConfig::default()
        };
        InstagramClient::new(&config).unwrap()
    }

    fn session() -> Session {
        Session {
            username: "relay".to_string(),
            csrf_token: "tok".to_string(),
            cookie_header: "csrftoken=tok; sessionid=s1".to_string(),
        }
    }

    fn graphql_single_video() -> Value {
        serde_json::json!({
            "data": {
                "xdt_shortcode_media": {
                    "is_video": true,
                    "video_url": "https://cdn.example/v.mp4",
                    "display_url": "https://cdn.example/thumb.jpg",
                    "owner": { "username": "someone" },
                    "edge_media_to_caption": {
                        "edges": [ { "node": { "text": "sunset 🌅" } } ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_classify_login() {
        assert!(classify_login(200, r#"{"authenticated":true,"user":true,"status":"ok"}"#).is_ok());
        assert!(matches!(
            classify_login(200, r#"{"authenticated":false,"user":true,"status":"ok"}"#),
            Err(LoginError::BadCredentials)
        ));
        assert!(matches!(
            classify_login(400, r#"{"message":"wrong","error_type":"bad_password","status":"fail"}"#),
            Err(LoginError::BadCredentials)
        ));
        assert!(matches!(
            classify_login(400, r#"{"two_factor_required":true,"status":"fail"}"#),
            Err(LoginError::TwoFactorRequired)
        ));
        assert!(matches!(
            classify_login(400, r#"{"message":"checkpoint_required","checkpoint_url":"/challenge/","authenticated":false}"#),
            Err(LoginError::Unexpected(m)) if m == "checkpoint_required"
        ));
        assert!(matches!(
            classify_login(502, "<html>bad gateway</html>"),
            Err(LoginError::Unexpected(m)) if m.contains("502")
        ));
    }

    #[test]
    fn test_parse_single_video() {
        let post = parse_post("ABC123", &graphql_single_video()).unwrap();
        assert_eq!(post.shortcode, "ABC123");
        assert_eq!(post.caption.as_deref(), Some("sunset 🌅"));
        assert_eq!(post.owner.as_deref(), Some("someone"));
        assert_eq!(
            post.items,
            vec![MediaItem {
                kind: MediaKind::Video,
                url: "https://cdn.example/v.mp4".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_sidecar_without_caption() {
        let body = serde_json::json!({
            "data": {
                "shortcode_media": {
                    "is_video": false,
                    "display_url": "https://cdn.example/cover.jpg",
                    "edge_media_to_caption": { "edges": [] },
                    "edge_sidecar_to_children": {
                        "edges": [
                            { "node": { "is_video": false, "display_url": "https://cdn.example/1.jpg" } },
                            { "node": { "is_video": true, "video_url": "https://cdn.example/2.mp4", "display_url": "https://cdn.example/2.jpg" } },
                            { "node": { "is_video": true } }
                        ]
                    }
                }
            }
        });
        let post = parse_post("SIDE", &body).unwrap();
        assert!(post.caption.is_none());
        assert_eq!(post.items.len(), 2);
        assert_eq!(post.items[0].kind, MediaKind::Photo);
        assert_eq!(post.items[1].kind, MediaKind::Video);
    }

    #[test]
    fn test_parse_missing_media() {
        let err = parse_post("NOPE", &serde_json::json!({"data": {"xdt_shortcode_media": null}}))
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(ref s) if s == "NOPE"));

        let err = parse_post("PRIV", &serde_json::json!({"message": "login_required"})).unwrap_err();
        assert!(err.to_string().contains("login required"));
    }

    #[test]
    fn test_media_file_name() {
        assert_eq!(media_file_name("ABC", 0, MediaKind::Video), "ABC_01.mp4");
        assert_eq!(media_file_name("ABC", 11, MediaKind::Photo), "ABC_12.jpg");
    }

    #[test]
    fn test_cookie_jar() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("csrftoken=abc; Path=/; Secure"));
        headers.append(SET_COOKIE, HeaderValue::from_static("sessionid=\"s1\"; HttpOnly"));
        headers.append(SET_COOKIE, HeaderValue::from_static("junk"));

        let mut jar = BTreeMap::new();
        absorb_cookies(&mut jar, &headers);
        assert_eq!(cookie_header(&jar), "csrftoken=abc; sessionid=s1");

        let mut cleared = HeaderMap::new();
        cleared.append(SET_COOKIE, HeaderValue::from_static("sessionid=; Max-Age=0"));
        absorb_cookies(&mut jar, &cleared);
        assert_eq!(cookie_header(&jar), "csrftoken=abc");
    }

    // --- HTTP tests with mock server ---

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/accounts/login/")
            .with_status(200)
            .with_header("set-cookie", "csrftoken=tok123; Path=/")
            .create_async()
            .await;
        let ajax = server
            .mock("POST", "/accounts/login/ajax/")
            .match_header("x-csrftoken", "tok123")
            .match_body(Matcher::Regex("username=relay".to_string()))
            .with_status(200)
            .with_header("set-cookie", "sessionid=s1; Path=/; HttpOnly")
            .with_body(r#"{"authenticated":true,"user":true,"status":"ok"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let session = client
            .login("relay", &SecretString::new("pw"))
            .await
            .unwrap();

        page.assert_async().await;
        ajax.assert_async().await;
        assert_eq!(session.username, "relay");
        assert_eq!(session.csrf_token, "tok123");
        assert!(session.cookie_header.contains("sessionid=s1"));
    }

    #[tokio::test]
    async fn test_login_two_factor() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/accounts/login/")
            .with_header("set-cookie", "csrftoken=tok; Path=/")
            .create_async()
            .await;
        server
            .mock("POST", "/accounts/login/ajax/")
            .with_status(400)
            .with_body(r#"{"two_factor_required":true,"status":"fail"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .login("relay", &SecretString::new("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::TwoFactorRequired));
    }

    #[tokio::test]
    async fn test_login_without_csrf_cookie() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/accounts/login/")
            .with_status(200)
            .create_async()
            .await;

        let err = client_for(&server)
            .login("relay", &SecretString::new("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::Unexpected(ref m) if m.contains("CSRF")));
    }

    #[tokio::test]
    async fn test_resolve_post() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/graphql")
            .match_header("cookie", "csrftoken=tok; sessionid=s1")
            .match_body(Matcher::Regex(
                "variables=%7B%22shortcode%22%3A%22ABC123%22%7D".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(graphql_single_video().to_string())
            .create_async()
            .await;

        let post = client_for(&server)
            .resolve_post(&session(), "ABC123")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(post.items.len(), 1);
        assert_eq!(post.caption.as_deref(), Some("sunset 🌅"));
    }

    #[tokio::test]
    async fn test_resolve_post_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let err = client_for(&server)
            .resolve_post(&session(), "ABC123")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_resolve_post_non_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_body("<html>login</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .resolve_post(&session(), "ABC123")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_download_post_writes_files() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/media/v.mp4")
            .with_status(200)
            .with_body(vec![1u8, 2, 3, 4])
            .create_async()
            .await;
        server
            .mock("GET", "/media/p.jpg")
            .with_status(200)
            .with_body(vec![9u8; 10])
            .create_async()
            .await;

        let post = Post {
            shortcode: "ABC123".to_string(),
            caption: None,
            owner: None,
            items: vec![
                MediaItem {
                    kind: MediaKind::Video,
                    url: format!("{}/media/v.mp4", server.url()),
                },
                MediaItem {
                    kind: MediaKind::Photo,
                    url: format!("{}/media/p.jpg", server.url()),
                },
            ],
        };

        let dir = TempDir::new().unwrap();
        let files = client_for(&server)
            .download_post(&session(), &post, dir.path())
            .await
            .unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("ABC123_01.mp4"), dir.path().join("ABC123_02.jpg")]
        );
        assert_eq!(std::fs::read(&files[0]).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(std::fs::read(&files[1]).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_download_post_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/media/gone.mp4")
            .with_status(404)
            .create_async()
            .await;

        let post = Post {
            shortcode: "ABC123".to_string(),
            caption: None,
            owner: None,
            items: vec![MediaItem {
                kind: MediaKind::Video,
                url: format!("{}/media/gone.mp4", server.url()),
            }],
        };

        let dir = TempDir::new().unwrap();
        let err = client_for(&server)
            .download_post(&session(), &post, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }
}
