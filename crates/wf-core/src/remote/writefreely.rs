//! WriteFreely JSON API client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::{PostPayload, RemoteClient, RemoteError, RemoteResult};
use crate::models::{AccountSession, Collection, PostContent, PostFont, PostLocale, RemotePost};
use crate::util::{compact_text, normalize_text_option};

const HTTP_TIMEOUT_SECS: u64 = 15;

/// HTTP client for a WriteFreely-compatible server
#[derive(Clone)]
pub struct WriteFreelyClient {
    client: Client,
}

impl WriteFreelyClient {
    pub fn new() -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("wf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn authorized(request: RequestBuilder, session: &AccountSession) -> RequestBuilder {
        request
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", session.token))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(request: RequestBuilder) -> RemoteResult<Response> {
        request.send().await.map_err(|error| {
            if error.is_connect() || error.is_timeout() {
                RemoteError::Unreachable(error.to_string())
            } else {
                RemoteError::Http(error)
            }
        })
    }

    async fn read_data<T: for<'de> Deserialize<'de>>(response: Response) -> RemoteResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|error| RemoteError::Payload(error.to_string()))?;
        Ok(envelope.data)
    }
}

impl RemoteClient for WriteFreelyClient {
    async fn login(&self, server: &str, username: &str, password: &str) -> RemoteResult<String> {
        let payload = serde_json::json!({
            "alias": username,
            "pass": password,
        });
        let request = self
            .client
            .post(format!("{server}/api/auth/login"))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload);

        let response = Self::send(request).await?;
        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(RemoteError::Unauthorized),
            StatusCode::NOT_FOUND => return Err(RemoteError::UserNotFound),
            _ => {}
        }

        let data: LoginData = Self::read_data(response).await?;
        normalize_text_option(Some(data.access_token))
            .ok_or_else(|| RemoteError::Payload("login response had an empty token".to_string()))
    }

    async fn logout(&self, session: &AccountSession) -> RemoteResult<()> {
        let request = Self::authorized(
            self.client
                .delete(format!("{}/api/auth/me", session.account.server)),
            session,
        );
        let response = Self::send(request).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(api_error(status, &body))
        }
    }

    async fn fetch_collections(&self, session: &AccountSession) -> RemoteResult<Vec<Collection>> {
        let request = Self::authorized(
            self.client
                .get(format!("{}/api/me/collections", session.account.server)),
            session,
        );
        let collections: Vec<CollectionData> = Self::read_data(Self::send(request).await?).await?;
        Ok(collections
            .into_iter()
            .map(|collection| Collection {
                title: collection.title.unwrap_or_else(|| collection.alias.clone()),
                alias: collection.alias,
            })
            .collect())
    }

    async fn fetch_posts(&self, session: &AccountSession) -> RemoteResult<Vec<RemotePost>> {
        let request = Self::authorized(
            self.client
                .get(format!("{}/api/me/posts", session.account.server)),
            session,
        );
        let posts: Vec<PostData> = Self::read_data(Self::send(request).await?).await?;
        posts.into_iter().map(PostData::into_remote).collect()
    }

    async fn create_post(
        &self,
        session: &AccountSession,
        collection_alias: Option<&str>,
        payload: &PostPayload,
    ) -> RemoteResult<RemotePost> {
        let url = match collection_alias {
            Some(alias) => format!(
                "{}/api/collections/{}/posts",
                session.account.server,
                path_segment(alias)
            ),
            None => format!("{}/api/posts", session.account.server),
        };
        let request = Self::authorized(self.client.post(url).json(&post_body(payload)), session);
        let post: PostData = Self::read_data(Self::send(request).await?).await?;
        post.into_remote()
    }

    async fn update_post(
        &self,
        session: &AccountSession,
        remote_id: &str,
        payload: &PostPayload,
    ) -> RemoteResult<RemotePost> {
        let url = format!(
            "{}/api/posts/{}",
            session.account.server,
            path_segment(remote_id)
        );
        let request = Self::authorized(self.client.post(url).json(&post_body(payload)), session);
        let post: PostData = Self::read_data(Self::send(request).await?).await?;
        post.into_remote()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CollectionData {
    alias: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionRef {
    alias: String,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    slug: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    appearance: Option<String>,
    language: Option<String>,
    #[serde(default)]
    rtl: bool,
    created: Option<String>,
    updated: Option<String>,
    collection: Option<CollectionRef>,
}

impl PostData {
    fn into_remote(self) -> RemoteResult<RemotePost> {
        let created_at = parse_timestamp(self.created.as_deref())?.unwrap_or_default();
        let updated_at = parse_timestamp(self.updated.as_deref())?;
        let language = normalize_text_option(self.language);
        Ok(RemotePost {
            remote_id: self.id,
            slug: normalize_text_option(self.slug),
            content: PostContent {
                title: self.title,
                body: self.body,
            },
            collection_alias: self.collection.map(|collection| collection.alias),
            created_at,
            updated_at,
            font: self
                .appearance
                .as_deref()
                .map_or_else(PostFont::default, PostFont::from_appearance),
            locale: PostLocale {
                language,
                is_rtl: self.rtl,
            },
        })
    }
}

fn post_body(payload: &PostPayload) -> serde_json::Value {
    serde_json::json!({
        "title": payload.content.title,
        "body": payload.content.body,
        "font": payload.font.server_appearance(),
        "lang": payload.language,
        "rtl": payload.is_rtl,
    })
}

fn parse_timestamp(value: Option<&str>) -> RemoteResult<Option<i64>> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|date_time| Some(date_time.timestamp_millis()))
        .map_err(|error| RemoteError::Payload(format!("invalid timestamp '{value}': {error}")))
}

fn path_segment(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
        .collect()
}

fn api_error(status: StatusCode, body: &str) -> RemoteError {
    if status == StatusCode::UNAUTHORIZED {
        return RemoteError::Unauthorized;
    }

    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|payload| normalize_text_option(payload.error_msg))
        .unwrap_or_else(|| {
            let trimmed = compact_text(body);
            if trimmed.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                trimmed
            }
        });

    RemoteError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_data_maps_server_fields() {
        let payload = r#"{
            "id": "rf3t35fkax0aw",
            "slug": "my-post",
            "appearance": "code",
            "language": "ar",
            "rtl": true,
            "created": "2020-07-22T12:00:00Z",
            "updated": "2020-07-23T12:00:00Z",
            "title": "My Post",
            "body": "Hello",
            "collection": { "alias": "blog" }
        }"#;
        let data: PostData = serde_json::from_str(payload).unwrap();
        let post = data.into_remote().unwrap();

        assert_eq!(post.remote_id, "rf3t35fkax0aw");
        assert_eq!(post.slug.as_deref(), Some("my-post"));
        assert_eq!(post.content, PostContent::new("My Post", "Hello"));
        assert_eq!(post.collection_alias.as_deref(), Some("blog"));
        assert_eq!(post.font, PostFont::Wrap);
        assert!(post.locale.is_rtl);
        assert_eq!(post.created_at, 1_595_419_200_000);
        assert_eq!(post.updated_at, Some(1_595_505_600_000));
    }

    #[test]
    fn post_data_tolerates_missing_optional_fields() {
        let data: PostData = serde_json::from_str(r#"{ "id": "x" }"#).unwrap();
        let post = data.into_remote().unwrap();
        assert_eq!(post.content, PostContent::default());
        assert_eq!(post.collection_alias, None);
        assert_eq!(post.updated_at, None);
        assert_eq!(post.font, PostFont::Serif);
    }

    #[test]
    fn invalid_timestamp_is_a_payload_error() {
        let data: PostData =
            serde_json::from_str(r#"{ "id": "x", "created": "yesterday" }"#).unwrap();
        assert!(matches!(data.into_remote(), Err(RemoteError::Payload(_))));
    }

    #[test]
    fn api_error_prefers_server_message() {
        let error = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":400,"error_msg":"Post body is required."}"#,
        );
        match error {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Post body is required.");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            api_error(StatusCode::UNAUTHORIZED, ""),
            RemoteError::Unauthorized
        ));
        assert!(matches!(
            api_error(StatusCode::BAD_GATEWAY, ""),
            RemoteError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn post_body_uses_server_appearance_names() {
        let mut payload = PostPayload {
            content: PostContent::new("T", "B"),
            font: PostFont::Serif,
            language: Some("en".to_string()),
            is_rtl: false,
        };
        assert_eq!(post_body(&payload)["font"], "norm");
        assert_eq!(post_body(&payload)["lang"], "en");

        payload.font = PostFont::Wrap;
        assert_eq!(post_body(&payload)["font"], "wrap");
        assert_eq!(
            PostFont::from_appearance(PostFont::Serif.server_appearance()),
            PostFont::Serif
        );
    }

    #[test]
    fn path_segment_strips_separators() {
        assert_eq!(path_segment("my-blog"), "my-blog");
        assert_eq!(path_segment("../etc/passwd"), "etcpasswd");
    }
}
