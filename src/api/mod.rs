use crate::models::{AssetKind, Block, BlockType, Page};
use serde::{Deserialize, Serialize};

#[cfg(test)]
pub(crate) mod fake;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    NotFound,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn not_found(what: &str) -> Self {
        Self {
            kind: ApiErrorKind::NotFound,
            message: format!("not found: {what}"),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:4317".to_string();

        // Both `window.ENV.API_URL` and the lowercase `window.ENV.api_url` are accepted.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    for key in ["API_URL", "api_url"] {
                        if let Ok(api_url) = js_sys::Reflect::get(&env, &key.into()) {
                            if let Some(url_str) = api_url.as_string() {
                                return Self { api_url: url_str };
                            }
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PageIdRequest {
    pub page_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ParentIdRequest {
    pub parent_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct BlockIdRequest {
    pub block_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreatePageRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdatePageTitleRequest {
    pub page_id: String,
    pub title: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UploadPageAssetRequest {
    pub page_id: String,
    pub source_path: String,
    pub asset_type: AssetKind,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateBlockRequest {
    pub page_id: String,
    pub block_type: BlockType,
    pub content: String,

    /// Reserved; always `None` from this client.
    pub parent_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdateBlockContentRequest {
    pub block_id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ReorderBlockRequest {
    pub block_id: String,
    pub new_order: i32,
}

/// Remote page/block persistence.
///
/// Every method is a single request/response round trip. Futures are not required to be
/// `Send`; callers run them on the single UI thread.
pub(crate) trait PageStore: Clone + 'static {
    async fn fetch_root_pages(&self) -> ApiResult<Vec<Page>>;
    async fn fetch_children(&self, parent_id: &str) -> ApiResult<Vec<Page>>;
    async fn fetch_page(&self, page_id: &str) -> ApiResult<Page>;
    async fn create_page(&self, title: &str, parent_id: Option<&str>) -> ApiResult<Page>;
    async fn update_page_title(&self, page_id: &str, title: &str) -> ApiResult<Page>;
    async fn delete_page(&self, page_id: &str) -> ApiResult<()>;
    async fn validate_page_link(&self, page_id: &str) -> ApiResult<bool>;
    async fn upload_page_asset(
        &self,
        page_id: &str,
        source_path: &str,
        asset_type: AssetKind,
    ) -> ApiResult<String>;

    async fn fetch_page_blocks(&self, page_id: &str) -> ApiResult<Vec<Block>>;
    async fn create_block(
        &self,
        page_id: &str,
        block_type: &BlockType,
        content: &str,
        parent_id: Option<&str>,
    ) -> ApiResult<Block>;
    async fn delete_block(&self, block_id: &str) -> ApiResult<()>;
    async fn update_block_content(&self, block_id: &str, content: &str) -> ApiResult<Block>;
    async fn reorder_block(&self, block_id: &str, new_order: i32) -> ApiResult<Block>;
}

/// HTTP client for the page store. Every command is `POST {base_url}/api/{command}`.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url).with_token(crate::storage::load_token())
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    fn command_url(&self, command: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), command)
    }

    async fn send(
        &self,
        command: &str,
        body: &impl Serialize,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let mut req = client.post(self.command_url(command)).json(body);
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else if status.as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else if status.as_u16() == 404 {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::not_found(&format!("{command}: {body}")))
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, command))
        }
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        command: &str,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let res = self.send(command, body).await?;
        res.json().await.map_err(ApiError::parse)
    }

    /// For commands whose response body carries nothing of interest (may be empty).
    async fn request_api_unit(&self, command: &str, body: &impl Serialize) -> ApiResult<()> {
        self.send(command, body).await.map(|_| ())
    }
}

impl PageStore for ApiClient {
    async fn fetch_root_pages(&self) -> ApiResult<Vec<Page>> {
        self.request_api("get_root_pages", &serde_json::json!({})).await
    }

    async fn fetch_children(&self, parent_id: &str) -> ApiResult<Vec<Page>> {
        self.request_api(
            "get_child_pages",
            &ParentIdRequest {
                parent_id: parent_id.to_string(),
            },
        )
        .await
    }

    async fn fetch_page(&self, page_id: &str) -> ApiResult<Page> {
        self.request_api(
            "get_page",
            &PageIdRequest {
                page_id: page_id.to_string(),
            },
        )
        .await
    }

    async fn create_page(&self, title: &str, parent_id: Option<&str>) -> ApiResult<Page> {
        let command = if parent_id.is_some() {
            "create_nested_page"
        } else {
            "create_page"
        };
        self.request_api(
            command,
            &CreatePageRequest {
                title: title.to_string(),
                parent_id: parent_id.map(str::to_string),
            },
        )
        .await
    }

    async fn update_page_title(&self, page_id: &str, title: &str) -> ApiResult<Page> {
        self.request_api(
            "update_page_title",
            &UpdatePageTitleRequest {
                page_id: page_id.to_string(),
                title: title.to_string(),
            },
        )
        .await
    }

    async fn delete_page(&self, page_id: &str) -> ApiResult<()> {
        self.request_api_unit(
            "delete_page",
            &PageIdRequest {
                page_id: page_id.to_string(),
            },
        )
        .await
    }

    async fn validate_page_link(&self, page_id: &str) -> ApiResult<bool> {
        self.request_api(
            "validate_page_link",
            &PageIdRequest {
                page_id: page_id.to_string(),
            },
        )
        .await
    }

    async fn upload_page_asset(
        &self,
        page_id: &str,
        source_path: &str,
        asset_type: AssetKind,
    ) -> ApiResult<String> {
        self.request_api(
            "upload_page_asset",
            &UploadPageAssetRequest {
                page_id: page_id.to_string(),
                source_path: source_path.to_string(),
                asset_type,
            },
        )
        .await
    }

    async fn fetch_page_blocks(&self, page_id: &str) -> ApiResult<Vec<Block>> {
        self.request_api(
            "get_page_blocks",
            &PageIdRequest {
                page_id: page_id.to_string(),
            },
        )
        .await
    }

    async fn create_block(
        &self,
        page_id: &str,
        block_type: &BlockType,
        content: &str,
        parent_id: Option<&str>,
    ) -> ApiResult<Block> {
        self.request_api(
            "create_block",
            &CreateBlockRequest {
                page_id: page_id.to_string(),
                block_type: block_type.clone(),
                content: content.to_string(),
                parent_id: parent_id.map(str::to_string),
            },
        )
        .await
    }

    async fn delete_block(&self, block_id: &str) -> ApiResult<()> {
        self.request_api_unit(
            "delete_block",
            &BlockIdRequest {
                block_id: block_id.to_string(),
            },
        )
        .await
    }

    async fn update_block_content(&self, block_id: &str, content: &str) -> ApiResult<Block> {
        self.request_api(
            "update_block_content",
            &UpdateBlockContentRequest {
                block_id: block_id.to_string(),
                content: content.to_string(),
            },
        )
        .await
    }

    async fn reorder_block(&self, block_id: &str, new_order: i32) -> ApiResult<Block> {
        self.request_api(
            "reorder_block",
            &ReorderBlockRequest {
                block_id: block_id.to_string(),
                new_order,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:4317".to_string());
        assert_eq!(client.base_url, "http://localhost:4317");
        assert!(client.token.is_none());
    }

    #[test]
    fn test_api_client_get_auth_header_with_token() {
        let client = ApiClient::new("http://localhost:4317".to_string());
        assert!(client.get_auth_header().is_none());
        let client = client.with_token(Some("my-jwt-token".to_string()));
        let header = client.get_auth_header().expect("Should have auth header");
        assert_eq!(header, "Bearer my-jwt-token");
    }

    #[test]
    fn test_command_url_ignores_trailing_slash() {
        let client = ApiClient::new("http://localhost:4317/".to_string());
        assert_eq!(
            client.command_url("get_root_pages"),
            "http://localhost:4317/api/get_root_pages"
        );
    }

    #[test]
    fn test_create_block_request_serialization() {
        let req = CreateBlockRequest {
            page_id: "p1".to_string(),
            block_type: BlockType::SubPage {
                page_id: "p2".to_string(),
            },
            content: "Child".to_string(),
            parent_id: None,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["page_id"], "p1");
        assert_eq!(v["block_type"]["type"], "SubPage");
        assert_eq!(v["block_type"]["data"]["page_id"], "p2");
        assert!(v["parent_id"].is_null());
    }

    #[test]
    fn test_root_page_request_omits_parent() {
        let v = serde_json::to_value(CreatePageRequest {
            title: "Root".to_string(),
            parent_id: None,
        })
        .expect("should serialize");
        assert!(v.get("parent_id").is_none());
    }

    #[test]
    fn test_upload_request_uses_lowercase_asset_type() {
        let v = serde_json::to_value(UploadPageAssetRequest {
            page_id: "p1".to_string(),
            source_path: "/tmp/cover.png".to_string(),
            asset_type: AssetKind::Cover,
        })
        .expect("should serialize");
        assert_eq!(v["asset_type"], "cover");
    }
}
