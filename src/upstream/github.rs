use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{json, send, UpstreamError};
use crate::action::{GithubDelete, GithubFile, GithubUpload};
use crate::config::GithubConfig;

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteContentsRequest<'a> {
    message: &'a str,
    sha: &'a str,
}

/// Client for the repository contents API.
pub struct GithubClient {
    client: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(client: reqwest::Client, config: GithubConfig) -> Self {
        Self { client, config }
    }

    /// Each segment is pushed percent-encoded, so nothing in `file` can
    /// change the directory structure of the URL.
    fn contents_url(&self, upstream: &'static str, file: &GithubFile) -> Result<Url, UpstreamError> {
        let invalid = |message: String| UpstreamError::BaseUrl { upstream, message };

        let mut url = Url::parse(&self.config.api_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("`{}` cannot be a base", self.config.api_url)))?
            .pop_if_empty()
            .extend(["repos", file.owner.as_str(), file.repo.as_str(), "contents"])
            .extend(file.path_segments());
        Ok(url)
    }

    fn request(
        &self,
        upstream: &'static str,
        method: Method,
        file: &GithubFile,
    ) -> Result<RequestBuilder, UpstreamError> {
        let url = self.contents_url(upstream, file)?;
        debug!("GitHub {} {}", method, url);
        Ok(self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", &self.config.user_agent))
    }

    pub async fn fetch(&self, file: &GithubFile) -> Result<Value, UpstreamError> {
        let response = send("GitHub", self.request("GitHub", Method::GET, file)?).await?;
        json("GitHub", response).await
    }

    /// Create or replace a file. An empty `sha` counts as a new file.
    pub async fn upload(&self, upload: &GithubUpload) -> Result<Value, UpstreamError> {
        let body = PutContentsRequest {
            message: &upload.message,
            content: &upload.content,
            sha: upload.sha.as_deref().filter(|sha| !sha.is_empty()),
        };
        let request = self
            .request("GitHub Upload", Method::PUT, &upload.file)?
            .json(&body);
        let response = send("GitHub Upload", request).await?;
        json("GitHub Upload", response).await
    }

    pub async fn delete(&self, delete: &GithubDelete) -> Result<(), UpstreamError> {
        let body = DeleteContentsRequest {
            message: &delete.message,
            sha: &delete.sha,
        };
        let request = self
            .request("GitHub Delete", Method::DELETE, &delete.file)?
            .json(&body);
        send("GitHub Delete", request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_body_omits_missing_sha() {
        let body = PutContentsRequest {
            message: "m",
            content: "Yw==",
            sha: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"message": "m", "content": "Yw=="})
        );
    }

    fn client(api_url: &str) -> GithubClient {
        GithubClient::new(
            reqwest::Client::new(),
            GithubConfig {
                api_url: api_url.to_string(),
                ..GithubConfig::default()
            },
        )
    }

    fn file(path: &str) -> GithubFile {
        serde_json::from_value(json!({"owner": "octo", "repo": "site", "path": path})).unwrap()
    }

    #[test]
    fn test_contents_url_keeps_nested_path() {
        let url = client("https://ghe.example.com/api/v3/")
            .contents_url("GitHub", &file("data/items.json"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/octo/site/contents/data/items.json"
        );
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let url = client("https://api.github.com")
            .contents_url("GitHub", &file("notes/a b?x=1#top.md"))
            .unwrap();
        assert_eq!(url.path(), "/repos/octo/site/contents/notes/a%20b%3Fx=1%23top.md");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = client("not a url")
            .contents_url("GitHub Delete", &file("p"))
            .unwrap_err();
        assert!(err.to_string().starts_with("GitHub Delete base URL is invalid"), "{err}");
    }
}
