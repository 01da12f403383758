//! 出站 HTTPS 客户端，用于拉取远程包清单

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Certificate, Identity, Url};
use std::fs;
use std::path::Path;
use std::time::Duration;

const VERSION_HEADER: &str = "x-lian-version";

pub struct Client {
    inner: reqwest::Client,
    base_url: Url,
}

/// 响应：状态码、Content-Type 和完整正文
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| Error::Manifest(e.to_string()))
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("json"))
            .unwrap_or(false)
    }
}

impl Client {
    pub fn new(base_url: &str, config: &HttpConfig) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            VERSION_HEADER,
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );

        let mut builder = reqwest::Client::builder()
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);

        // CA 证书存在时才校验到该 CA；否则使用系统根证书
        if let Some(ca) = config.ca_cert.as_deref().filter(|p| p.exists()) {
            let pem = read_pem(ca)?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
            log::debug!("使用 CA 证书 {}", ca.display());
        }
        if let (Some(cert), Some(key)) = (config.client_cert.as_deref(), config.client_key.as_deref()) {
            if cert.exists() && key.exists() {
                let identity = Identity::from_pkcs8_pem(&read_pem(cert)?, &read_pem(key)?)?;
                builder = builder.identity(identity);
            }
        }

        Ok(Self {
            inner: builder.build()?,
            base_url,
        })
    }

    pub fn url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|e| Error::InvalidUrl {
                url: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    /// GET base_url + endpoint
    pub async fn get(
        &self,
        endpoint: &str,
        query: Option<&[(&str, &str)]>,
        header: Option<HeaderMap>,
    ) -> Result<Response> {
        let url = self.url(endpoint)?;
        log::debug!("GET {}", url);

        let mut request = self.inner.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(header) = header {
            request = request.headers(header);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await?;

        Ok(Response {
            status,
            content_type,
            body,
        })
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Certificate {
        path: path.display().to_string(),
        source,
    })
}
