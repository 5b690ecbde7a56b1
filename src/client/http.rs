//! `reqwest` implementation of the client traits.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::domain::{Bucket, Organization, RetentionRule};
use super::{BucketsApi, ClientError, OrganizationsApi};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one InfluxDB host and API token.
///
/// Cheap to share: the inner `reqwest::Client` pools connections and every
/// method takes `&self`.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Build a client for `host` (e.g. `http://localhost:8086`).
    pub fn new(host: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        let url = Url::parse(host).map_err(|_| ClientError::InvalidUrl(host.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ClientError::InvalidUrl(host.to_string()));
        }

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: url,
            token: token.into(),
        })
    }

    /// The normalized base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/api/v2/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v2"])
            .extend(segments);
        Ok(url)
    }

    /// Endpoint of a single entity. The id always stays one path segment.
    fn entity_endpoint(&self, collection: &str, id: &str) -> Result<Url, ClientError> {
        if matches!(id, "" | "." | "..") {
            return Err(ClientError::Invalid(format!("invalid id {:?}", id)));
        }
        self.endpoint(&[collection, id])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, format!("Token {}", self.token))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.authorize(request).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = self.authorize(request).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body
    } else {
        parsed.message
    };
    debug!(status = status.as_u16(), code = %parsed.code, "request rejected");

    Err(classify(status, parsed.code, message))
}

fn classify(status: StatusCode, code: String, message: String) -> ClientError {
    match code.as_str() {
        "not found" => return ClientError::NotFound(message),
        "conflict" => return ClientError::Conflict(message),
        "unauthorized" | "forbidden" => return ClientError::Unauthorized(message),
        "invalid" | "unprocessable entity" => return ClientError::Invalid(message),
        _ => {},
    }

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Invalid(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        },
    }
}

#[derive(Serialize)]
struct OrganizationBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct OrganizationList {
    #[serde(default)]
    orgs: Vec<Organization>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostBucketBody<'a> {
    #[serde(rename = "orgID")]
    org_id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rp: Option<&'a str>,
    retention_rules: &'a [RetentionRule],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchBucketBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    retention_rules: &'a [RetentionRule],
}

fn require_id<'a>(id: &'a Option<String>, entity: &str) -> Result<&'a str, ClientError> {
    id.as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ClientError::Invalid(format!("{} id is required", entity)))
}

#[async_trait]
impl OrganizationsApi for HttpClient {
    #[instrument(skip(self, org), fields(name = %org.name))]
    async fn create_organization(&self, org: &Organization) -> Result<Organization, ClientError> {
        let body = OrganizationBody {
            name: &org.name,
            description: org.description.as_deref(),
        };
        let url = self.endpoint(&["orgs"])?;
        self.send_json(self.client.post(url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn find_organization_by_id(&self, id: &str) -> Result<Organization, ClientError> {
        let url = self.entity_endpoint("orgs", id)?;
        self.send_json(self.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, ClientError> {
        let url = self.endpoint(&["orgs"])?;
        let list: OrganizationList = self
            .send_json(self.client.get(url).query(&[("org", name)]))
            .await?;
        list.orgs
            .into_iter()
            .find(|org| org.name == name)
            .ok_or_else(|| ClientError::NotFound(format!("organization '{}' not found", name)))
    }

    #[instrument(skip(self, org), fields(id = ?org.id))]
    async fn update_organization(&self, org: &Organization) -> Result<Organization, ClientError> {
        let id = require_id(&org.id, "organization")?;
        let body = OrganizationBody {
            name: &org.name,
            description: org.description.as_deref(),
        };
        let url = self.entity_endpoint("orgs", id)?;
        self.send_json(self.client.patch(url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn delete_organization_with_id(&self, id: &str) -> Result<(), ClientError> {
        let url = self.entity_endpoint("orgs", id)?;
        self.send_empty(self.client.delete(url)).await
    }
}

#[async_trait]
impl BucketsApi for HttpClient {
    #[instrument(skip(self, bucket), fields(name = %bucket.name))]
    async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, ClientError> {
        let org_id = require_id(&bucket.org_id, "organization")?;
        let body = PostBucketBody {
            org_id,
            name: &bucket.name,
            description: bucket.description.as_deref(),
            rp: bucket.rp.as_deref(),
            retention_rules: &bucket.retention_rules,
        };
        let url = self.endpoint(&["buckets"])?;
        self.send_json(self.client.post(url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn find_bucket_by_id(&self, id: &str) -> Result<Bucket, ClientError> {
        let url = self.entity_endpoint("buckets", id)?;
        self.send_json(self.client.get(url)).await
    }

    #[instrument(skip(self, bucket), fields(id = ?bucket.id))]
    async fn update_bucket(&self, bucket: &Bucket) -> Result<Bucket, ClientError> {
        let id = require_id(&bucket.id, "bucket")?;
        let body = PatchBucketBody {
            name: &bucket.name,
            description: bucket.description.as_deref(),
            retention_rules: &bucket.retention_rules,
        };
        let url = self.entity_endpoint("buckets", id)?;
        self.send_json(self.client.patch(url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn delete_bucket_with_id(&self, id: &str) -> Result<(), ClientError> {
        let url = self.entity_endpoint("buckets", id)?;
        self.send_empty(self.client.delete(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_base_url() {
        let client = HttpClient::new("http://localhost:8086/", "token").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8086");
        assert_eq!(
            client.endpoint(&["orgs"]).unwrap().as_str(),
            "http://localhost:8086/api/v2/orgs"
        );
    }

    #[test]
    fn test_new_keeps_path_prefix() {
        let client = HttpClient::new("https://influx.example.com/proxy", "").unwrap();
        assert_eq!(
            client.entity_endpoint("buckets", "01").unwrap().as_str(),
            "https://influx.example.com/proxy/api/v2/buckets/01"
        );
    }

    #[test]
    fn test_entity_id_is_one_encoded_segment() {
        let client = HttpClient::new("http://localhost:8086", "token").unwrap();
        assert_eq!(
            client
                .entity_endpoint("buckets", "../orgs/0000000000000001?x=1")
                .unwrap()
                .as_str(),
            "http://localhost:8086/api/v2/buckets/..%2Forgs%2F0000000000000001%3Fx=1"
        );

        for id in ["", ".", ".."] {
            assert!(matches!(
                client.entity_endpoint("orgs", id),
                Err(ClientError::Invalid(_))
            ));
        }
    }

    #[test]
    fn test_new_rejects_bad_hosts() {
        assert!(matches!(
            HttpClient::new("localhost:8086", "t"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpClient::new("ftp://localhost", "t"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpClient::new("", "t"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = HttpClient::new("http://localhost:8086", "super-secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("localhost:8086"));
    }

    #[test]
    fn test_classify_prefers_error_code() {
        let err = classify(
            StatusCode::UNPROCESSABLE_ENTITY,
            "conflict".to_string(),
            "organization with name firstorg already exists".to_string(),
        );
        assert!(matches!(err, ClientError::Conflict(_)));

        let err = classify(StatusCode::NOT_FOUND, String::new(), "gone".to_string());
        assert!(matches!(err, ClientError::NotFound(_)));

        let err = classify(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
            "boom".to_string(),
        );
        assert!(matches!(err, ClientError::Api { status: 500, .. }));
    }

    #[test]
    fn test_patch_bucket_body_has_no_org_or_rp() {
        let rules = vec![RetentionRule::expire(3600)];
        let body = PatchBucketBody {
            name: "b",
            description: None,
            retention_rules: &rules,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("orgID").is_none());
        assert!(value.get("rp").is_none());
        assert_eq!(value["retentionRules"][0]["everySeconds"], 3600);
    }
}
