//! An authenticated client for Google Cloud JSON APIs.

use mime::Mime;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    IntoUrl, Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_derive::Deserialize;
use std::{error, fmt};
use tokio::sync::OnceCell;

use super::auth::{authenticator, AccessToken, Authenticator};
use crate::common::*;
use crate::tls::install_crypto_provider;

/// We only ever read and write Cloud Storage objects.
static SCOPES: &[&str] = &["https://www.googleapis.com/auth/devstorage.read_write"];

/// Bills a request to this project instead of the bucket owner's.
static USER_PROJECT_HEADER: &str = "x-goog-user-project";

/// A failed Google Cloud request.
///
/// Callers usually only care whether the thing they asked for exists, so
/// `404 Not Found` gets its own variant.
#[derive(Debug)]
pub(crate) enum ClientError {
    /// `method` on `url` returned `404 Not Found`.
    NotFound { method: Method, url: Url },
    /// Any other failure, with context.
    Other(Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::NotFound { method, url } => {
                write!(f, "{} {} returned 404 Not Found", method, url)
            }
            ClientError::Other(err) => write!(f, "{:#}", err),
        }
    }
}

impl error::Error for ClientError {}

impl From<Error> for ClientError {
    fn from(err: Error) -> Self {
        ClientError::Other(err)
    }
}

/// Sends requests to Google Cloud with an OAuth2 bearer token.
///
/// Credentials are not looked up until the first request, so that a missing
/// credential fails that request instead of the whole program.
pub(crate) struct Client {
    authenticator: OnceCell<Authenticator>,
    /// Sent with every request.
    default_headers: HeaderMap,
    http: reqwest::Client,
}

impl Client {
    /// Create a client, billing requests to `user_project` if one is given.
    pub(crate) fn new(user_project: Option<&str>) -> Result<Client> {
        install_crypto_provider();
        let mut default_headers = HeaderMap::default();
        if let Some(project) = user_project {
            let value = HeaderValue::from_str(project)
                .with_context(|| format!("invalid project ID {:?}", project))?;
            default_headers.insert(USER_PROJECT_HEADER, value);
        }
        Ok(Client {
            authenticator: OnceCell::new(),
            default_headers,
            http: reqwest::Client::new(),
        })
    }

    /// `GET` a JSON resource.
    pub(crate) async fn get<Output, U, Query>(
        &self,
        url: U,
        query: Query,
    ) -> Result<Output, ClientError>
    where
        Output: fmt::Debug + DeserializeOwned,
        U: IntoUrl,
        Query: Serialize,
    {
        let url = build_url(url, query)?;
        self.send(Method::GET, url, |req| req).await
    }

    /// `POST` a request body, which may be a stream, and decode the JSON
    /// response.
    pub(crate) async fn post_stream<Output, U, Query>(
        &self,
        url: U,
        query: Query,
        body: reqwest::Body,
        headers: HeaderMap,
    ) -> Result<Output, ClientError>
    where
        Output: fmt::Debug + DeserializeOwned,
        U: IntoUrl,
        Query: Serialize,
    {
        let url = build_url(url, query)?;
        self.send(Method::POST, url, move |req| req.headers(headers).body(body))
            .await
    }

    /// Authenticate and send a request, letting `customize` add a body or
    /// extra headers.
    #[instrument(
        level = "trace",
        skip(self, url, customize),
        fields(url = %url)
    )]
    async fn send<Output, F>(
        &self,
        method: Method,
        url: Url,
        customize: F,
    ) -> Result<Output, ClientError>
    where
        Output: fmt::Debug + DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let token = self.token().await?;
        let req = self
            .http
            .request(method.clone(), url.as_str())
            .bearer_auth(token.as_str())
            .headers(self.default_headers.clone());
        let resp = customize(req)
            .send()
            .await
            .with_context(|| format!("could not {} {}", method, url))?;

        if !resp.status().is_success() {
            return Err(error_from_response(method, url, resp).await);
        }
        let output = resp
            .json::<Output>()
            .await
            .with_context(|| format!("cannot decode JSON from {} {}", method, url))?;
        trace!("{} {} returned {:?}", method, url, output);
        Ok(output)
    }

    /// Get a token, creating our authenticator if this is the first request.
    async fn token(&self) -> Result<AccessToken> {
        let authenticator = self.authenticator.get_or_try_init(authenticator).await?;
        authenticator
            .token(SCOPES)
            .await
            .context("could not get a Google Cloud access token")
    }
}

/// Turn a failed response into a `ClientError`, using Google's JSON error body
/// when there is one.
async fn error_from_response(
    method: Method,
    url: Url,
    resp: reqwest::Response,
) -> ClientError {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return ClientError::NotFound { method, url };
    }

    let is_json = is_json_response(&resp);
    let body = match resp.bytes().await {
        Ok(body) => body,
        Err(err) => {
            let err = Error::new(err).context(format!(
                "{} {} returned {}, and the error body could not be read",
                method, url, status,
            ));
            return err.into();
        }
    };

    let cause = match serde_json::from_slice::<ErrorResponse>(&body) {
        Ok(parsed) if is_json => Error::new(parsed.error),
        _ => format_err!("{}: {:?}", status, String::from_utf8_lossy(&body)),
    };
    cause.context(format!("{} {} failed", method, url)).into()
}

/// Append `query` to `url` as a query string, if it serializes to anything.
fn build_url<U, Query>(url: U, query: Query) -> Result<Url>
where
    U: IntoUrl,
    Query: Serialize,
{
    let mut url = url.into_url().context("could not parse URL")?;
    let query_str = serde_urlencoded::to_string(&query)?;
    if !query_str.is_empty() {
        url.set_query(Some(&query_str));
    }
    Ok(url)
}

/// The envelope around Google's error details.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: GCloudError,
}

/// The useful part of a Google Cloud error body.
#[derive(Debug, Deserialize)]
pub(crate) struct GCloudError {
    pub(crate) code: i32,
    pub(crate) message: String,
}

impl fmt::Display for GCloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Google Cloud error: {} {}", self.code, self.message)
    }
}

impl error::Error for GCloudError {}

/// Escape a bucket or object name for use inside a URL path.
pub(crate) fn percent_encode(s: &str) -> impl fmt::Display + '_ {
    utf8_percent_encode(s, NON_ALPHANUMERIC)
}

/// Does `resp` say that its body is `application/json`?
fn is_json_response(resp: &reqwest::Response) -> bool {
    let mime = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok());
    match mime {
        Some(mime) => mime.type_() == mime::APPLICATION && mime.subtype() == mime::JSON,
        None => {
            trace!("error response has a missing or unreadable content type");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_derive::Serialize;

    use super::*;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Query<'a> {
        prefix: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        page_token: Option<&'a str>,
    }

    #[test]
    fn query_is_appended_to_url() {
        let url = build_url(
            "https://storage.googleapis.com/storage/v1/b/bucket/o",
            Query {
                prefix: "raw/",
                page_token: None,
            },
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/bucket/o?prefix=raw%2F"
        );

        let url = build_url(
            "https://storage.googleapis.com/storage/v1/b/bucket/o",
            Query {
                prefix: "",
                page_token: Some("abc"),
            },
        )
        .unwrap();
        assert_eq!(url.query(), Some("prefix=&pageToken=abc"));
    }

    #[test]
    fn path_components_are_percent_encoded() {
        assert_eq!(
            percent_encode("nytaxi-485607_yellow.taxi").to_string(),
            "nytaxi%2D485607%5Fyellow%2Etaxi"
        );
    }

    #[test]
    fn error_responses_are_parsed() {
        let body = r#"{
            "error": {
                "code": 403,
                "message": "Permission denied",
                "errors": [{ "domain": "global", "reason": "forbidden", "message": "Permission denied" }]
            }
        }"#;
        let resp = serde_json::from_str::<ErrorResponse>(body).unwrap();
        assert_eq!(
            resp.error.to_string(),
            "Google Cloud error: 403 Permission denied"
        );
    }

    #[test]
    fn not_found_names_the_request() {
        let err = ClientError::NotFound {
            method: Method::GET,
            url: "https://storage.googleapis.com/storage/v1/b/missing/o"
                .parse()
                .unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "GET https://storage.googleapis.com/storage/v1/b/missing/o returned 404 Not Found"
        );
    }

    #[test]
    fn invalid_project_header_is_rejected() {
        assert!(Client::new(Some("bad\nproject")).is_err());
        assert!(Client::new(Some("nytaxi-485607")).is_ok());
    }
}
