//! Authentication support for Google Cloud.

use std::sync::Arc;

use gcp_auth::{Token, TokenProvider};

use crate::common::*;

/// Something which can hand out OAuth2 tokens.
pub(crate) type Authenticator = Arc<dyn TokenProvider>;

/// A cached OAuth2 access token.
pub(crate) type AccessToken = Arc<Token>;

/// Find Google Cloud credentials.
///
/// This uses the usual search order: `GOOGLE_APPLICATION_CREDENTIALS`, then
/// the `gcloud` user's application default credentials, then the metadata
/// server when running on Google Cloud.
#[instrument(level = "trace")]
pub(crate) async fn authenticator() -> Result<Authenticator> {
    gcp_auth::provider()
        .await
        .context("could not find Google Cloud credentials")
}
