//! Process-wide `rustls` setup.

use rustls::{ClientConfig, RootCertStore};
use rustls_native_certs::load_native_certs;

use crate::common::*;

/// Install `aws-lc-rs` as the process-wide `rustls` crypto provider.
///
/// `reqwest` and `gcp_auth` are built without a provider of their own, so this
/// must run before the first HTTPS request. Calling it twice is harmless.
pub fn install_crypto_provider() {
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        trace!("rustls crypto provider was already installed");
    }
}

/// A `ClientConfig` trusting the platform's native root certificates.
///
/// Used for PostgreSQL connections. Individual certificates that fail to load
/// are logged and skipped. An empty store is allowed, so that servers which
/// don't offer TLS can still be reached.
pub fn rustls_client_config() -> Result<ClientConfig> {
    install_crypto_provider();
    let mut root_store = RootCertStore::empty();
    let cert_result = load_native_certs();
    for err in &cert_result.errors {
        warn!("could not load a native certificate: {}", err);
    }
    let (added, ignored) = root_store.add_parsable_certificates(cert_result.certs);
    debug!("loaded {} native root certificates ({} ignored)", added, ignored);
    if root_store.is_empty() {
        warn!("no native root certificates found, so TLS connections will fail");
    }

    Ok(ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth())
}
