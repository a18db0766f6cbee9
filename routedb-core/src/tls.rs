//! TLS trust material.
//!
//! A configured CA bundle is read fully into memory once, parsed as a PEM
//! certificate collection and only then handed to the driver. Any failure
//! yields an error and no TLS options at all.

use crate::config::SessionConfig;
use crate::error::RouteDbError;
use crate::Result;
use mongodb::options::{Tls, TlsOptions};
use std::path::{Path, PathBuf};

/// A parsed, non-empty PEM bundle of certificate authorities.
///
/// Only the path and certificate count are kept. The driver takes the CA
/// bundle as a path and reads it again when it builds its root store, so the
/// file must not change between [`CaBundle::load`] and connecting.
#[derive(Debug, Clone)]
pub struct CaBundle {
    path: PathBuf,
    certificate_count: usize,
}

impl CaBundle {
    /// Reads and parses the bundle at `path`.
    ///
    /// # Errors
    /// Returns a configuration error if the file cannot be read, is not valid
    /// PEM, or holds no certificates
    pub fn load(path: &Path) -> Result<Self> {
        let pem = std::fs::read(path).map_err(|e| {
            RouteDbError::configuration(format!(
                "Failed to read CA bundle {}: {}",
                path.display(),
                e
            ))
        })?;

        let certificate_count = Self::count_certificates(&pem).map_err(|e| {
            RouteDbError::configuration(format!(
                "Failed to parse CA bundle {}: {}",
                path.display(),
                e
            ))
        })?;

        if certificate_count == 0 {
            return Err(RouteDbError::configuration(format!(
                "Failed parsing pem file {}: no certificates found",
                path.display()
            )));
        }

        tracing::debug!(
            "Loaded {} CA certificate(s) from {}",
            certificate_count,
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            certificate_count,
        })
    }

    fn count_certificates(mut pem: &[u8]) -> std::io::Result<usize> {
        rustls_pemfile::certs(&mut pem).try_fold(0usize, |count, cert| {
            cert.map(|_| count.saturating_add(1))
        })
    }

    /// Path the bundle was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of certificates in the bundle.
    pub fn certificate_count(&self) -> usize {
        self.certificate_count
    }
}

/// Builds the driver TLS setting for a session.
///
/// Returns [`Tls::Disabled`] when TLS is off. Otherwise the CA bundle, if
/// any, must load cleanly before any options are produced.
///
/// # Errors
/// Returns a configuration error when the CA bundle is unusable
pub fn client_tls(config: &SessionConfig) -> Result<Tls> {
    if !config.tls_enabled {
        if config.ca_file_path.is_some() {
            tracing::warn!("CA bundle configured but TLS is disabled; ignoring it");
        }
        return Ok(Tls::Disabled);
    }

    let bundle = config
        .ca_file_path
        .as_deref()
        .map(CaBundle::load)
        .transpose()?;

    if config.tls_insecure {
        tracing::warn!(
            "TLS certificate and hostname validation disabled for {}",
            config.endpoint
        );
    }

    let options = TlsOptions::builder()
        .allow_invalid_certificates(config.tls_insecure)
        .ca_file_path(bundle.map(|b| b.path))
        .build();

    Ok(Tls::Enabled(options))
}
