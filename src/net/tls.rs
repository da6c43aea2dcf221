//! TLS certificate loading.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Certificate file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read certificate {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No PEM certificate found in {0:?}")]
    NoCertificate(PathBuf),
}

/// PEM-encoded CA certificates for the peer and the orderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub peer_pem: String,
    pub orderer_pem: String,
}

impl TlsMaterial {
    /// Read both certificate files.
    pub fn load(peer_path: &Path, orderer_path: &Path) -> Result<Self, TlsError> {
        let peer_pem = load_pem(peer_path)?;
        let orderer_pem = load_pem(orderer_path)?;

        tracing::debug!(
            peer = %peer_path.display(),
            orderer = %orderer_path.display(),
            "TLS certificates loaded"
        );

        Ok(Self {
            peer_pem,
            orderer_pem,
        })
    }
}

/// Read a PEM file, requiring at least one certificate block.
pub fn load_pem(path: &Path) -> Result<String, TlsError> {
    if !path.exists() {
        return Err(TlsError::NotFound(path.to_path_buf()));
    }

    let pem = fs::read_to_string(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(pem.as_bytes());
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificate(path.to_path_buf()));
    }

    Ok(pem)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIQ\n-----END CERTIFICATE-----\n";

    #[test]
    fn test_load_material() {
        let dir = tempfile::tempdir().unwrap();
        let peer = dir.path().join("peer.pem");
        let orderer = dir.path().join("orderer.pem");
        fs::write(&peer, PEM).unwrap();
        fs::write(&orderer, PEM).unwrap();

        let material = TlsMaterial::load(&peer, &orderer).unwrap();
        assert_eq!(material.peer_pem, PEM);
        assert_eq!(material.orderer_pem, PEM);
    }

    #[test]
    fn test_missing_file() {
        let err = load_pem(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, TlsError::NotFound(_)));
    }

    #[test]
    fn test_file_without_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pem");
        fs::write(&path, "not a certificate").unwrap();

        let err = load_pem(&path).unwrap_err();
        assert!(matches!(err, TlsError::NoCertificate(_)));
    }
}
