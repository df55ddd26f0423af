//! Key management for the transaction signer.
//!
//! A [`KeyStore`] owns the load-or-generate lifecycle of a single ed25519
//! keypair kept in a key directory:
//!
//! ```text
//! <key_dir>/ed25519.key   64 bytes (seed ‖ public key), mode 0600
//! <key_dir>/ed25519.pub   32 bytes
//! ```
//!
//! The private key file uses the common 64-byte ed25519 layout, so key
//! directories written by other ledger tools load unchanged. The identity
//! id registered on the ledger is derived from the public key alone, see
//! [`identity_id`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{
    Signature, Signer, SigningKey, VerifyingKey, KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::network::{DEFAULT_KEY_DIR, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};

/// Prefix of every identity id.
pub const IDENTITY_ID_PREFIX: &str = "commiter";

/// Key storage errors.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Filesystem failure while reading or writing key material
    #[error("I/O error at {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key file has the wrong size
    #[error("Invalid key length in {}: expected {}, got {}", .path.display(), .expected, .actual)]
    InvalidLength {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// Private key bytes do not form a valid ed25519 key
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Public key file does not belong to the private key
    #[error("Public key in {} does not match the private key", .0.display())]
    Mismatch(PathBuf),
}

impl KeyError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Derive the ledger identity id from a public key.
///
/// `commiter:<base64(pubkey)>`. Pure function of the key bytes.
pub fn identity_id(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> String {
    format!("{}:{}", IDENTITY_ID_PREFIX, BASE64.encode(public_key))
}

/// An ed25519 signing keypair.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair from a 32-byte seed (deterministic).
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key, standard base64.
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.public_key_bytes())
    }

    /// Ledger identity id for this key.
    pub fn identity_id(&self) -> String {
        identity_id(&self.public_key_bytes())
    }

    /// Public half, for signature verification.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Private key in the on-disk layout (seed ‖ public key).
    fn to_keypair_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("identity_id", &self.identity_id())
            .finish_non_exhaustive()
    }
}

/// File-backed key storage rooted at a key directory.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_DIR)
    }
}

impl KeyStore {
    /// Create a key store rooted at `dir`. Nothing touches the disk until
    /// [`KeyStore::ensure_keypair`] is called.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The key directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `ed25519.key`.
    pub fn private_key_path(&self) -> PathBuf {
        self.dir.join(PRIVATE_KEY_FILE)
    }

    /// Path of `ed25519.pub`.
    pub fn public_key_path(&self) -> PathBuf {
        self.dir.join(PUBLIC_KEY_FILE)
    }

    /// Load the persisted keypair, generating and persisting one on first use.
    ///
    /// A freshly generated key is only returned once both halves are on disk.
    pub fn ensure_keypair(&self) -> Result<Keypair, KeyError> {
        let private_path = self.private_key_path();
        match fs::metadata(&private_path) {
            Ok(_) => self.load(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let keypair = Keypair::generate();
                self.persist(&keypair)?;
                tracing::info!(
                    key_dir = %self.dir.display(),
                    identity_id = %keypair.identity_id(),
                    "Generated new ed25519 keypair"
                );
                Ok(keypair)
            }
            Err(e) => Err(KeyError::io(&private_path, e)),
        }
    }

    /// Load an existing keypair.
    pub fn load(&self) -> Result<Keypair, KeyError> {
        let private_path = self.private_key_path();
        let public_path = self.public_key_path();

        let private = fs::read(&private_path).map_err(|e| KeyError::io(&private_path, e))?;
        let keypair = match private.len() {
            KEYPAIR_LENGTH => {
                let mut bytes = [0u8; KEYPAIR_LENGTH];
                bytes.copy_from_slice(&private);
                let signing_key = SigningKey::from_keypair_bytes(&bytes)
                    .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
                Keypair { signing_key }
            }
            // Bare seed
            SECRET_KEY_LENGTH => {
                let mut seed = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(&private);
                Keypair::from_seed(&seed)
            }
            actual => {
                return Err(KeyError::InvalidLength {
                    path: private_path,
                    expected: KEYPAIR_LENGTH,
                    actual,
                })
            }
        };

        let public = fs::read(&public_path).map_err(|e| KeyError::io(&public_path, e))?;
        if public.len() != PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                path: public_path,
                expected: PUBLIC_KEY_LENGTH,
                actual: public.len(),
            });
        }
        if public.as_slice() != keypair.public_key_bytes().as_slice() {
            return Err(KeyError::Mismatch(public_path));
        }

        tracing::debug!(key_dir = %self.dir.display(), "Loaded ed25519 keypair");
        Ok(keypair)
    }

    /// Write both halves. On failure no private key is left behind.
    fn persist(&self, keypair: &Keypair) -> Result<(), KeyError> {
        create_key_dir(&self.dir)?;
        let private_path = self.private_key_path();
        write_file(&private_path, &keypair.to_keypair_bytes(), 0o600)?;
        if let Err(e) = write_file(&self.public_key_path(), &keypair.public_key_bytes(), 0o644) {
            let _ = fs::remove_file(&private_path);
            return Err(e);
        }
        Ok(())
    }
}

fn create_key_dir(dir: &Path) -> Result<(), KeyError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| KeyError::io(dir, e))
}

/// Write to a temp file, then rename into place.
fn write_file(path: &Path, bytes: &[u8], mode: u32) -> Result<(), KeyError> {
    let temp_path = path.with_extension("tmp");

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(&temp_path)
        .map_err(|e| KeyError::io(&temp_path, e))?;
    if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&temp_path);
        return Err(KeyError::io(&temp_path, e));
    }
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| KeyError::io(path, e))
}
