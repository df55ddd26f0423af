//! Network and filesystem defaults for the LBC client.

/// Default CometBFT RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://localhost:26657";

/// Default directory holding the ed25519 key files.
pub const DEFAULT_KEY_DIR: &str = "./config";

/// File name of the private key (64 bytes: seed followed by public key).
pub const PRIVATE_KEY_FILE: &str = "ed25519.key";

/// File name of the public key (32 bytes).
pub const PUBLIC_KEY_FILE: &str = "ed25519.pub";
