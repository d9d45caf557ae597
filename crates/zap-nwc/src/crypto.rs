//! Signing and encryption collaborator

use async_trait::async_trait;
use nostr::{Event, PublicKey, UnsignedEvent};

use crate::error::Error;

/// Keys of the wallet connection
///
/// Implementations hold the connection secret from the NWC URI and use it to
/// sign requests and to encrypt and decrypt the content exchanged with the
/// wallet.
#[async_trait]
pub trait WalletCrypto: Send + Sync {
    /// Public key of the connection secret
    fn public_key(&self) -> PublicKey;

    /// Sign an event with the connection secret
    ///
    /// The id of the returned event is the correlation key for the wallet's
    /// answer.
    async fn sign(&self, unsigned: UnsignedEvent) -> Result<Event, Error>;

    /// Encrypt `plaintext` for `peer`
    async fn encrypt(&self, peer: &PublicKey, plaintext: &str) -> Result<String, Error>;

    /// Decrypt `ciphertext` from `peer`
    async fn decrypt(&self, peer: &PublicKey, ciphertext: &str) -> Result<String, Error>;
}
