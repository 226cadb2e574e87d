//! Service facade
//!
//! [`CryptoService`] ties a provider to a handle registry and the resident
//! identity slots, and exposes every operation over handles or over the
//! resident contexts.

use hopcrypt_crypto::{Address, ContextKind, CryptoProvider};

use crate::{
    config::ServiceConfig,
    error::CoreError,
    handle::Handle,
    identity::{Established, ResidentIdentities, Role},
    onion::{self, Hop, Peeled},
    registry::ContextRegistry,
};

/// Handle-based cryptographic service over provider `P`.
pub struct CryptoService<P: CryptoProvider> {
    provider: P,
    registry: ContextRegistry<P::Context>,
    resident: ResidentIdentities<P::Context>,
    config: ServiceConfig,
}

impl<P: CryptoProvider> CryptoService<P> {
    /// Create a service with default limits.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ServiceConfig::default())
    }

    /// Create a service with explicit limits.
    pub fn with_config(provider: P, config: ServiceConfig) -> Self {
        Self {
            provider,
            registry: ContextRegistry::new(config.handle_limit),
            resident: ResidentIdentities::new(),
            config,
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The handle registry.
    pub fn registry(&self) -> &ContextRegistry<P::Context> {
        &self.registry
    }

    // Handle operations

    /// Build a context of `kind` and return its handle.
    pub fn create_context(
        &self,
        kind: ContextKind,
        key: &str,
        passphrase: &str,
    ) -> Result<Handle, CoreError> {
        self.registry.create(&self.provider, kind, key, passphrase)
    }

    /// Build an encryption context from public key text.
    pub fn create_encryption_context(&self, public_key: &str) -> Result<Handle, CoreError> {
        self.create_context(ContextKind::Encryption, public_key, "")
    }

    /// Build a decryption context from private key text.
    pub fn create_decryption_context(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Handle, CoreError> {
        self.create_context(ContextKind::Decryption, private_key, passphrase)
    }

    /// Build a signature context from private key text.
    pub fn create_signature_context(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Handle, CoreError> {
        self.create_context(ContextKind::Signature, private_key, passphrase)
    }

    /// Build a verification context from public key text.
    pub fn create_verification_context(&self, public_key: &str) -> Result<Handle, CoreError> {
        self.create_context(ContextKind::Verification, public_key, "")
    }

    /// Release the context under `handle`. False if it was not live.
    pub fn free_context(&self, handle: Handle) -> bool {
        self.registry.free(handle)
    }

    /// Encrypt with the context under `handle`.
    pub fn encrypt(&self, handle: Handle, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let context = self.registry.lookup(handle)?;
        self.provider.encrypt(&context, plaintext).map_err(CoreError::primitive("encrypt"))
    }

    /// Decrypt with the context under `handle`.
    pub fn decrypt(&self, handle: Handle, ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let context = self.registry.lookup(handle)?;
        self.provider.decrypt(&context, ciphertext).map_err(CoreError::primitive("decrypt"))
    }

    /// Sign with the context under `handle`.
    pub fn sign(&self, handle: Handle, data: &[u8]) -> Result<Vec<u8>, CoreError> {
        let context = self.registry.lookup(handle)?;
        self.provider.sign(&context, data).map_err(CoreError::primitive("sign"))
    }

    /// Verify a signed blob with the context under `handle`.
    pub fn verify(&self, handle: Handle, signed: &[u8]) -> Result<bool, CoreError> {
        let context = self.registry.lookup(handle)?;
        Ok(self.provider.verify(&context, signed))
    }

    /// Seal `plaintext` for parallel key and address lists, outermost first.
    pub fn seal_onion<K, A>(
        &self,
        plaintext: &[u8],
        keys: &[K],
        addresses: &[A],
    ) -> Result<Vec<u8>, CoreError>
    where
        K: AsRef<str>,
        A: AsRef<str>,
    {
        let hops = onion::hops_from_parts(keys, addresses)?;
        self.seal_hops(plaintext, &hops)
    }

    /// Seal `plaintext` for `hops`, outermost first.
    pub fn seal_hops(&self, plaintext: &[u8], hops: &[Hop<'_>]) -> Result<Vec<u8>, CoreError> {
        onion::seal(&self.provider, plaintext, hops, self.config.max_onion_size)
    }

    /// Peel one layer with the decryption context under `handle`.
    pub fn unseal_onion(&self, handle: Handle, onion: &[u8]) -> Result<Peeled, CoreError> {
        let context = self.registry.lookup(handle)?;
        onion::unseal(&self.provider, &context, onion)
    }

    // Key utilities

    /// Size of the key material behind public key text.
    pub fn public_key_size(&self, public_key: &str) -> Result<usize, CoreError> {
        self.provider.public_key_size(public_key).map_err(CoreError::primitive("public_key_size"))
    }

    /// Routing address of the identity behind public key text.
    pub fn address_of(&self, public_key: &str) -> Result<Address, CoreError> {
        self.provider.address_of(public_key).map_err(CoreError::primitive("address_of"))
    }

    // Transient helpers

    /// Encrypt once to `public_key` through a short-lived registry context.
    pub fn encrypt_for(&self, public_key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let handle = self.create_encryption_context(public_key)?;
        let result = self.encrypt(handle, plaintext);
        self.free_context(handle);
        result
    }

    /// Sign once with `private_key` through a short-lived registry context.
    pub fn sign_with(
        &self,
        private_key: &str,
        passphrase: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, CoreError> {
        let handle = self.create_signature_context(private_key, passphrase)?;
        let result = self.sign(handle, data);
        self.free_context(handle);
        result
    }

    /// Verify once against `public_key` through a short-lived registry context.
    pub fn verify_from(&self, public_key: &str, signed: &[u8]) -> Result<bool, CoreError> {
        let handle = self.create_verification_context(public_key)?;
        let result = self.verify(handle, signed);
        self.free_context(handle);
        result
    }

    // Resident identities

    /// Install the resident decryption identity unless one is present.
    pub fn init_decryption(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Established, CoreError> {
        self.resident.establish(Role::Decryption, || {
            self.provider.create_decryption_context(private_key, passphrase)
        })
    }

    /// Install the resident signature identity unless one is present.
    pub fn init_signature(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Established, CoreError> {
        self.resident.establish(Role::Signature, || {
            self.provider.create_signature_context(private_key, passphrase)
        })
    }

    /// Drop the resident decryption identity. False if none was present.
    pub fn reset_decryption(&self) -> bool {
        self.resident.reset(Role::Decryption)
    }

    /// Drop the resident signature identity. False if none was present.
    pub fn reset_signature(&self) -> bool {
        self.resident.reset(Role::Signature)
    }

    /// Returns true if `role` has a resident context.
    pub fn is_initialized(&self, role: Role) -> bool {
        self.resident.is_established(role)
    }

    /// Decrypt with the resident decryption identity.
    pub fn decrypt_resident(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let context = self.resident.get(Role::Decryption)?;
        self.provider.decrypt(&context, ciphertext).map_err(CoreError::primitive("decrypt"))
    }

    /// Sign with the resident signature identity.
    pub fn sign_resident(&self, data: &[u8]) -> Result<Vec<u8>, CoreError> {
        let context = self.resident.get(Role::Signature)?;
        self.provider.sign(&context, data).map_err(CoreError::primitive("sign"))
    }

    /// Peel one layer with the resident decryption identity.
    pub fn unseal_resident(&self, onion: &[u8]) -> Result<Peeled, CoreError> {
        let context = self.resident.get(Role::Decryption)?;
        onion::unseal(&self.provider, &context, onion)
    }
}
