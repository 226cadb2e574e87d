//! `hopcrypt` subcommands
//!
//! Every command runs against a fresh [`CryptoService`]; contexts it creates
//! are freed before it returns. Binary outputs that are passed between nodes
//! (onions, ciphertexts, signed blobs) are written as base64 text. Plaintexts
//! are read and written as raw bytes.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use clap::Subcommand;
use hopcrypt_core::{CryptoService, Peeled};
use hopcrypt_crypto::{KdfParams, KeyPair, StandardProvider};
use tracing::{debug, info};

use crate::error::CliError;

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an identity, writing `<out>.pub` and `<out>.key`
    Keygen {
        /// Output path prefix
        #[arg(long)]
        out: PathBuf,

        /// Protect the private key with this passphrase
        #[arg(long, env = "HOPCRYPT_PASSPHRASE", default_value = "")]
        passphrase: String,

        /// Use minimal key derivation cost (testing only)
        #[arg(long, hide = true)]
        insecure_fast_kdf: bool,
    },

    /// Print the routing address of a public key
    Address {
        /// Public key file
        public_key: PathBuf,
    },

    /// Print the key material size of a public key
    KeySize {
        /// Public key file
        public_key: PathBuf,
    },

    /// Seal a plaintext into an onion, outermost hop first
    Seal {
        /// Hop as `<public-key-file>[@<address>]`; repeat per hop
        #[arg(long = "hop", required = true)]
        hops: Vec<HopSpec>,

        /// Plaintext file
        #[arg(long)]
        input: PathBuf,

        /// Onion output file (base64)
        #[arg(long)]
        out: PathBuf,
    },

    /// Peel one onion layer
    Peel {
        /// Private key file
        #[arg(long)]
        key: PathBuf,

        /// Private key passphrase
        #[arg(long, env = "HOPCRYPT_PASSPHRASE", default_value = "")]
        passphrase: String,

        /// Onion file (base64)
        #[arg(long)]
        input: PathBuf,

        /// Remaining onion (base64) or delivered plaintext
        #[arg(long)]
        out: PathBuf,
    },

    /// Encrypt a file to a public key
    Encrypt {
        /// Recipient public key file
        #[arg(long)]
        to: PathBuf,

        /// Plaintext file
        #[arg(long)]
        input: PathBuf,

        /// Ciphertext output file (base64)
        #[arg(long)]
        out: PathBuf,
    },

    /// Decrypt a file with a private key
    Decrypt {
        /// Private key file
        #[arg(long)]
        key: PathBuf,

        /// Private key passphrase
        #[arg(long, env = "HOPCRYPT_PASSPHRASE", default_value = "")]
        passphrase: String,

        /// Ciphertext file (base64)
        #[arg(long)]
        input: PathBuf,

        /// Plaintext output file
        #[arg(long)]
        out: PathBuf,
    },

    /// Sign a file
    Sign {
        /// Private key file
        #[arg(long)]
        key: PathBuf,

        /// Private key passphrase
        #[arg(long, env = "HOPCRYPT_PASSPHRASE", default_value = "")]
        passphrase: String,

        /// Message file
        #[arg(long)]
        input: PathBuf,

        /// Signed blob output file (base64)
        #[arg(long)]
        out: PathBuf,
    },

    /// Verify a signed blob against a public key
    Verify {
        /// Signer public key file
        #[arg(long)]
        from: PathBuf,

        /// Signed blob file (base64)
        #[arg(long)]
        input: PathBuf,
    },
}

/// One `--hop` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopSpec {
    /// File holding the hop's public key.
    pub public_key: PathBuf,
    /// Explicit hex address; derived from the key when absent.
    pub address: Option<String>,
}

impl FromStr for HopSpec {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, address) = match s.rsplit_once('@') {
            Some((path, address)) => (path, Some(address.to_owned())),
            None => (s, None),
        };
        if path.is_empty() {
            return Err(CliError::InvalidHop {
                spec: s.to_owned(),
                reason: "missing public key file".into(),
            });
        }
        if address.as_deref() == Some("") {
            return Err(CliError::InvalidHop { spec: s.to_owned(), reason: "empty address".into() });
        }
        Ok(Self { public_key: PathBuf::from(path), address })
    }
}

/// Run `command`, returning the line to report on success.
pub fn run(command: Command) -> Result<String, CliError> {
    let service = CryptoService::new(StandardProvider::new());

    match command {
        Command::Keygen { out, passphrase, insecure_fast_kdf } => {
            let params =
                if insecure_fast_kdf { KdfParams::insecure_fast() } else { KdfParams::default() };
            keygen(&out, &passphrase, &params)
        },
        Command::Address { public_key } => {
            let key = read_text(&public_key)?;
            Ok(service.address_of(&key)?.to_hex())
        },
        Command::KeySize { public_key } => {
            let key = read_text(&public_key)?;
            Ok(service.public_key_size(&key)?.to_string())
        },
        Command::Seal { hops, input, out } => seal(&service, &hops, &input, &out),
        Command::Peel { key, passphrase, input, out } => {
            peel(&service, &key, &passphrase, &input, &out)
        },
        Command::Encrypt { to, input, out } => {
            let key = read_text(&to)?;
            let ciphertext = service.encrypt_for(&key, &read_bytes(&input)?)?;
            write_base64(&out, &ciphertext)?;
            Ok(format!("encrypted {} bytes", ciphertext.len()))
        },
        Command::Decrypt { key, passphrase, input, out } => {
            let key = read_text(&key)?;
            let ciphertext = read_base64(&input)?;
            let handle = service.create_decryption_context(&key, &passphrase)?;
            let plaintext = service.decrypt(handle, &ciphertext);
            service.free_context(handle);

            let plaintext = plaintext?;
            write_bytes(&out, &plaintext)?;
            Ok(format!("decrypted {} bytes", plaintext.len()))
        },
        Command::Sign { key, passphrase, input, out } => {
            let key = read_text(&key)?;
            let message = read_bytes(&input)?;
            let handle = service.create_signature_context(&key, &passphrase)?;
            let signed = service.sign(handle, &message);
            service.free_context(handle);

            write_base64(&out, &signed?)?;
            Ok(format!("signed {} bytes", message.len()))
        },
        Command::Verify { from, input } => {
            let key = read_text(&from)?;
            if service.verify_from(&key, &read_base64(&input)?)? {
                Ok("valid".to_owned())
            } else {
                Err(CliError::InvalidSignature)
            }
        },
    }
}

fn keygen(out: &Path, passphrase: &str, params: &KdfParams) -> Result<String, CliError> {
    let pair = KeyPair::generate()?;
    let private_key = if passphrase.is_empty() {
        pair.private_key_armored()
    } else {
        pair.encrypted_private_key_armored(passphrase, params)?
    };

    let public_path = suffixed(out, ".pub");
    let private_path = suffixed(out, ".key");
    write_bytes(&public_path, pair.public_key_armored().as_bytes())?;
    write_bytes(&private_path, private_key.as_bytes())?;

    info!(address = %pair.address(), protected = !passphrase.is_empty(), "identity generated");
    Ok(pair.address().to_hex())
}

fn seal(
    service: &CryptoService<StandardProvider>,
    hops: &[HopSpec],
    input: &Path,
    out: &Path,
) -> Result<String, CliError> {
    let mut keys = Vec::with_capacity(hops.len());
    let mut addresses = Vec::with_capacity(hops.len());
    for hop in hops {
        let key = read_text(&hop.public_key)?;
        let address = match &hop.address {
            Some(address) => address.clone(),
            None => service.address_of(&key)?.to_hex(),
        };
        keys.push(key);
        addresses.push(address);
    }

    let onion = service.seal_onion(&read_bytes(input)?, &keys, &addresses)?;
    write_base64(out, &onion)?;

    info!(hops = hops.len(), size = onion.len(), "onion sealed");
    // First entry exists: seal_onion rejects an empty hop list.
    let entry = addresses.first().cloned().unwrap_or_default();
    Ok(format!("send to {entry}"))
}

fn peel(
    service: &CryptoService<StandardProvider>,
    key: &Path,
    passphrase: &str,
    input: &Path,
    out: &Path,
) -> Result<String, CliError> {
    let key = read_text(key)?;
    let onion = read_base64(input)?;

    let handle = service.create_decryption_context(&key, passphrase)?;
    let peeled = service.unseal_onion(handle, &onion);
    service.free_context(handle);

    match peeled? {
        Peeled::Forward { next_address, onion } => {
            write_base64(out, &onion)?;
            Ok(format!("forward to {next_address}"))
        },
        Peeled::Delivered { plaintext } => {
            write_bytes(out, &plaintext)?;
            Ok(format!("delivered {} bytes", plaintext.len()))
        },
    }
}

// `out` plus `suffix`, keeping any extension already on `out`.
fn suffixed(out: &Path, suffix: &str) -> PathBuf {
    let mut name = out.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    debug!(path = %path.display(), "reading");
    fs::read(path).map_err(CliError::io(path))
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(CliError::io(path))
}

fn read_base64(path: &Path) -> Result<Vec<u8>, CliError> {
    let text = read_text(path)?;
    BASE64
        .decode(text.trim())
        .map_err(|source| CliError::Encoding { path: path.to_path_buf(), source })
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    debug!(path = %path.display(), size = bytes.len(), "writing");
    fs::write(path, bytes).map_err(CliError::io(path))
}

fn write_base64(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    let mut text = BASE64.encode(bytes);
    text.push('\n');
    write_bytes(path, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn keygen_in(dir: &TempDir, name: &str, passphrase: &str) -> (PathBuf, String) {
        let prefix = dir.path().join(name);
        let address = run(Command::Keygen {
            out: prefix.clone(),
            passphrase: passphrase.to_owned(),
            insecure_fast_kdf: true,
        })
        .unwrap();
        (prefix, address)
    }

    #[test]
    fn hop_spec_parsing() {
        let hop: HopSpec = "relay.pub".parse().unwrap();
        assert_eq!(hop, HopSpec { public_key: "relay.pub".into(), address: None });

        let hop: HopSpec = "dir@x/relay.pub@abcd".parse().unwrap();
        assert_eq!(hop.public_key, PathBuf::from("dir@x/relay.pub"));
        assert_eq!(hop.address.as_deref(), Some("abcd"));

        assert!("@abcd".parse::<HopSpec>().is_err());
        assert!("relay.pub@".parse::<HopSpec>().is_err());
    }

    #[test]
    fn keygen_writes_both_halves() {
        let dir = TempDir::new().unwrap();
        let (prefix, address) = keygen_in(&dir, "alice", "");

        assert_eq!(address.len(), 64);
        let shown = run(Command::Address { public_key: suffixed(&prefix, ".pub") }).unwrap();
        assert_eq!(shown, address);

        let size = run(Command::KeySize { public_key: suffixed(&prefix, ".pub") }).unwrap();
        assert_eq!(size, "64");
    }

    #[test]
    fn keygen_keeps_dotted_prefix() {
        let dir = TempDir::new().unwrap();
        let (prefix, address) = keygen_in(&dir, "node.v1", "");

        assert!(dir.path().join("node.v1.pub").is_file());
        assert!(dir.path().join("node.v1.key").is_file());
        assert!(!dir.path().join("node.pub").exists());
        let shown = run(Command::Address { public_key: suffixed(&prefix, ".pub") }).unwrap();
        assert_eq!(shown, address);
    }

    #[test]
    fn seal_and_peel_two_hops() {
        let dir = TempDir::new().unwrap();
        let (relay, relay_address) = keygen_in(&dir, "relay", "");
        let (exit, exit_address) = keygen_in(&dir, "exit", "pw");

        let plaintext = dir.path().join("message.txt");
        fs::write(&plaintext, b"hello exit").unwrap();
        let onion = dir.path().join("onion.b64");

        let report = run(Command::Seal {
            hops: vec![
                HopSpec { public_key: suffixed(&relay, ".pub"), address: None },
                HopSpec { public_key: suffixed(&exit, ".pub"), address: Some(exit_address.clone()) },
            ],
            input: plaintext,
            out: onion.clone(),
        })
        .unwrap();
        assert_eq!(report, format!("send to {relay_address}"));

        let forwarded = dir.path().join("forwarded.b64");
        let report = run(Command::Peel {
            key: suffixed(&relay, ".key"),
            passphrase: String::new(),
            input: onion,
            out: forwarded.clone(),
        })
        .unwrap();
        assert_eq!(report, format!("forward to {exit_address}"));

        let delivered = dir.path().join("delivered.txt");
        let report = run(Command::Peel {
            key: suffixed(&exit, ".key"),
            passphrase: "pw".to_owned(),
            input: forwarded,
            out: delivered.clone(),
        })
        .unwrap();
        assert_eq!(report, "delivered 10 bytes");
        assert_eq!(fs::read(delivered).unwrap(), b"hello exit");
    }

    #[test]
    fn encrypt_decrypt_and_sign_verify() {
        let dir = TempDir::new().unwrap();
        let (alice, _) = keygen_in(&dir, "alice", "");
        let message = dir.path().join("msg");
        fs::write(&message, b"attack at dawn").unwrap();

        let sealed = dir.path().join("msg.enc");
        run(Command::Encrypt { to: suffixed(&alice, ".pub"), input: message.clone(), out: sealed.clone() })
            .unwrap();
        let opened = dir.path().join("msg.dec");
        run(Command::Decrypt {
            key: suffixed(&alice, ".key"),
            passphrase: String::new(),
            input: sealed,
            out: opened.clone(),
        })
        .unwrap();
        assert_eq!(fs::read(opened).unwrap(), b"attack at dawn");

        let signed = dir.path().join("msg.sig");
        run(Command::Sign {
            key: suffixed(&alice, ".key"),
            passphrase: String::new(),
            input: message,
            out: signed.clone(),
        })
        .unwrap();
        let verdict = run(Command::Verify { from: suffixed(&alice, ".pub"), input: signed.clone() });
        assert_eq!(verdict.unwrap(), "valid");

        let (mallory, _) = keygen_in(&dir, "mallory", "");
        let verdict = run(Command::Verify { from: suffixed(&mallory, ".pub"), input: signed });
        assert!(matches!(verdict, Err(CliError::InvalidSignature)));
    }

    #[test]
    fn wrong_passphrase_is_reported() {
        let dir = TempDir::new().unwrap();
        let (bob, _) = keygen_in(&dir, "bob", "secret");
        let input = dir.path().join("in");
        fs::write(&input, "AAAA\n").unwrap();

        let result = run(Command::Decrypt {
            key: suffixed(&bob, ".key"),
            passphrase: "guess".to_owned(),
            input,
            out: dir.path().join("out"),
        });
        assert!(matches!(result, Err(CliError::Core(_))));
    }

    #[test]
    fn missing_file_names_path() {
        let err = run(Command::Address { public_key: "/nonexistent/key.pub".into() }).unwrap_err();
        assert!(err.to_string().starts_with("/nonexistent/key.pub"));
    }
}
