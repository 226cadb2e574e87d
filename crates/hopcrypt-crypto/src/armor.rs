//! PEM-style text armor for key material.
//!
//! ```text
//! -----BEGIN HOPCRYPT PUBLIC KEY-----
//! <base64, wrapped at 64 columns>
//! -----END HOPCRYPT PUBLIC KEY-----
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::ProviderError;

/// Label of armored public keys.
pub(crate) const PUBLIC_KEY_LABEL: &str = "HOPCRYPT PUBLIC KEY";

/// Label of armored private keys without passphrase protection.
pub(crate) const PRIVATE_KEY_LABEL: &str = "HOPCRYPT PRIVATE KEY";

/// Label of armored, passphrase-protected private keys.
pub(crate) const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "HOPCRYPT ENCRYPTED PRIVATE KEY";

const LINE_WIDTH: usize = 64;

/// Armor `bytes` under `label`.
pub(crate) fn encode(label: &str, bytes: &[u8]) -> String {
    let body = STANDARD.encode(bytes);
    let mut out = format!("-----BEGIN {label}-----\n");
    for start in (0..body.len()).step_by(LINE_WIDTH) {
        out.push_str(&body[start..body.len().min(start + LINE_WIDTH)]);
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out
}

/// Label of an armored block, if the text looks like one.
pub(crate) fn label(text: &str) -> Option<&str> {
    let first = text.trim().lines().next()?.trim();
    first.strip_prefix("-----BEGIN ")?.strip_suffix("-----")
}

/// Decode an armored block, requiring the given label.
pub(crate) fn decode(expected_label: &str, text: &str) -> Result<Vec<u8>, ProviderError> {
    let found = label(text).ok_or_else(|| ProviderError::invalid_key("missing armor header"))?;
    if found != expected_label {
        return Err(ProviderError::invalid_key(format!(
            "expected {expected_label}, found {found}"
        )));
    }

    let mut lines = text.trim().lines().map(str::trim);
    // header checked above
    lines.next();

    let footer = format!("-----END {expected_label}-----");
    let mut body = String::new();
    let mut closed = false;
    for line in lines {
        if line == footer {
            closed = true;
            break;
        }
        body.push_str(line);
    }
    if !closed {
        return Err(ProviderError::invalid_key("missing armor footer"));
    }

    STANDARD.decode(body.as_bytes()).map_err(|e| ProviderError::invalid_key(e.to_string()))
}
