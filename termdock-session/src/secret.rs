//! Per-user credential protection
//!
//! Passwords rest on disk as opaque blobs produced by the OS per-user
//! protection primitive (DPAPI). The contract is deliberately forgiving:
//! [`reveal`] returns an empty string on any failure (a missing prefix, a
//! corrupt blob, a blob protected by another user account) and never an
//! error, so a broken credential degrades to "no password" instead of
//! blocking session load.
//!
//! On non-Windows builds (CI, tests) protection degrades to a marked plain
//! encoding so the store logic stays exercisable everywhere; the scheme
//! prefix keeps the two formats unambiguous.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

const SCHEME_DPAPI: &str = "dpapi:";
const SCHEME_PLAIN: &str = "plain:";

/// Protect a plaintext credential for at-rest storage.
///
/// Empty input produces an empty blob, so "no password" round-trips
/// without touching the protection primitive.
pub fn protect(plaintext: &str) -> String {
    if plaintext.is_empty() {
        return String::new();
    }
    protect_impl(plaintext)
}

/// Recover a plaintext credential from an at-rest blob.
///
/// Returns an empty string on any failure.
pub fn reveal(blob: &str) -> String {
    if blob.is_empty() {
        return String::new();
    }

    if let Some(encoded) = blob.strip_prefix(SCHEME_DPAPI) {
        return reveal_dpapi(encoded);
    }

    if let Some(encoded) = blob.strip_prefix(SCHEME_PLAIN) {
        return BASE64
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default();
    }

    String::new()
}

#[cfg(windows)]
fn protect_impl(plaintext: &str) -> String {
    match dpapi::protect(plaintext.as_bytes()) {
        Some(blob) => format!("{}{}", SCHEME_DPAPI, BASE64.encode(blob)),
        None => {
            tracing::warn!("DPAPI protection failed; credential will not be persisted");
            String::new()
        }
    }
}

#[cfg(not(windows))]
fn protect_impl(plaintext: &str) -> String {
    format!("{}{}", SCHEME_PLAIN, BASE64.encode(plaintext.as_bytes()))
}

#[cfg(windows)]
fn reveal_dpapi(encoded: &str) -> String {
    BASE64
        .decode(encoded)
        .ok()
        .and_then(|bytes| dpapi::unprotect(&bytes))
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

#[cfg(not(windows))]
fn reveal_dpapi(_encoded: &str) -> String {
    // a DPAPI blob cannot be opened off its origin machine/user
    String::new()
}

#[cfg(windows)]
mod dpapi {
    //! Thin DPAPI wrappers: bytes in, bytes out, `None` on failure.

    use windows::Win32::Foundation::{LocalFree, HLOCAL};
    use windows::Win32::Security::Cryptography::{
        CryptProtectData, CryptUnprotectData, CRYPT_INTEGER_BLOB,
    };

    fn take_blob(blob: CRYPT_INTEGER_BLOB) -> Vec<u8> {
        // SAFETY: on success DPAPI hands back a LocalAlloc'd buffer of
        // cbData bytes; copy it out and free the allocation.
        unsafe {
            let out = std::slice::from_raw_parts(blob.pbData, blob.cbData as usize).to_vec();
            let _ = LocalFree(HLOCAL(blob.pbData as *mut core::ffi::c_void));
            out
        }
    }

    pub fn protect(data: &[u8]) -> Option<Vec<u8>> {
        let input = CRYPT_INTEGER_BLOB {
            cbData: data.len() as u32,
            pbData: data.as_ptr() as *mut u8,
        };
        let mut output = CRYPT_INTEGER_BLOB::default();
        // SAFETY: input points at `data`, which outlives the call.
        unsafe {
            CryptProtectData(&input, None, None, None, None, 0, &mut output).ok()?;
        }
        Some(take_blob(output))
    }

    pub fn unprotect(data: &[u8]) -> Option<Vec<u8>> {
        let input = CRYPT_INTEGER_BLOB {
            cbData: data.len() as u32,
            pbData: data.as_ptr() as *mut u8,
        };
        let mut output = CRYPT_INTEGER_BLOB::default();
        // SAFETY: input points at `data`, which outlives the call.
        unsafe {
            CryptUnprotectData(&input, None, None, None, None, 0, &mut output).ok()?;
        }
        Some(take_blob(output))
    }
}
