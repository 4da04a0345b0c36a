//! Compact JWS decoding.
//!
//! Structural only: splits `header.payload.signature`, decodes the
//! base64url segments and the JSON header and claims. Signatures are
//! checked later by the verifiers against the retained signing input.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::jose::b64url_decode;

/// The protected header of a signed statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// A decoded compact JWS with typed claims.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub header: JwsHeader,
    pub claims: T,
    /// Length of the `header.payload` prefix of the token.
    pub signing_input_len: usize,
    pub signature: Vec<u8>,
}

/// Decode a compact JWS into header and claims of type `T`.
///
/// The error string describes the first structural defect found.
pub fn decode<T: DeserializeOwned>(token: &str) -> std::result::Result<Decoded<T>, String> {
    let token = token.trim();
    let mut parts = token.split('.');
    let (h_b64, p_b64, s_b64) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s)) => (h, p, s),
        _ => return Err("expected three dot-separated segments".into()),
    };
    if parts.next().is_some() {
        return Err("expected three dot-separated segments".into());
    }
    if h_b64.is_empty() || p_b64.is_empty() {
        return Err("empty header or payload segment".into());
    }
    if s_b64.is_empty() {
        return Err("missing signature".into());
    }

    let header_bytes = b64url_decode(h_b64).map_err(|e| format!("header: invalid base64url: {e}"))?;
    let payload_bytes =
        b64url_decode(p_b64).map_err(|e| format!("payload: invalid base64url: {e}"))?;
    let signature = b64url_decode(s_b64).map_err(|e| format!("signature: invalid base64url: {e}"))?;

    let header: JwsHeader =
        serde_json::from_slice(&header_bytes).map_err(|e| format!("header: {e}"))?;
    if header.alg.is_empty() || header.alg.eq_ignore_ascii_case("none") {
        return Err(format!("unsigned or empty alg: {:?}", header.alg));
    }
    let claims: T = serde_json::from_slice(&payload_bytes).map_err(|e| format!("claims: {e}"))?;

    Ok(Decoded {
        header,
        claims,
        signing_input_len: h_b64.len() + 1 + p_b64.len(),
        signature,
    })
}

/// Deserialize a JWT NumericDate: integer or non-negative fractional
/// seconds since epoch, floored.
pub fn numeric_date<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    to_numeric_date(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid NumericDate: {value}"))
    })
}

/// Optional variant of [`numeric_date`].
pub fn opt_numeric_date<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<u64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => to_numeric_date(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid NumericDate: {v}"))),
    }
}

fn to_numeric_date(value: &serde_json::Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f < u64::MAX as f64 => Some(f.floor() as u64),
        _ => None,
    }
}
