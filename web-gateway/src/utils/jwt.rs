use anyhow::Result;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
            .ok_or_else(|| anyhow::anyhow!("exp claim out of range: {}", self.exp))
    }
}

/// Decode JWT claims without validation.
///
/// The gateway receives tokens straight from the backend's own auth
/// endpoints over a trusted channel; we only need the identity and expiry
/// fields to seed the session, so signature checking stays the backend's job.
pub fn decode_access_claims(token: &str) -> Result<AccessClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: AccessClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_claims_from_an_unsigned_payload() {
        // Payload: {"sub":"user_123","email":"test@example.com","exp":9999999999,"iat":1736500000,"jti":"abc123"}
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1c2VyXzEyMyIsImVtYWlsIjoidGVzdEBleGFtcGxlLmNvbSIsImV4cCI6OTk5OTk5OTk5OSwiaWF0IjoxNzM2NTAwMDAwLCJqdGkiOiJhYmMxMjMifQ.signature";

        let claims = decode_access_claims(token).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp, 9_999_999_999);
        assert!(claims.expires_at().unwrap() > Utc::now());
    }

    #[test]
    fn rejects_a_token_without_three_parts() {
        assert!(decode_access_claims("not-a-jwt").is_err());
        assert!(decode_access_claims("a.b").is_err());
    }

    #[test]
    fn rejects_a_payload_that_is_not_base64() {
        assert!(decode_access_claims("header.!!!.signature").is_err());
    }
}
