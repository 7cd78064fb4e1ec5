use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify HMAC-SHA256 signature
///
/// The authenticating gateway signs the requester id with the shared secret
/// and sends the hex tag alongside it.
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
///
/// Comparison is constant time.
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "gateway-secret";

    // what the gateway computes for the signature header
    fn sign(data: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(data.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_signed_user_id_verifies() {
        let signature = sign("42", SECRET);
        assert_eq!(signature.len(), 64);
        assert!(verify_hmac("42", &signature, SECRET));
    }

    #[test]
    fn test_tampered_user_id_rejected() {
        let signature = sign("42", SECRET);
        assert!(!verify_hmac("43", &signature, SECRET));
        assert!(!verify_hmac("42", &signature, "other-secret"));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert!(!verify_hmac("42", "not-hex", SECRET));
        assert!(!verify_hmac("42", "", SECRET));
        assert!(!verify_hmac("42", "abcd", SECRET));
    }
}
