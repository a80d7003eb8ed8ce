//! HMAC-SHA256 helpers shared by cookie and token signing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs `payload` under `key`, scoped by `purpose` so signatures from one
/// extension never validate in another.
pub(crate) fn sign(key: &[u8], purpose: &str, payload: &str) -> String {
    hex::encode(mac(key, purpose, payload).finalize().into_bytes())
}

/// Constant-time check of a hex signature.
pub(crate) fn verify(key: &[u8], purpose: &str, payload: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    mac(key, purpose, payload).verify_slice(&expected).is_ok()
}

fn mac(key: &[u8], purpose: &str, payload: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(purpose.as_bytes());
    mac.update(b"\0");
    mac.update(payload.as_bytes());
    mac
}
