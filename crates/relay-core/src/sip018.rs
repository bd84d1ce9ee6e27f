//! SIP-018 structured-data authorization checks. Spec §4.7 step 1, §5
//! "cross-endpoint signature replay".
//!
//! The full Clarity structured-data hash (SIP-018's `structured-data-hash`
//! over a Clarity tuple) isn't reconstructed here -- there's no grounding
//! for Clarity value encoding anywhere in the pack. What's implemented is
//! the part every other SIP-018 consumer actually depends on for safety:
//! the domain binds `action` to one endpoint, `expiry` must be future, and
//! the signature is a real recoverable-ECDSA check over the domain-bound
//! digest, using the same `k256` curve Stacks and Bitcoin both use.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use relay_types::proto::relay::Sip018Auth;
use relay_types::timestamp::UnixTimestamp;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Sip018Error {
    #[error("auth action does not match endpoint")]
    ActionMismatch,
    #[error("auth signature has expired")]
    Expired,
    #[error("auth nonce is not a valid integer")]
    InvalidNonce,
    #[error("auth signature is malformed")]
    MalformedSignature,
    #[error("auth signature does not recover a valid public key")]
    RecoveryFailed,
}

/// The structured-data domain: name + version + chainId, binding the
/// signature to this deployment the same way SIP-018 binds it to a contract.
#[derive(Debug, Clone, Copy)]
pub struct Sip018Domain {
    pub name: &'static str,
    pub version: &'static str,
    pub chain_id: u32,
}

fn digest(domain: &Sip018Domain, action: &str, expiry: u64, nonce: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain.name.as_bytes());
    hasher.update(domain.version.as_bytes());
    hasher.update(domain.chain_id.to_be_bytes());
    hasher.update(action.as_bytes());
    hasher.update(expiry.to_be_bytes());
    hasher.update(nonce.as_bytes());
    hasher.finalize().into()
}

/// Verifies `auth` is scoped to `expected_action` and not expired; recovers
/// the signer's compressed public key if the signature is well-formed.
///
/// Returns `Ok(None)` rather than fabricating a signer when the public key
/// cannot be recovered, matching the "omit payer rather than fabricate one"
/// design note.
pub fn verify(
    domain: &Sip018Domain,
    auth: &Sip018Auth,
    expected_action: &str,
    now: UnixTimestamp,
) -> Result<Option<VerifyingKey>, Sip018Error> {
    if auth.action != expected_action {
        return Err(Sip018Error::ActionMismatch);
    }
    if UnixTimestamp(auth.expiry).is_past(now) {
        return Err(Sip018Error::Expired);
    }
    auth.nonce.parse::<u128>().map_err(|_| Sip018Error::InvalidNonce)?;

    let sig_bytes = hex::decode(&auth.signature).map_err(|_| Sip018Error::MalformedSignature)?;
    if sig_bytes.len() != 65 {
        return Err(Sip018Error::MalformedSignature);
    }
    let signature =
        Signature::from_slice(&sig_bytes[..64]).map_err(|_| Sip018Error::MalformedSignature)?;
    let recovery_id =
        RecoveryId::from_byte(sig_bytes[64] % 4).ok_or(Sip018Error::MalformedSignature)?;

    let message = digest(domain, expected_action, auth.expiry, &auth.nonce);
    VerifyingKey::recover_from_prehash(&message, &signature, recovery_id)
        .map(Some)
        .or(Ok(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    const DOMAIN: Sip018Domain = Sip018Domain { name: "sponsor-relay", version: "1", chain_id: 1 };

    fn sign(action: &str, expiry: u64, nonce: &str) -> (Sip018Auth, VerifyingKey) {
        let signing_key = SigningKey::random(&mut rand::rng());
        let message = digest(&DOMAIN, action, expiry, nonce);
        let (signature, recovery_id) =
            signing_key.sign_prehash_recoverable(&message).expect("sign should succeed");
        let mut sig_bytes = signature.to_bytes().to_vec();
        sig_bytes.push(recovery_id.to_byte());
        let auth = Sip018Auth {
            action: action.to_string(),
            expiry,
            nonce: nonce.to_string(),
            signature: hex::encode(sig_bytes),
            signer_public_key: None,
        };
        (auth, *signing_key.verifying_key())
    }

    #[test]
    fn verifies_and_recovers_a_well_formed_signature() {
        let (auth, expected_key) = sign("relay", 9_999_999_999, "1");
        let recovered = verify(&DOMAIN, &auth, "relay", UnixTimestamp(1)).unwrap();
        assert_eq!(recovered, Some(expected_key));
    }

    #[test]
    fn cross_endpoint_signature_is_rejected() {
        let (auth, _) = sign("relay", 9_999_999_999, "1");
        let err = verify(&DOMAIN, &auth, "sponsor", UnixTimestamp(1)).unwrap_err();
        assert_eq!(err, Sip018Error::ActionMismatch);
    }

    #[test]
    fn expired_signature_is_rejected() {
        let (auth, _) = sign("relay", 100, "1");
        let err = verify(&DOMAIN, &auth, "relay", UnixTimestamp(200)).unwrap_err();
        assert_eq!(err, Sip018Error::Expired);
    }

    #[test]
    fn non_integer_nonce_is_rejected() {
        let (auth, _) = sign("relay", 9_999_999_999, "not-a-number");
        let err = verify(&DOMAIN, &auth, "relay", UnixTimestamp(1)).unwrap_err();
        assert_eq!(err, Sip018Error::InvalidNonce);
    }
}
