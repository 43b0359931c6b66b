//! # Schema Hash Vectors
//!
//! Fixed vectors for the canonical-bytes + SHA-256 pipeline. Wallets in
//! other languages recompute the schema hash from `/v1/schemas/{hash}` and
//! compare it with the descriptor, so these bytes must never drift.

use zkattest_core::{sha256_digest, CanonicalBytes, ContentDigest};

const SCHEMA_TEXT: &str = r#"{
    "version": "1",
    "schema_id": "t",
    "fields": [ { "type": "integer", "name": "age" } ],
    "constraints": []
}"#;

const EXPECTED_CANONICAL: &str =
    r#"{"constraints":[],"fields":[{"name":"age","type":"integer"}],"schema_id":"t","version":"1"}"#;

const EXPECTED_HASH: &str =
    "sha256:445a9bc14666e90e1e3ac43b3b46236e2e4bf7cfc3395c4a05d45ccad8a320c3";

fn canonical(text: &str) -> CanonicalBytes {
    let value: serde_json::Value = serde_json::from_str(text).expect("valid json");
    CanonicalBytes::new(&value).expect("canonicalizes")
}

#[test]
fn canonical_text_matches_vector() {
    assert_eq!(canonical(SCHEMA_TEXT).as_str(), EXPECTED_CANONICAL);
}

#[test]
fn schema_hash_matches_vector() {
    let digest = sha256_digest(&canonical(SCHEMA_TEXT));
    assert_eq!(digest.to_string(), EXPECTED_HASH);
}

#[test]
fn hash_is_stable_across_reformatting() {
    let reformatted = r#"{"schema_id":"t","constraints":[],"version":"1","fields":[{"name":"age","type":"integer"}]}"#;
    assert_eq!(
        sha256_digest(&canonical(SCHEMA_TEXT)),
        sha256_digest(&canonical(reformatted))
    );
}

#[test]
fn expected_hash_parses() {
    let parsed: ContentDigest = EXPECTED_HASH.parse().expect("parses");
    assert_eq!(parsed, sha256_digest(&canonical(EXPECTED_CANONICAL)));
}
