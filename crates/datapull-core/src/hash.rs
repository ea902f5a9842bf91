use sha2::{Digest, Sha256};

use crate::Coordinate;

/// Stable id for a business: the same name at the same spot hashes the same
/// regardless of which source reported it.
pub fn business_hash(name: &str, coordinate: Coordinate) -> String {
    let key = format!(
        "{}|{:.6}|{:.6}",
        name.trim().to_lowercase(),
        coordinate.lat,
        coordinate.lng
    );
    hex::encode(Sha256::digest(key.as_bytes()))
}
