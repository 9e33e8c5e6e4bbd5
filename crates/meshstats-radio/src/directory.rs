//! Contact directory: identifier-to-name resolution.
//!
//! Push notifications identify nodes by short identifiers (a 6-byte public
//! key prefix, or the single truncated path-hash byte in an rx-log entry),
//! never by name. The directory maps those identifiers back to contact names
//! for metric labels. Resolution never fails: an unknown identifier resolves
//! to its uppercase hex spelling so traffic from strangers is still counted.

use std::collections::HashMap;

use meshstats_protocol::{ContactInfo, PublicKey, SelfInfo};

/// Name lookup tables built from the device's contact list.
///
/// The prefix index is keyed by the first two public key bytes, the width
/// older firmware reports senders with; the path-hash index by the first
/// byte alone.
#[derive(Debug, Default)]
pub struct ContactDirectory {
    by_prefix: HashMap<[u8; 2], String>,
    by_path_hash: HashMap<u8, String>,
}

fn short_prefix(key: &PublicKey) -> [u8; 2] {
    let bytes = key.as_bytes();
    [bytes[0], bytes[1]]
}

impl ContactDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directory contents from a fresh contact list.
    ///
    /// The path-hash byte is only 8 bits, so distinct contacts can collide.
    /// The first contact registered for a byte wins; later ones keep their
    /// prefix entry but lose path-hash attribution. Returns the number of
    /// collisions observed.
    pub fn rebuild(&mut self, contacts: &[ContactInfo]) -> usize {
        self.by_prefix.clear();
        self.by_path_hash.clear();

        let mut collisions = 0;
        for contact in contacts {
            self.by_prefix
                .insert(short_prefix(&contact.public_key), contact.name.clone());
            let hash = contact.public_key.path_hash();
            if self.by_path_hash.contains_key(&hash) {
                collisions += 1;
            } else {
                self.by_path_hash.insert(hash, contact.name.clone());
            }
        }
        collisions
    }

    /// Register the local node so its own identifiers resolve too.
    pub fn add_self(&mut self, info: &SelfInfo) {
        if info.name.is_empty() {
            return;
        }
        self.by_prefix
            .insert(short_prefix(&info.public_key), info.name.clone());
        self.by_path_hash
            .entry(info.public_key.path_hash())
            .or_insert_with(|| info.name.clone());
    }

    /// Resolve a 2-byte public key prefix to a name, falling back to hex.
    pub fn name_by_prefix(&self, prefix: [u8; 2]) -> String {
        self.by_prefix
            .get(&prefix)
            .cloned()
            .unwrap_or_else(|| hex::encode_upper(prefix))
    }

    /// Resolve a truncated path-hash byte to a name, falling back to hex.
    pub fn name_by_path_hash(&self, hash: u8) -> String {
        self.by_path_hash
            .get(&hash)
            .cloned()
            .unwrap_or_else(|| hex::encode_upper([hash]))
    }

    /// Number of contacts registered by prefix.
    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    /// True if no contacts are registered.
    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstats_protocol::{PublicKey, PUB_KEY_SIZE};

    fn contact(name: &str, first_key_byte: u8, second_key_byte: u8) -> ContactInfo {
        let mut key = [0u8; PUB_KEY_SIZE];
        key[0] = first_key_byte;
        key[1] = second_key_byte;
        ContactInfo {
            public_key: PublicKey::new(key),
            contact_type: 2,
            flags: 0,
            out_path_len: -1,
            name: name.to_string(),
            gps_lat: 0,
            gps_lon: 0,
        }
    }

    #[test]
    fn test_resolves_known_contacts() {
        let mut dir = ContactDirectory::new();
        let c = contact("Hilltop", 0x7F, 0x01);
        assert_eq!(dir.rebuild(&[c]), 0);

        assert_eq!(dir.name_by_path_hash(0x7F), "Hilltop");
        assert_eq!(dir.name_by_prefix([0x7F, 0x01]), "Hilltop");
    }

    #[test]
    fn test_unknown_identifiers_fall_back_to_hex() {
        let dir = ContactDirectory::new();
        assert_eq!(dir.name_by_path_hash(0xAB), "AB");
        assert_eq!(dir.name_by_prefix([0xDE, 0xAD]), "DEAD");
    }

    #[test]
    fn test_path_hash_collision_first_wins() {
        let mut dir = ContactDirectory::new();
        let first = contact("First", 0x42, 0x01);
        let second = contact("Second", 0x42, 0x02);

        let collisions = dir.rebuild(&[first, second]);
        assert_eq!(collisions, 1);
        assert_eq!(dir.name_by_path_hash(0x42), "First");

        // Both contacts still resolve by their wider prefix.
        assert_eq!(dir.name_by_prefix([0x42, 0x01]), "First");
        assert_eq!(dir.name_by_prefix([0x42, 0x02]), "Second");
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut dir = ContactDirectory::new();
        dir.rebuild(&[contact("Old", 0x10, 0)]);
        dir.rebuild(&[contact("New", 0x20, 0)]);

        assert_eq!(dir.len(), 1);
        assert_eq!(dir.name_by_path_hash(0x10), "10");
        assert_eq!(dir.name_by_path_hash(0x20), "New");
    }

    #[test]
    fn test_add_self() {
        let mut key = [0u8; PUB_KEY_SIZE];
        key[0] = 0x99;
        let info = SelfInfo {
            public_key: PublicKey::new(key),
            name: "Base".to_string(),
            gps_lat: 0,
            gps_lon: 0,
            tx_power_dbm: 22,
            max_tx_power_dbm: 30,
        };

        let mut dir = ContactDirectory::new();
        dir.add_self(&info);
        assert_eq!(dir.name_by_path_hash(0x99), "Base");
    }
}
