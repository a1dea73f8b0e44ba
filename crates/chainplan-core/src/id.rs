use serde::{Deserialize, Serialize};

/// Identifies an item in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies a recipe (the game's SID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a machine (building) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u32);

/// Stable identifier of a position in a resolved production tree.
///
/// Derived from the path of recipes and raw items leading to the node, so it
/// survives settings-only edits (boosters, machine ranks, belts). The
/// presentation layer keys collapse state and [`NodeOverride`]s by it.
///
/// [`NodeOverride`]: crate::settings::NodeOverride
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

// ---------------------------------------------------------------------------
// Node key hash
// ---------------------------------------------------------------------------

/// Deterministic FNV-1a (64-bit) hash used to derive [`NodeId`]s.
///
/// Not cryptographic. Stable across runs and platforms, unlike
/// `std::hash::DefaultHasher`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKeyHash(u64);

impl NodeKeyHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn finish(self) -> NodeId {
        NodeId(self.0)
    }
}

impl Default for NodeKeyHash {
    fn default() -> Self {
        Self::new()
    }
}
