//! Anonymity-set groups and the registry that owns them.
//!
//! One Merkle-tree-backed group exists per claim type. A proof claims "I am
//! *some* member of this group" against a snapshot of the group root, so
//! membership is append-only: enlarging the set later never invalidates a
//! proof built against an earlier root.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use sha2::{Digest, Sha256};

use crate::claim::normalize_address;
use crate::error::{ClaimProofError, Result};

/// Fixed Merkle tree depth; caps any single group at 2^20 members.
pub const MERKLE_TREE_DEPTH: u32 = 20;

/// Hard member bound implied by the tree depth. Exceeding it is a fatal
/// configuration fault for the claim type, checked before insertion.
pub const MAX_GROUP_SIZE: usize = 1 << MERKLE_TREE_DEPTH;

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Deterministic group identifier for a claim type.
pub fn group_id(claim_type: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"claimproof.group.v1:");
    hasher.update(claim_type.as_bytes());
    hasher.finalize().into()
}

/// One-way identity commitment binding a holder to one credential.
///
/// The same holder gets distinct, unlinkable commitments across different
/// credentials, so group memberships cannot be correlated.
///
/// # Errors
/// Returns an error if the holder address is malformed.
pub fn holder_commitment(holder_address: &str, credential_id: &str) -> Result<[u8; 32]> {
    let normalized = normalize_address(holder_address)?;

    let mut hasher = Sha256::new();
    hasher.update(b"claimproof.identity.v1:");
    hasher.update(normalized.as_bytes());
    hasher.update([0x1f]);
    hasher.update(credential_id.as_bytes());
    Ok(hasher.finalize().into())
}

/// A single anonymity set: ordered identity commitments plus their root.
///
/// `root` is a pure function of `members`, recomputed on every append. The
/// empty group has the all-zero root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: [u8; 32],
    members: Vec<[u8; 32]>,
    root: [u8; 32],
}

impl Group {
    fn new(id: [u8; 32]) -> Self {
        Group {
            id,
            members: Vec::new(),
            root: [0u8; 32],
        }
    }

    pub fn id(&self) -> [u8; 32] {
        self.id
    }

    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, commitment: &[u8; 32]) -> bool {
        self.members.contains(commitment)
    }

    /// Append a commitment and recompute the root.
    ///
    /// Append-only by construction: there is no removal API. Duplicate
    /// commitments are appended as distinct leaves, matching one membership
    /// per generation attempt.
    ///
    /// # Errors
    /// Returns [`ClaimProofError::GroupCapacity`] when the group already
    /// holds 2^[`MERKLE_TREE_DEPTH`] members; the member list is untouched.
    pub fn add_member(&mut self, commitment: [u8; 32]) -> Result<[u8; 32]> {
        if self.members.len() >= MAX_GROUP_SIZE {
            return Err(ClaimProofError::GroupCapacity {
                claim_type: format!("0x{}", hex::encode(self.id)),
                capacity: MAX_GROUP_SIZE,
            });
        }

        self.members.push(commitment);
        self.root = compute_root(&self.members);
        Ok(self.root)
    }
}

/// Fold the member list into a binary Merkle root.
///
/// Odd nodes are promoted unchanged to the next level; the empty list has
/// the all-zero root.
fn compute_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            if let [left, right] = pair {
                next.push(hash_pair(left, right));
            } else {
                next.push(pair[0]);
            }
        }
        level = next;
    }
    level[0]
}

/// Snapshot of a group taken right after an append, under the group lock.
///
/// The proof for the appended commitment is built against exactly this
/// root, never a stale or torn one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub id: [u8; 32],
    pub root: [u8; 32],
    pub member_count: usize,
}

/// Owns every group for the life of the engine.
///
/// No ambient global state: the registry is a value constructed with its
/// engine, so tests get isolated instances. Mutation is serialized per
/// claim type through one `Mutex` per group; the outer map lock is only
/// held to find or create the group entry.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Mutex<Group>>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or lazily create the group for a claim type. Idempotent: the
    /// second call returns the same group with its members intact.
    pub fn get_or_create(&self, claim_type: &str) -> Arc<Mutex<Group>> {
        {
            let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
            if let Some(group) = groups.get(claim_type) {
                return Arc::clone(group);
            }
        }

        let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(groups.entry(claim_type.to_string()).or_insert_with(|| {
            log::info!("Creating anonymity group for claim type '{claim_type}'");
            Arc::new(Mutex::new(Group::new(group_id(claim_type))))
        }))
    }

    /// Append a commitment to the claim type's group and snapshot the
    /// resulting root atomically.
    pub fn add_member(&self, claim_type: &str, commitment: [u8; 32]) -> Result<GroupSnapshot> {
        let group = self.get_or_create(claim_type);
        let mut group = group.lock().unwrap_or_else(|e| e.into_inner());

        let root = group.add_member(commitment).map_err(|e| match e {
            ClaimProofError::GroupCapacity { capacity, .. } => ClaimProofError::GroupCapacity {
                claim_type: claim_type.to_string(),
                capacity,
            },
            other => other,
        })?;
        log::debug!(
            "✓ Group '{claim_type}' now has {} member(s)",
            group.member_count()
        );

        Ok(GroupSnapshot {
            id: group.id(),
            root,
            member_count: group.member_count(),
        })
    }

    /// Number of members in a claim type's group (0 if never created).
    pub fn member_count(&self, claim_type: &str) -> usize {
        let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
        groups
            .get(claim_type)
            .map(|g| g.lock().unwrap_or_else(|e| e.into_inner()).member_count())
            .unwrap_or(0)
    }

    /// Current root of a claim type's group, if it exists.
    pub fn root(&self, claim_type: &str) -> Option<[u8; 32]> {
        let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
        groups
            .get(claim_type)
            .map(|g| g.lock().unwrap_or_else(|e| e.into_inner()).root())
    }

    /// Number of distinct claim-type groups created so far.
    pub fn group_count(&self) -> usize {
        let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
        groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLDER: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn leaf(n: u8) -> [u8; 32] {
        [n; 32]
    }

    #[test]
    fn test_group_id_deterministic() {
        assert_eq!(group_id("income-threshold"), group_id("income-threshold"));
        assert_ne!(group_id("income-threshold"), group_id("caste-verification"));
    }

    #[test]
    fn test_holder_commitment_unlinkable_across_credentials() {
        let a = holder_commitment(HOLDER, "cred-1").unwrap();
        let b = holder_commitment(HOLDER, "cred-2").unwrap();
        let a2 = holder_commitment(HOLDER, "cred-1").unwrap();

        assert_eq!(a, a2, "same holder+credential must commit identically");
        assert_ne!(a, b, "different credentials must not be linkable");
    }

    #[test]
    fn test_holder_commitment_normalizes_case() {
        let a = holder_commitment(HOLDER, "cred-1").unwrap();
        let b = holder_commitment(&HOLDER.to_ascii_lowercase(), "cred-1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_group_has_zero_root() {
        let group = Group::new(group_id("income-threshold"));
        assert_eq!(group.root(), [0u8; 32]);
        assert_eq!(group.member_count(), 0);
    }

    #[test]
    fn test_root_changes_on_append() {
        let mut group = Group::new(group_id("income-threshold"));

        let root1 = group.add_member(leaf(1)).unwrap();
        let root2 = group.add_member(leaf(2)).unwrap();
        let root3 = group.add_member(leaf(3)).unwrap();

        assert_ne!(root1, [0u8; 32]);
        assert_ne!(root1, root2);
        assert_ne!(root2, root3);
        assert_eq!(group.root(), root3);
    }

    #[test]
    fn test_root_is_pure_function_of_members() {
        let mut a = Group::new(group_id("g"));
        let mut b = Group::new(group_id("g"));
        for i in 0..5 {
            a.add_member(leaf(i)).unwrap();
            b.add_member(leaf(i)).unwrap();
        }
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_single_member_root_is_leaf() {
        let mut group = Group::new(group_id("g"));
        let root = group.add_member(leaf(7)).unwrap();
        assert_eq!(root, leaf(7));
    }

    #[test]
    fn test_odd_member_count_promotes_last() {
        // Three leaves: root = H(H(l1, l2), l3)
        let mut group = Group::new(group_id("g"));
        group.add_member(leaf(1)).unwrap();
        group.add_member(leaf(2)).unwrap();
        let root = group.add_member(leaf(3)).unwrap();

        let expected = hash_pair(&hash_pair(&leaf(1), &leaf(2)), &leaf(3));
        assert_eq!(root, expected);
    }

    #[test]
    fn test_registry_idempotent_creation() {
        let registry = GroupRegistry::new();

        let g1 = registry.get_or_create("income-threshold");
        g1.lock().unwrap().add_member(leaf(1)).unwrap();

        let g2 = registry.get_or_create("income-threshold");
        let g2 = g2.lock().unwrap();
        assert_eq!(g2.id(), group_id("income-threshold"));
        assert_eq!(g2.member_count(), 1, "second call must not reset members");
    }

    #[test]
    fn test_registry_separate_groups_per_claim_type() {
        let registry = GroupRegistry::new();
        registry.add_member("income-threshold", leaf(1)).unwrap();
        registry.add_member("caste-verification", leaf(2)).unwrap();

        assert_eq!(registry.group_count(), 2);
        assert_eq!(registry.member_count("income-threshold"), 1);
        assert_eq!(registry.member_count("caste-verification"), 1);
        assert_eq!(registry.member_count("marks-threshold"), 0);
    }

    #[test]
    fn test_snapshot_reflects_own_append() {
        let registry = GroupRegistry::new();
        let snap1 = registry.add_member("g", leaf(1)).unwrap();
        let snap2 = registry.add_member("g", leaf(2)).unwrap();

        assert_eq!(snap1.member_count, 1);
        assert_eq!(snap2.member_count, 2);
        assert_ne!(snap1.root, snap2.root);
        assert_eq!(registry.root("g"), Some(snap2.root));
    }

    #[test]
    fn test_concurrent_appends_serialize() {
        use std::thread;

        let registry = Arc::new(GroupRegistry::new());
        let mut handles = Vec::new();

        for i in 0..8u8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for j in 0..16u8 {
                    registry
                        .add_member("income-threshold", leaf(i * 16 + j))
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.member_count("income-threshold"), 128);
    }
}
