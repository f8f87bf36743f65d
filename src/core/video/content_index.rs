use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use super::frame::FramePosition;
use super::hasher::Digest;

/// Result of [`ContentIndex::try_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub is_canonical: bool,
    pub owner: FramePosition,
}

/// Digest → canonical frame position, shared by every unit of a run.
///
/// The only mutation is [`try_claim`](Self::try_claim). Entries are never
/// removed or overwritten; the first successful claim for a digest owns it
/// even if a lower position with the same digest arrives later.
#[derive(Debug, Default)]
pub struct ContentIndex {
    owners: Mutex<HashMap<Digest, FramePosition>>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            owners: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Insert-if-absent. Linearizable across callers.
    pub fn try_claim(&self, digest: Digest, candidate: FramePosition) -> Claim {
        let mut owners = self.owners.lock().unwrap_or_else(|e| e.into_inner());
        match owners.entry(digest) {
            Entry::Occupied(existing) => Claim {
                is_canonical: false,
                owner: *existing.get(),
            },
            Entry::Vacant(slot) => {
                slot.insert(candidate);
                Claim {
                    is_canonical: true,
                    owner: candidate,
                }
            }
        }
    }

    pub fn owner_of(&self, digest: &Digest) -> Option<FramePosition> {
        let owners = self.owners.lock().unwrap_or_else(|e| e.into_inner());
        owners.get(digest).copied()
    }

    /// Number of distinct digests claimed so far.
    pub fn len(&self) -> usize {
        self.owners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::hasher::FrameHasher;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn digest(label: &str) -> Digest {
        FrameHasher::new().digest_bytes(label.as_bytes())
    }

    #[test]
    fn test_first_claim_wins() {
        let index = ContentIndex::new();
        let x = digest("x");

        assert_eq!(
            index.try_claim(x, 3),
            Claim {
                is_canonical: true,
                owner: 3
            }
        );
        // a lower position arriving later does not take over
        assert_eq!(
            index.try_claim(x, 1),
            Claim {
                is_canonical: false,
                owner: 3
            }
        );
        assert_eq!(index.owner_of(&x), Some(3));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_distinct_digests_are_independent() {
        let index = ContentIndex::new();
        assert!(index.is_empty());
        assert!(index.try_claim(digest("a"), 1).is_canonical);
        assert!(index.try_claim(digest("b"), 2).is_canonical);
        assert!(!index.try_claim(digest("a"), 3).is_canonical);
        assert_eq!(index.len(), 2);
        assert_eq!(index.owner_of(&digest("c")), None);
    }

    #[test]
    fn test_concurrent_claims_converge() {
        const N: u32 = 32;
        let index = Arc::new(ContentIndex::new());
        let barrier = Arc::new(Barrier::new(N as usize));
        let x = digest("same");

        let handles: Vec<_> = (1..=N)
            .map(|position| {
                let index = Arc::clone(&index);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    index.try_claim(x, position)
                })
            })
            .collect();

        let claims: Vec<Claim> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = claims.iter().filter(|c| c.is_canonical).collect();
        assert_eq!(winners.len(), 1);
        let owner = winners[0].owner;
        assert!(claims.iter().all(|c| c.owner == owner));
        assert_eq!(index.owner_of(&x), Some(owner));
    }
}
