use crate::hasher::fingerprint::{Fingerprint, BAND_COUNT};
use crate::model::{DuplicateGroup, GroupKind, HashedFile};
use crate::select;
use ahash::AHashMap;
use tracing::debug;

/// Aggregates hash results for one scan and builds the duplicate groups.
///
/// Owned by a single aggregator thread; workers hand results over a channel,
/// so no internal locking is needed. Exact duplicates are an equivalence
/// class over the content hash. Near duplicates use greedy single-linkage
/// against cluster seeds: a chain A~B~C can end up in one cluster even when
/// distance(A,C) exceeds the threshold, and arrival order among near-ties can
/// decide which cluster a borderline fingerprint joins. That favors recall
/// over strict transitivity and matches the documented policy.
pub struct ClusterEngine {
    threshold: u32,
    match_exact_in_similar: bool,
    files: Vec<HashedFile>,
    by_content: AHashMap<[u8; 32], Vec<usize>>,
}

impl ClusterEngine {
    pub fn new(threshold: u32, match_exact_in_similar: bool) -> ClusterEngine {
        ClusterEngine {
            threshold,
            match_exact_in_similar,
            files: Vec::new(),
            by_content: AHashMap::new(),
        }
    }

    pub fn add(&mut self, file: HashedFile) {
        let index = self.files.len();
        self.by_content
            .entry(file.record.content_hash)
            .or_default()
            .push(index);
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Build the final groups. Called exactly once per scan; singletons are
    /// dropped and output order is deterministic.
    pub fn finalize(self) -> Vec<DuplicateGroup> {
        let ClusterEngine {
            threshold,
            match_exact_in_similar,
            files,
            by_content,
        } = self;

        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut in_exact = vec![false; files.len()];

        for indices in by_content.values() {
            if indices.len() < 2 {
                continue;
            }
            for &i in indices {
                in_exact[i] = true;
            }
            let mut members: Vec<HashedFile> = indices.iter().map(|&i| files[i].clone()).collect();
            select::order_members(&mut members);
            groups.push(DuplicateGroup {
                kind: GroupKind::Exact,
                members,
            });
        }

        // Greedy near-duplicate pass in arrival order. The band index over
        // cluster seeds gives cheap candidates for the common near-identical
        // case; the threshold test itself always falls back to a full seed
        // scan, so `distance <= threshold` is never missed.
        let mut seeds: Vec<Fingerprint> = Vec::new();
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        let mut band_index: AHashMap<(usize, u16), Vec<usize>> = AHashMap::new();

        for i in 0..files.len() {
            if in_exact[i] && !match_exact_in_similar {
                continue;
            }
            let fp = Fingerprint(files[i].record.fingerprint);

            let mut candidates: Vec<usize> = Vec::new();
            for band in 0..BAND_COUNT {
                if let Some(ids) = band_index.get(&(band, fp.band(band))) {
                    candidates.extend_from_slice(ids);
                }
            }
            candidates.sort_unstable();
            candidates.dedup();

            let mut chosen = candidates
                .iter()
                .copied()
                .find(|&c| fp.is_within(&seeds[c], threshold));
            if chosen.is_none() {
                chosen = (0..seeds.len()).find(|&c| fp.is_within(&seeds[c], threshold));
            }

            match chosen {
                Some(c) => clusters[c].push(i),
                None => {
                    let c = seeds.len();
                    for band in 0..BAND_COUNT {
                        band_index
                            .entry((band, fp.band(band)))
                            .or_default()
                            .push(c);
                    }
                    seeds.push(fp);
                    clusters.push(vec![i]);
                }
            }
        }

        for cluster in clusters {
            if cluster.len() < 2 {
                continue;
            }
            let mut members: Vec<HashedFile> = cluster.iter().map(|&i| files[i].clone()).collect();
            select::order_members(&mut members);
            groups.push(DuplicateGroup {
                kind: GroupKind::Similar,
                members,
            });
        }

        groups.sort_by(|a, b| {
            kind_rank(a.kind)
                .cmp(&kind_rank(b.kind))
                .then_with(|| b.members.len().cmp(&a.members.len()))
                .then_with(|| a.keeper().descriptor.path.cmp(&b.keeper().descriptor.path))
        });

        debug!("Finalized {} duplicate groups", groups.len());
        groups
    }
}

fn kind_rank(kind: GroupKind) -> u8 {
    match kind {
        GroupKind::Exact => 0,
        GroupKind::Similar => 1,
    }
}
