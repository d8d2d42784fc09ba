use crate::model::HashedFile;
use std::cmp::Ordering;

/// Keeper ranking: a deterministic total order over group members.
///
/// Priority: higher resolution, then higher sharpness, then larger file,
/// then lexicographically smallest path. The path tie-break makes the order
/// total even for byte-identical copies, so selection never depends on input
/// order.
pub fn keeper_order(a: &HashedFile, b: &HashedFile) -> Ordering {
    b.record
        .resolution()
        .cmp(&a.record.resolution())
        .then_with(|| b.record.sharpness.total_cmp(&a.record.sharpness))
        .then_with(|| b.descriptor.size.cmp(&a.descriptor.size))
        .then_with(|| a.descriptor.path.cmp(&b.descriptor.path))
}

/// Sort members so the keeper is first.
pub fn order_members(members: &mut [HashedFile]) {
    members.sort_by(keeper_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileDescriptor, HashRecord};
    use std::path::PathBuf;
    use std::time::UNIX_EPOCH;

    fn member(path: &str, size: u64, width: u32, height: u32, sharpness: f64) -> HashedFile {
        HashedFile {
            descriptor: FileDescriptor {
                path: PathBuf::from(path),
                size,
                modified: UNIX_EPOCH,
                file_id: None,
            },
            record: HashRecord {
                content_hash: [0u8; 32],
                fingerprint: 0,
                sharpness,
                width,
                height,
            },
        }
    }

    #[test]
    fn resolution_beats_everything() {
        let mut members = vec![
            member("/a.jpg", 9_000_000, 100, 100, 500.0),
            member("/b.jpg", 1_000, 200, 200, 1.0),
        ];
        order_members(&mut members);
        assert_eq!(members[0].descriptor.path, PathBuf::from("/b.jpg"));
    }

    #[test]
    fn sharpness_breaks_resolution_ties() {
        let mut members = vec![
            member("/blurry.jpg", 500, 100, 100, 2.0),
            member("/crisp.jpg", 500, 100, 100, 90.0),
        ];
        order_members(&mut members);
        assert_eq!(members[0].descriptor.path, PathBuf::from("/crisp.jpg"));
    }

    #[test]
    fn size_breaks_sharpness_ties() {
        let mut members = vec![
            member("/small.jpg", 500, 100, 100, 5.0),
            member("/large.jpg", 900, 100, 100, 5.0),
        ];
        order_members(&mut members);
        assert_eq!(members[0].descriptor.path, PathBuf::from("/large.jpg"));
    }

    #[test]
    fn path_is_the_final_tie_break() {
        let mut members = vec![
            member("/photos/z.jpg", 500, 100, 100, 5.0),
            member("/photos/a.jpg", 500, 100, 100, 5.0),
            member("/photos/m.jpg", 500, 100, 100, 5.0),
        ];
        order_members(&mut members);
        assert_eq!(members[0].descriptor.path, PathBuf::from("/photos/a.jpg"));
    }

    #[test]
    fn selection_ignores_input_order() {
        let a = member("/a.jpg", 100, 64, 64, 1.0);
        let b = member("/b.jpg", 100, 128, 128, 1.0);
        let c = member("/c.jpg", 100, 32, 32, 9.0);

        let mut forward = vec![a.clone(), b.clone(), c.clone()];
        let mut backward = vec![c, b, a];
        order_members(&mut forward);
        order_members(&mut backward);

        let forward_paths: Vec<_> = forward.iter().map(|m| m.descriptor.path.clone()).collect();
        let backward_paths: Vec<_> = backward.iter().map(|m| m.descriptor.path.clone()).collect();
        assert_eq!(forward_paths, backward_paths);
        assert_eq!(forward[0].descriptor.path, PathBuf::from("/b.jpg"));
    }
}
