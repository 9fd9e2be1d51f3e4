use std::collections::HashMap;

use anyhow::{Result, bail};

use crate::scanner::FileInfo;

/// One similarity group: the digest of its first-seen member and every file
/// that matched it.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub hash: String,
    pub files: Vec<FileInfo>,
}

/// Ordered mapping from representative hash to clashing files.
///
/// Buckets stay in creation order and candidates are matched against the
/// representatives in that same order, so a given input sequence always
/// produces the same grouping. Membership is only ever checked against the
/// representative, never pairwise against later members: files can share a
/// bucket while being farther than `tolerance` apart from each other. That
/// keeps insertion at O(buckets) per file instead of O(files), and it is
/// the documented behavior, not an accident.
#[derive(Debug, Default)]
pub struct ClashMap {
    tolerance: u32,
    buckets: Vec<Bucket>,
    index: HashMap<String, usize>,
}

impl ClashMap {
    pub fn new(tolerance: u32) -> Self {
        Self {
            tolerance,
            buckets: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Assign a hashed file to the first bucket whose representative lies
    /// within tolerance, or open a new bucket keyed by the file's digest.
    pub fn insert(&mut self, file: FileInfo) -> Result<()> {
        if self.tolerance == 0 {
            if let Some(&slot) = self.index.get(&file.hash) {
                self.buckets[slot].files.push(file);
            } else {
                self.push_bucket(file);
            }
            return Ok(());
        }

        for bucket in &mut self.buckets {
            if hamming(&bucket.hash, &file.hash)? < self.tolerance {
                bucket.files.push(file);
                return Ok(());
            }
        }
        self.push_bucket(file);
        Ok(())
    }

    fn push_bucket(&mut self, file: FileInfo) {
        self.index.insert(file.hash.clone(), self.buckets.len());
        self.buckets.push(Bucket {
            hash: file.hash.clone(),
            files: vec![file],
        });
    }

    /// Drop single-member buckets, keeping only actual clashes.
    pub fn retain_clashes(&mut self) {
        self.buckets.retain(|bucket| bucket.files.len() > 1);
        self.index = self
            .buckets
            .iter()
            .enumerate()
            .map(|(slot, bucket)| (bucket.hash.clone(), slot))
            .collect();
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.files.len()).sum()
    }
}

/// Hamming distance between two hex strings interpreted as big integers.
///
/// Nibbles are compared right-aligned and a missing leading nibble counts
/// as zero, matching big-integer XOR on values of different magnitude.
/// Comparing hashes produced under different configurations is still a
/// caller error; the result is meaningless even though it is defined.
pub fn hamming(a: &str, b: &str) -> Result<u32> {
    let mut distance = 0;
    let mut a_digits = a.bytes().rev();
    let mut b_digits = b.bytes().rev();
    loop {
        let (x, y) = match (a_digits.next(), b_digits.next()) {
            (None, None) => break,
            (x, y) => (nibble(x, a)?, nibble(y, b)?),
        };
        distance += (x ^ y).count_ones();
    }
    Ok(distance)
}

fn nibble(digit: Option<u8>, source: &str) -> Result<u8> {
    match digit {
        None => Ok(0),
        Some(digit) => match (digit as char).to_digit(16) {
            Some(value) => Ok(value as u8),
            None => bail!("Invalid hex digit {:?} in hash '{}'", digit as char, source),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(path: &str, hash: &str) -> FileInfo {
        FileInfo {
            path: PathBuf::from(path),
            size: 0,
            hash: hash.to_string(),
        }
    }

    #[test]
    fn hamming_is_symmetric_and_zero_on_self() {
        for (a, b) in [("00", "ff"), ("abc", "123"), ("5", "e")] {
            assert_eq!(hamming(a, b).unwrap(), hamming(b, a).unwrap());
        }
        assert_eq!(hamming("deadbeef", "deadbeef").unwrap(), 0);
    }

    #[test]
    fn hamming_counts_differing_bits() {
        assert_eq!(hamming("0", "f").unwrap(), 4);
        assert_eq!(hamming("00", "03").unwrap(), 2);
        assert_eq!(hamming("ff00", "00ff").unwrap(), 16);
    }

    #[test]
    fn hamming_right_aligns_unequal_lengths() {
        assert_eq!(hamming("f", "0f").unwrap(), 0);
        assert_eq!(hamming("10f", "f").unwrap(), 1);
    }

    #[test]
    fn hamming_rejects_garbage() {
        assert!(hamming("xyz", "00").is_err());
    }

    #[test]
    fn exact_mode_groups_by_identical_hash() {
        let mut map = ClashMap::new(0);
        map.insert(file("a.txt", "aa")).unwrap();
        map.insert(file("b.txt", "aa")).unwrap();
        map.insert(file("c.txt", "bb")).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.buckets()[0].hash, "aa");
        assert_eq!(map.buckets()[0].files.len(), 2);
        assert_eq!(map.buckets()[1].files.len(), 1);
    }

    #[test]
    fn zero_tolerance_distinguishes_near_hashes() {
        let mut map = ClashMap::new(0);
        map.insert(file("f1", "00")).unwrap();
        map.insert(file("f2", "01")).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn fuzzy_mode_matches_against_representative_only() {
        // 00 and 03 are 2 bits apart, 03 and 0f are 2 bits apart, but 00
        // and 0f are 4 bits apart.
        let mut map = ClashMap::new(3);
        map.insert(file("f1", "00")).unwrap();
        map.insert(file("f2", "03")).unwrap();
        map.insert(file("f3", "0f")).unwrap();
        // f2 joins f1's bucket; f3 is out of tolerance of the representative
        // 00 even though it is close to the member 03.
        assert_eq!(map.len(), 2);
        assert_eq!(map.buckets()[0].hash, "00");
        assert_eq!(map.buckets()[0].files.len(), 2);
        assert_eq!(map.buckets()[1].hash, "0f");
    }

    #[test]
    fn fuzzy_grouping_depends_on_presentation_order() {
        // Same three hashes with the middle one first: now both neighbors
        // fall within tolerance of the representative and all three share
        // one bucket.
        let mut map = ClashMap::new(3);
        map.insert(file("f2", "03")).unwrap();
        map.insert(file("f1", "00")).unwrap();
        map.insert(file("f3", "0f")).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.buckets()[0].hash, "03");
        assert_eq!(map.buckets()[0].files.len(), 3);
    }

    #[test]
    fn retain_clashes_drops_singletons() {
        let mut map = ClashMap::new(0);
        map.insert(file("a", "aa")).unwrap();
        map.insert(file("b", "aa")).unwrap();
        map.insert(file("c", "cc")).unwrap();
        map.retain_clashes();
        assert_eq!(map.len(), 1);
        assert_eq!(map.total_files(), 2);
    }
}
