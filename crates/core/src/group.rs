//! Slide grouping.
//!
//! Partitions bullet lines into content slides of at most [`GROUP_SIZE`]
//! bullets, keeping no more than [`MAX_GROUPS`] slides.

use crate::SlideGroup;

/// Maximum number of bullets on one content slide.
pub const GROUP_SIZE: usize = 3;

/// Maximum number of content slides in a deck.
pub const MAX_GROUPS: usize = 5;

/// Result of grouping bullets into content slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    /// Content slide groups in order.
    pub groups: Vec<SlideGroup>,

    /// Number of bullets that did not fit under the slide cap.
    pub dropped: usize,
}

impl Grouping {
    /// Total number of bullets kept across all groups.
    pub fn bullet_count(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }
}

/// Groups bullets into fixed-size content slides.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlideGrouper;

impl SlideGrouper {
    /// Create a grouper with the fixed deck limits.
    pub fn new() -> Self {
        Self
    }

    /// Split bullets into consecutive groups, truncated to the slide cap.
    ///
    /// Bullets past `GROUP_SIZE * MAX_GROUPS` are dropped and counted.
    pub fn group(&self, bullets: &[String]) -> Grouping {
        let groups: Vec<SlideGroup> = bullets
            .chunks(GROUP_SIZE)
            .take(MAX_GROUPS)
            .map(|chunk| SlideGroup::new(chunk.to_vec()))
            .collect();

        let kept: usize = groups.iter().map(|g| g.len()).sum();
        let dropped = bullets.len() - kept;
        log::debug!(
            "Grouped {} bullets into {} slides ({} dropped)",
            kept,
            groups.len(),
            dropped
        );

        Grouping { groups, dropped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullets(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("-Point {}", i)).collect()
    }

    #[test]
    fn test_group_empty() {
        let grouping = SlideGrouper::new().group(&[]);
        assert!(grouping.groups.is_empty());
        assert_eq!(grouping.dropped, 0);
    }

    #[test]
    fn test_group_three_is_one_slide() {
        let grouping = SlideGrouper::new().group(&bullets(3));
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].bullets, vec!["-Point 1", "-Point 2", "-Point 3"]);
    }

    #[test]
    fn test_group_remainder() {
        let grouping = SlideGrouper::new().group(&bullets(7));
        let sizes: Vec<usize> = grouping.groups.iter().map(|g| g.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(grouping.dropped, 0);
    }

    #[test]
    fn test_group_caps_at_five_slides() {
        let input = bullets(20);
        let grouping = SlideGrouper::new().group(&input);

        assert_eq!(grouping.groups.len(), MAX_GROUPS);
        assert!(grouping.groups.iter().all(|g| g.len() == GROUP_SIZE));
        assert_eq!(grouping.bullet_count(), 15);
        assert_eq!(grouping.dropped, 5);
    }

    #[test]
    fn test_group_counts_and_order_for_all_sizes() {
        let grouper = SlideGrouper::new();

        for n in 0..=25 {
            let input = bullets(n);
            let grouping = grouper.group(&input);
            let kept = n.min(GROUP_SIZE * MAX_GROUPS);

            assert_eq!(grouping.groups.len(), (kept + GROUP_SIZE - 1) / GROUP_SIZE);
            assert!(grouping
                .groups
                .iter()
                .all(|g| !g.is_empty() && g.len() <= GROUP_SIZE));

            let flattened: Vec<String> = grouping
                .groups
                .iter()
                .flat_map(|g| g.bullets.iter().cloned())
                .collect();
            assert_eq!(flattened, input[..kept].to_vec());
            assert_eq!(grouping.dropped, n - kept);
        }
    }
}
