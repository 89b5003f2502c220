//! Connected-component labeling of binary foreground masks.
//!
//! Runs of foreground (nonzero) pixels are extracted row by row and merged
//! across rows with a union-find forest. Two runs on adjacent rows belong to
//! the same component when they overlap or touch diagonally (8-connectivity).

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;

use crate::image::Rect;

/// A disjoint-set forest with path halving and union by rank.
pub struct UnionFind<'a> {
    parent: &'a mut [u32],
    rank: &'a mut [u8],
}

impl<'a> UnionFind<'a> {
    /// Forest of `size` singleton sets allocated in `arena`.
    pub fn new_in(arena: &'a Bump, size: usize) -> Self {
        let parent = arena.alloc_slice_fill_with(size, |i| i as u32);
        let rank = arena.alloc_slice_fill_copy(size, 0u8);
        Self { parent, rank }
    }

    /// Representative of the set containing `i`.
    #[inline]
    pub fn find(&mut self, i: u32) -> u32 {
        let mut node = i;
        while self.parent[node as usize] != node {
            let grandparent = self.parent[self.parent[node as usize] as usize];
            self.parent[node as usize] = grandparent;
            node = grandparent;
        }
        node
    }

    /// Merge the sets containing `a` and `b`.
    #[inline]
    pub fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (lo, hi) = if self.rank[ra as usize] < self.rank[rb as usize] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[lo as usize] = hi;
        if self.rank[lo as usize] == self.rank[hi as usize] {
            self.rank[hi as usize] += 1;
        }
    }
}

/// Bounding box and pixel statistics of one connected component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentStats {
    /// Minimum x coordinate.
    pub min_x: usize,
    /// Maximum x coordinate (inclusive).
    pub max_x: usize,
    /// Minimum y coordinate.
    pub min_y: usize,
    /// Maximum y coordinate (inclusive).
    pub max_y: usize,
    /// Number of pixels in the component.
    pub pixel_count: usize,
    /// Topmost, then leftmost, pixel. Boundary tracing starts here.
    pub first_pixel: (usize, usize),
}

impl ComponentStats {
    fn seeded(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
            pixel_count: 0,
            first_pixel: (x, y),
        }
    }

    /// Bounding rectangle of the component.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        Rect::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x + 1,
            self.max_y - self.min_y + 1,
        )
    }
}

/// Result of connected component labeling.
pub struct LabelResult<'a> {
    /// Flat row-major labels; 0 is background, `k` is `component_stats[k - 1]`.
    pub labels: &'a [u32],
    /// Statistics per component, ordered by first appearance in raster order.
    pub component_stats: Vec<ComponentStats>,
}

#[derive(Clone, Copy, Debug)]
struct Run {
    y: u32,
    x_start: u32,
    x_end: u32,
    id: u32,
}

/// Label 8-connected foreground components of `binary` and collect their stats.
///
/// Any nonzero byte is foreground.
pub fn label_components_with_stats<'a>(
    arena: &'a Bump,
    binary: &[u8],
    width: usize,
    height: usize,
) -> LabelResult<'a> {
    let mut runs = BumpVec::new_in(arena);

    // Pass 1: foreground runs, in raster order
    for y in 0..height {
        let row = &binary[y * width..(y + 1) * width];
        let mut x = 0;
        while x < width {
            if row[x] == 0 {
                x += 1;
                continue;
            }
            let start = x;
            while x < width && row[x] != 0 {
                x += 1;
            }
            runs.push(Run {
                y: y as u32,
                x_start: start as u32,
                x_end: (x - 1) as u32,
                id: runs.len() as u32,
            });
        }
    }

    let labels = arena.alloc_slice_fill_copy(width * height, 0u32);
    if runs.is_empty() {
        return LabelResult {
            labels,
            component_stats: Vec::new(),
        };
    }

    // Pass 2: link runs of adjacent rows, diagonal contact included
    let mut uf = UnionFind::new_in(arena, runs.len());
    let mut prev_row = 0..0;
    let mut i = 0;
    while i < runs.len() {
        let y = runs[i].y;
        let start = i;
        while i < runs.len() && runs[i].y == y {
            i += 1;
        }
        let curr_row = start..i;

        if y > 0 && !prev_row.is_empty() && runs[prev_row.start].y == y - 1 {
            let mut p = prev_row.start;
            for c in curr_row.clone() {
                let curr = runs[c];
                while p < prev_row.end && runs[p].x_end + 1 < curr.x_start {
                    p += 1;
                }
                let mut q = p;
                while q < prev_row.end && runs[q].x_start <= curr.x_end + 1 {
                    uf.union(curr.id, runs[q].id);
                    q += 1;
                }
            }
        }
        prev_row = curr_row;
    }

    // Pass 3: stats and labels per root
    let mut root_to_label = vec![0u32; runs.len()];
    let mut component_stats: Vec<ComponentStats> = Vec::new();
    for run in &runs {
        let root = uf.find(run.id) as usize;
        if root_to_label[root] == 0 {
            component_stats.push(ComponentStats::seeded(
                run.x_start as usize,
                run.y as usize,
            ));
            root_to_label[root] = component_stats.len() as u32;
        }
        let label = root_to_label[root];
        let stats = &mut component_stats[label as usize - 1];
        let (xs, xe, y) = (run.x_start as usize, run.x_end as usize, run.y as usize);
        stats.min_x = stats.min_x.min(xs);
        stats.max_x = stats.max_x.max(xe);
        stats.min_y = stats.min_y.min(y);
        stats.max_y = stats.max_y.max(y);
        stats.pixel_count += xe - xs + 1;
        labels[y * width + xs..=y * width + xe].fill(label);
    }

    LabelResult {
        labels,
        component_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_union_find() {
        let arena = Bump::new();
        let mut uf = UnionFind::new_in(&arena, 10);

        uf.union(1, 2);
        uf.union(2, 3);
        uf.union(5, 6);

        assert_eq!(uf.find(1), uf.find(3));
        assert_ne!(uf.find(1), uf.find(5));

        uf.union(3, 5);
        assert_eq!(uf.find(1), uf.find(6));
    }

    #[test]
    fn test_label_components_two_squares() {
        let arena = Bump::new();
        #[rustfmt::skip]
        let binary = [
            9, 9, 0, 0, 0,
            9, 9, 0, 0, 0,
            0, 0, 0, 0, 0,
            0, 0, 0, 4, 4,
            0, 0, 0, 4, 4,
        ];
        let result = label_components_with_stats(&arena, &binary, 5, 5);
        assert_eq!(result.component_stats.len(), 2);

        let s1 = result.component_stats[0];
        assert_eq!(s1.pixel_count, 4);
        assert_eq!(s1.bounding_rect(), Rect::new(0, 0, 2, 2));

        let s2 = result.component_stats[1];
        assert_eq!(s2.bounding_rect(), Rect::new(3, 3, 2, 2));
        assert_eq!(s2.first_pixel, (3, 3));
        assert_eq!(result.labels[4 * 5 + 4], 2);
    }

    #[test]
    fn test_diagonal_contact_merges() {
        let arena = Bump::new();
        #[rustfmt::skip]
        let binary = [
            1, 0, 0,
            0, 1, 0,
            0, 0, 1,
        ];
        let result = label_components_with_stats(&arena, &binary, 3, 3);
        assert_eq!(result.component_stats.len(), 1);
        assert_eq!(result.component_stats[0].pixel_count, 3);
    }

    #[test]
    fn test_first_pixel_is_topmost_leftmost() {
        let arena = Bump::new();
        // A "V": the component starts on row 0 at column 0.
        #[rustfmt::skip]
        let binary = [
            1, 0, 0, 0, 1,
            0, 1, 0, 1, 0,
            0, 0, 1, 0, 0,
        ];
        let result = label_components_with_stats(&arena, &binary, 5, 3);
        assert_eq!(result.component_stats.len(), 1);
        assert_eq!(result.component_stats[0].first_pixel, (0, 0));
    }

    proptest! {
        #[test]
        fn prop_union_find_transitivity(pairs in prop::collection::vec((0..500u32, 0..500u32), 0..100)) {
            let arena = Bump::new();
            let mut uf = UnionFind::new_in(&arena, 500);
            for (a, b) in pairs {
                uf.union(a, b);
                prop_assert_eq!(uf.find(a), uf.find(b));
            }
        }

        #[test]
        fn prop_label_components_cover_foreground(
            width in 1..48usize,
            height in 1..48usize,
            data in prop::collection::vec(0..=1u8, 48 * 48)
        ) {
            let arena = Bump::new();
            let slice = &data[..width * height];
            let result = label_components_with_stats(&arena, slice, width, height);

            let total: usize = result.component_stats.iter().map(|s| s.pixel_count).sum();
            let foreground = slice.iter().filter(|&&b| b != 0).count();
            prop_assert_eq!(total, foreground);
            for stat in &result.component_stats {
                prop_assert!(stat.max_x < width);
                prop_assert!(stat.max_y < height);
                prop_assert_eq!(stat.first_pixel.1, stat.min_y);
            }
            for (&b, &l) in slice.iter().zip(result.labels) {
                prop_assert_eq!(b != 0, l != 0);
            }
        }
    }
}
