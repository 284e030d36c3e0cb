//! Maximal-rectangle decomposition: given a set of same-type tiles,
//! find the largest axis-aligned rectangle fully contained in their
//! union. Used by the area, maxwidth, and rectangle-size scanners, which
//! all reduce to "is there a sub-rectangle exceeding (or failing to
//! reach) some size threshold".

use core_tile::{Coord, Rect};

/// The largest rectangle entirely covered by `tiles`, or `None` if
/// `tiles` is empty. Coordinates are compressed to the tiles' own edges
/// first, so cost scales with tile count, not geometry extent.
pub fn find_max_rectangle(tiles: &[Rect]) -> Option<Rect> {
    if tiles.is_empty() {
        return None;
    }
    let mut xs: Vec<Coord> = tiles.iter().flat_map(|r| [r.ll.x, r.ur.x]).collect();
    let mut ys: Vec<Coord> = tiles.iter().flat_map(|r| [r.ll.y, r.ur.y]).collect();
    xs.sort_unstable();
    xs.dedup();
    ys.sort_unstable();
    ys.dedup();
    if xs.len() < 2 || ys.len() < 2 {
        return None;
    }

    let ncols = xs.len() - 1;
    let nrows = ys.len() - 1;
    let mut covered = vec![vec![false; ncols]; nrows];
    for r in tiles {
        for (row, wy) in ys.windows(2).enumerate() {
            if wy[0] >= r.ll.y && wy[1] <= r.ur.y {
                for (col, wx) in xs.windows(2).enumerate() {
                    if wx[0] >= r.ll.x && wx[1] <= r.ur.x {
                        covered[row][col] = true;
                    }
                }
            }
        }
    }

    // classic histogram-based maximal rectangle in a binary matrix,
    // tracked in (row, col) cell-index space then mapped back through
    // xs/ys to real coordinates.
    let mut heights = vec![0usize; ncols];
    let mut best: Option<(usize, usize, usize, usize)> = None; // (row_top, col_left, col_right_excl, height)
    for row in 0..nrows {
        for col in 0..ncols {
            heights[col] = if covered[row][col] { heights[col] + 1 } else { 0 };
        }
        let mut stack: Vec<(usize, usize)> = Vec::new(); // (start_col, height)
        for col in 0..=ncols {
            let h = if col < ncols { heights[col] } else { 0 };
            let mut start = col;
            while let Some(&(s, sh)) = stack.last() {
                if sh > h {
                    stack.pop();
                    let area = sh * (col - s);
                    let best_area = best.map(|(_, l, r, ht)| (r - l) * ht).unwrap_or(0);
                    if area > best_area {
                        best = Some((row + 1 - sh, s, col, sh));
                    }
                    start = s;
                } else {
                    break;
                }
            }
            stack.push((start, h));
        }
    }

    best.map(|(row_top, col_left, col_right, height)| {
        Rect::new(xs[col_left], ys[row_top], xs[col_right], ys[row_top + height])
    })
}

/// Up to `limit` disjoint maximal rectangles, largest first, found by
/// repeatedly extracting the largest rectangle and removing its area
/// from consideration. Mirrors the original's multi-rectangle record
/// used by the wide-spacing rule.
pub fn find_max_rects(tiles: &[Rect], limit: usize) -> Vec<Rect> {
    let mut remaining = tiles.to_vec();
    let mut out = Vec::new();
    while out.len() < limit {
        let Some(best) = find_max_rectangle(&remaining) else {
            break;
        };
        out.push(best);
        remaining = subtract_rect(&remaining, best);
        if remaining.is_empty() {
            break;
        }
    }
    out
}

/// Clip every rect in `tiles` so none of them overlaps `cut`, splitting
/// into up to four remainder pieces per rect as needed.
fn subtract_rect(tiles: &[Rect], cut: Rect) -> Vec<Rect> {
    let mut out = Vec::new();
    for r in tiles {
        let Some(ov) = r.intersection(&cut) else {
            out.push(*r);
            continue;
        };
        if r.ll.y < ov.ll.y {
            out.push(Rect::new(r.ll.x, r.ll.y, r.ur.x, ov.ll.y));
        }
        if ov.ur.y < r.ur.y {
            out.push(Rect::new(r.ll.x, ov.ur.y, r.ur.x, r.ur.y));
        }
        if r.ll.x < ov.ll.x {
            out.push(Rect::new(r.ll.x, ov.ll.y, ov.ll.x, ov.ur.y));
        }
        if ov.ur.x < r.ur.x {
            out.push(Rect::new(ov.ur.x, ov.ll.y, r.ur.x, ov.ur.y));
        }
    }
    out.retain(|r| !r.is_empty());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tile_is_its_own_max_rectangle() {
        let tiles = vec![Rect::new(0, 0, 10, 5)];
        assert_eq!(find_max_rectangle(&tiles), Some(Rect::new(0, 0, 10, 5)));
    }

    #[test]
    fn l_shape_finds_larger_leg() {
        let tiles = vec![Rect::new(0, 0, 10, 4), Rect::new(0, 4, 4, 10)];
        let r = find_max_rectangle(&tiles).unwrap();
        assert_eq!(r.area(), 40);
    }

    #[test]
    fn find_max_rects_returns_disjoint_pieces() {
        let tiles = vec![Rect::new(0, 0, 10, 4), Rect::new(0, 4, 4, 10)];
        let rects = find_max_rects(&tiles, 2);
        assert!(rects.len() >= 1);
        if rects.len() == 2 {
            assert!(rects[0].intersection(&rects[1]).is_none());
        }
    }
}
