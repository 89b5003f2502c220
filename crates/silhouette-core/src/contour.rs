#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

//! External contours of labeled components.
//!
//! Each component's outer boundary is followed with Moore-neighbor tracing,
//! starting at its topmost-leftmost pixel. Holes are never traced.

use crate::image::Rect;
use crate::segmentation::LabelResult;
use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;

/// A boundary pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

/// The traced outer boundary of one component.
#[derive(Clone, Debug)]
pub struct Contour {
    /// Label of the traced component.
    pub label: u32,
    /// Boundary pixels in tracing order, not closed (the start is not repeated).
    pub points: Vec<Point>,
    /// Area enclosed by the boundary polygon.
    pub area: f64,
    /// Bounding rectangle of the component.
    pub bounding_rect: Rect,
}

// Moore neighborhood, clockwise from top (y grows downwards).
const DX: [isize; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
const DY: [isize; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

/// Trace the outer boundary of every component in `label_result`.
#[must_use]
pub fn find_external_contours(
    arena: &Bump,
    label_result: &LabelResult,
    width: usize,
    height: usize,
) -> Vec<Contour> {
    label_result
        .component_stats
        .iter()
        .enumerate()
        .map(|(idx, stat)| {
            let label = (idx + 1) as u32;
            let (sx, sy) = stat.first_pixel;
            let max_steps = 4 * stat.pixel_count + 4;
            let points = trace_boundary(
                arena,
                label_result.labels,
                width,
                height,
                sx,
                sy,
                label,
                max_steps,
            );
            Contour {
                label,
                area: polygon_area(&points),
                points: points.to_vec(),
                bounding_rect: stat.bounding_rect(),
            }
        })
        .collect()
}

/// Follow the border of `target_label` clockwise from `(start_x, start_y)`.
///
/// The start must be the component's topmost-leftmost pixel. Tracing stops
/// when the walk is about to repeat its first move from the start, when the
/// pixel is isolated, or after `max_steps` moves. A start pixel that joins
/// two branches is therefore passed through instead of ending the walk early.
#[allow(clippy::too_many_arguments)]
pub fn trace_boundary<'a>(
    arena: &'a Bump,
    labels: &[u32],
    width: usize,
    height: usize,
    start_x: usize,
    start_y: usize,
    target_label: u32,
    max_steps: usize,
) -> BumpVec<'a, Point> {
    let start = Point {
        x: start_x,
        y: start_y,
    };
    let mut points = BumpVec::new_in(arena);
    points.push(start);
    let mut current = start;
    // Nothing lies above or to the left of the start, so pretend we arrived moving right.
    let mut walk_dir = 2;
    let mut first_move: Option<Point> = None;

    for _ in 0..max_steps {
        let Some((next, dir)) =
            next_boundary_pixel(labels, width, height, current, walk_dir, target_label)
        else {
            break;
        };
        if current == start {
            match first_move {
                None => first_move = Some(next),
                Some(first) if first == next => {
                    // Closed: drop the repeated start.
                    points.pop();
                    break;
                }
                Some(_) => {}
            }
        }
        points.push(next);
        current = next;
        walk_dir = dir;
    }

    points
}

/// First pixel of `target_label` clockwise around `p`, scanning from just
/// past the pixel the walk came from.
fn next_boundary_pixel(
    labels: &[u32],
    width: usize,
    height: usize,
    p: Point,
    walk_dir: usize,
    target_label: u32,
) -> Option<(Point, usize)> {
    (0..8).find_map(|i| {
        let dir = (walk_dir + 5 + i) % 8;
        let nx = p.x as isize + DX[dir];
        let ny = p.y as isize + DY[dir];
        if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
            return None;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        (labels[ny * width + nx] == target_label).then_some((Point { x: nx, y: ny }, dir))
    })
}

/// Shoelace area of a closed polygon (the last vertex connects to the first).
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice: i64 = 0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice.unsigned_abs() as f64 * 0.5
}
