use std::cmp::Ordering;

use ndarray::Array2;

use crate::error::Result;

use super::types::{AlertLayer, AlertPixel};

/// Offset within the buffer disc, sorted by squared distance.
#[derive(Clone, Copy, Debug)]
struct DiscOffset {
    dr: isize,
    dc: isize,
    dist2: isize,
}

fn disc_offsets(radius: f64) -> Vec<DiscOffset> {
    let r = radius.floor() as isize;
    let r2 = radius * radius;
    let mut offsets = Vec::new();
    for dr in -r..=r {
        for dc in -r..=r {
            let dist2 = dr * dr + dc * dc;
            if dist2 > 0 && (dist2 as f64) <= r2 {
                offsets.push(DiscOffset { dr, dc, dist2 });
            }
        }
    }
    offsets.sort_by_key(|o| (o.dist2, o.dr, o.dc));
    offsets
}

/// Candidate ordering for a buffered pixel: high-confidence class first,
/// then nearest, then earliest date, then stronger confidence.
fn better_candidate(a: (AlertPixel, isize), b: (AlertPixel, isize)) -> bool {
    let (pa, da) = a;
    let (pb, db) = b;
    let order = pb
        .confidence()
        .is_high()
        .cmp(&pa.confidence().is_high())
        .then(da.cmp(&db))
        .then(pa.day_offset().cmp(&pb.day_offset()))
        .then(pb.confidence().cmp(&pa.confidence()));
    order == Ordering::Less
}

/// Grow confirmed pixels into NONE pixels within `radius` pixels.
///
/// Existing alerts are never changed; each buffered pixel inherits the
/// confidence and date of its best neighbouring alert.
pub fn dilate(layer: &AlertLayer, radius: f64) -> Result<AlertLayer> {
    let offsets = disc_offsets(radius);
    let src = layer.pixels();
    let (h, w) = src.dim();

    let pixels = Array2::from_shape_fn((h, w), |(row, col)| {
        let here = src[[row, col]];
        if here.is_alert() {
            return here;
        }
        let mut best: Option<(AlertPixel, isize)> = None;
        for o in &offsets {
            let nr = row as isize + o.dr;
            let nc = col as isize + o.dc;
            if nr < 0 || nr >= h as isize || nc < 0 || nc >= w as isize {
                continue;
            }
            let p = src[[nr as usize, nc as usize]];
            if !p.is_alert() {
                continue;
            }
            let candidate = (p, o.dist2);
            best = match best {
                Some(current) if !better_candidate(candidate, current) => Some(current),
                _ => Some(candidate),
            };
        }
        best.map(|(p, _)| p).unwrap_or(AlertPixel::NONE)
    });

    AlertLayer::from_pixels(layer.grid(), pixels)
        .map(|l| l.with_temporal_radius(layer.temporal_radius()))
}
