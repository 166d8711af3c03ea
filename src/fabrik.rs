use glam::{Mat3, Vec2};

/// Direction used when two points coincide and no direction can be derived.
const FALLBACK_DIRECTION: Vec2 = Vec2::X;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FabrikPoint {
    pub pos: Vec2,
    /// Distance to the next point in the chain. Ignored on the last point.
    pub length: f32,
}

impl FabrikPoint {
    pub fn new(pos: Vec2, length: f32) -> Self {
        Self { pos, length }
    }
}

/// Builds `count` points hanging from `anchor`, alternating slightly so the first solve
/// never starts from fully coincident points.
pub fn chain(anchor: Vec2, count: usize, length: f32) -> Vec<FabrikPoint> {
    (0..count)
        .map(|i| FabrikPoint::new(anchor + Vec2::new(0.0, (i % 2) as f32 * length), length))
        .collect()
}

/// Places `point` on the ray from `from.pos` through `point.pos`, `from.length` away.
#[inline]
fn reach(from: FabrikPoint, point: &mut FabrikPoint) {
    let dir = (point.pos - from.pos).try_normalize().unwrap_or(FALLBACK_DIRECTION);
    point.pos = from.pos + dir * from.length;
}

/// Relaxes `points` toward `target` while keeping `points[0]` pinned where it was on entry.
///
/// Every placement renormalizes to the declared segment length, so segment lengths hold
/// after each pass, not only at convergence.
pub fn solve(points: &mut [FabrikPoint], target: Vec2, iterations: usize) {
    let Some(anchor) = points.first().map(|p| p.pos) else {
        return;
    };
    let last = points.len() - 1;

    for _ in 0..iterations {
        points[last].pos = target;

        for j in (0..last).rev() {
            let next = points[j + 1];
            reach(next, &mut points[j]);
        }

        points[0].pos = anchor;

        for j in 0..last {
            let prev = points[j];
            reach(prev, &mut points[j + 1]);
        }
    }
    // a single point chain is only ever the anchor
    if last == 0 {
        points[0].pos = anchor;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSegment {
    pub index: usize,
    pub midpoint: Vec2,
    pub angle: f32,
}

impl ChainSegment {
    pub fn transform(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(Vec2::ONE, self.angle, self.midpoint)
    }
}

/// Midpoint and heading of every adjacent pair, for placing segment sprites.
pub fn chain_segments(points: &[FabrikPoint]) -> impl Iterator<Item = ChainSegment> + '_ {
    points.windows(2).enumerate().map(|(index, pair)| {
        let (a, b) = (pair[0].pos, pair[1].pos);
        let delta = b - a;
        ChainSegment { index, midpoint: (a + b) * 0.5, angle: delta.y.atan2(delta.x) }
    })
}

/// Transform per point, facing the next point; the last point faces its predecessor.
pub fn chain_joints(points: &[FabrikPoint]) -> impl Iterator<Item = Mat3> + '_ {
    points.iter().enumerate().filter_map(move |(i, p)| {
        let other = points.get(i + 1).or_else(|| i.checked_sub(1).and_then(|prev| points.get(prev)))?;
        let delta = other.pos - p.pos;
        Some(Mat3::from_scale_angle_translation(Vec2::ONE, delta.y.atan2(delta.x), p.pos))
    })
}
