use anyhow::{bail, Result};
use glam::{Vec2, Vec3, Vec4};

/// Shapes a normalized progress value `u` in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    Smoothstep,
    Custom(fn(f32) -> f32),
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Smoothstep
    }
}

impl Easing {
    #[inline]
    pub fn apply(self, u: f32) -> f32 {
        match self {
            Easing::Linear => u,
            Easing::EaseIn => ease_in(u),
            Easing::EaseOut => ease_out(u),
            Easing::Smoothstep => smoothstep(u),
            Easing::Custom(f) => f(u),
        }
    }
}

#[inline]
pub fn smoothstep(u: f32) -> f32 {
    3.0 * u * u - 2.0 * u * u * u
}

#[inline]
pub fn ease_in(u: f32) -> f32 {
    u * u
}

#[inline]
pub fn ease_out(u: f32) -> f32 {
    1.0 - (u - 1.0) * (u - 1.0)
}

/// Values that can be blended as `a * (1 - u) + b * u`.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, u: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(self, other: Self, u: f32) -> Self {
        self * (1.0 - u) + other * u
    }
}

macro_rules! impl_vector_lerp {
    ($($ty:ty),*) => {
        $(
            impl Lerp for $ty {
                #[inline]
                fn lerp(self, other: Self, u: f32) -> Self {
                    self * (1.0 - u) + other * u
                }
            }
        )*
    };
}

impl_vector_lerp!(Vec2, Vec3, Vec4);

#[inline]
pub fn lerp<T: Lerp>(u: f32, a: T, b: T) -> T {
    a.lerp(b, u)
}

#[inline]
fn progress(t: f32, from: f32, to: f32) -> f32 {
    ((t - from) / (to - from)).clamp(0.0, 1.0)
}

/// Linear blend from `a` to `b` while `t` travels from `from` to `to`, clamped at both ends.
pub fn tlerp<T: Lerp>(t: f32, from: f32, to: f32, a: T, b: T) -> T {
    a.lerp(b, progress(t, from, to))
}

/// Same as [`tlerp`] with the progress shaped by `easing`.
pub fn ease<T: Lerp>(easing: Easing, t: f32, from: f32, to: f32, a: T, b: T) -> T {
    a.lerp(b, easing.apply(progress(t, from, to)))
}

#[derive(Debug, Clone, Copy)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
    /// Easing used for the segment that starts at this keyframe.
    pub easing: Easing,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value, easing: Easing::default() }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

pub fn key<T>(time: f32, value: T) -> Keyframe<T> {
    Keyframe::new(time, value)
}

/// Samples an ordered keyframe slice at `t`. Returns `None` for an empty slice.
///
/// Before the first key the first value is returned, after the last key the last value;
/// there is no extrapolation.
pub fn sample_keyframes<T: Lerp>(frames: &[Keyframe<T>], t: f32) -> Option<T> {
    let first = frames.first()?;
    if t < first.time {
        return Some(first.value);
    }
    for pair in frames.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if t >= current.time && t < next.time {
            return Some(ease(current.easing, t, current.time, next.time, current.value, next.value));
        }
    }
    frames.last().map(|frame| frame.value)
}

/// A validated, non-empty keyframe track.
#[derive(Debug, Clone)]
pub struct Keyframes<T> {
    frames: Vec<Keyframe<T>>,
}

impl<T: Lerp> Keyframes<T> {
    pub fn new(frames: Vec<Keyframe<T>>) -> Result<Self> {
        if frames.is_empty() {
            bail!("Keyframe track needs at least one keyframe");
        }
        if let Some(pair) = frames.windows(2).find(|pair| pair[1].time < pair[0].time) {
            bail!("Keyframe times must not decrease ({} follows {})", pair[1].time, pair[0].time);
        }
        Ok(Self { frames })
    }

    pub fn sample(&self, t: f32) -> T {
        match sample_keyframes(&self.frames, t) {
            Some(value) => value,
            None => self.frames[0].value,
        }
    }

    pub fn frames(&self) -> &[Keyframe<T>] {
        &self.frames
    }

    pub fn start(&self) -> f32 {
        self.frames[0].time
    }

    pub fn end(&self) -> f32 {
        self.frames[self.frames.len() - 1].time
    }
}

/// Uniform Catmull-Rom segment between `p1` and `p2`.
pub fn sample_catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + t * (-p0 + p2)
        + t2 * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3)
        + t3 * (-p0 + 3.0 * p1 - 3.0 * p2 + p3))
}

/// Clamped spline through all four points; each third of `[0, 1]` covers one span,
/// with the end points doubled so no phantom neighbours are needed.
pub fn sample_full_catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    if t < 1.0 / 3.0 {
        sample_catmull_rom(p0, p0, p1, p2, t * 3.0)
    } else if t < 2.0 / 3.0 {
        sample_catmull_rom(p0, p1, p2, p3, t * 3.0 - 1.0)
    } else {
        sample_catmull_rom(p1, p2, p3, p3, t * 3.0 - 2.0)
    }
}
