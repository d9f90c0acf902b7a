//! Clamp and tolerance primitives shared by every component.

/// Numeric types usable with [`within_tolerance`].
///
/// Integer implementations widen before adding so `reference ± tolerance` cannot overflow.
pub trait Tolerance: Copy + PartialOrd {
    fn within(self, reference: Self, tolerance: Self) -> bool;
}

macro_rules! int_tolerance {
    ($($t:ty => $wide:ty),* $(,)?) => {
        $(
            impl Tolerance for $t {
                #[inline]
                fn within(self, reference: Self, tolerance: Self) -> bool {
                    let v = <$wide>::from(self);
                    let r = <$wide>::from(reference);
                    let t = <$wide>::from(tolerance);
                    v > r - t && v < r + t
                }
            }
        )*
    };
}

int_tolerance!(u8 => i32, u16 => i32, i16 => i32, u32 => i64, i32 => i64, i64 => i128);

impl Tolerance for f32 {
    #[inline]
    fn within(self, reference: Self, tolerance: Self) -> bool {
        self > reference - tolerance && self < reference + tolerance
    }
}

impl Tolerance for f64 {
    #[inline]
    fn within(self, reference: Self, tolerance: Self) -> bool {
        self > reference - tolerance && self < reference + tolerance
    }
}

/// `min` if `value < min`, `max` if `value > max`, otherwise `value`.
///
/// Unlike `Ord::clamp` this never panics on `min > max` (the lower bound wins) and works
/// for floats.
#[inline]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// True iff `reference - tolerance < value < reference + tolerance`.
#[inline]
pub fn within_tolerance<T: Tolerance>(value: T, reference: T, tolerance: T) -> bool {
    value.within(reference, tolerance)
}
