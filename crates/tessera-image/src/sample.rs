/// Trait for real pixel sample types.
///
/// Windowed operators accumulate in `f64` regardless of the storage type and
/// convert back on store: integer types round and clamp to their native
/// range, floating point types store the value unchanged (out-of-range
/// values are handled downstream by the truncate/rescale policies).
pub trait Sample: Copy + PartialOrd + Send + Sync + 'static {
    /// Smallest representable sample value.
    const MIN_SAMPLE: Self;
    /// Largest representable sample value.
    const MAX_SAMPLE: Self;
    /// Whether the type stores floating point samples.
    const IS_FLOAT: bool;

    /// Widen the sample to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow an `f64` accumulator back to the storage type.
    fn from_f64(v: f64) -> Self;

    /// Map the sample to the normalized `[0, 1]` range: integer types divide
    /// by their maximum, floating point types pass through.
    fn to_normalized(self) -> f64 {
        self.to_f64() / Self::MAX_SAMPLE.to_f64()
    }

    /// Map a normalized `[0, 1]` value back to the storage type, with the
    /// same rounding and clamping semantics as [`Sample::from_f64`].
    fn from_normalized(v: f64) -> Self {
        Self::from_f64(v * Self::MAX_SAMPLE.to_f64())
    }
}

impl Sample for u8 {
    const MIN_SAMPLE: Self = u8::MIN;
    const MAX_SAMPLE: Self = u8::MAX;
    const IS_FLOAT: bool = false;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(v: f64) -> Self {
        v.round().clamp(0.0, u8::MAX as f64) as u8
    }
}

impl Sample for u16 {
    const MIN_SAMPLE: Self = u16::MIN;
    const MAX_SAMPLE: Self = u16::MAX;
    const IS_FLOAT: bool = false;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(v: f64) -> Self {
        v.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl Sample for u32 {
    const MIN_SAMPLE: Self = u32::MIN;
    const MAX_SAMPLE: Self = u32::MAX;
    const IS_FLOAT: bool = false;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(v: f64) -> Self {
        v.round().clamp(0.0, u32::MAX as f64) as u32
    }
}

impl Sample for f32 {
    const MIN_SAMPLE: Self = 0.0;
    const MAX_SAMPLE: Self = 1.0;
    const IS_FLOAT: bool = true;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Sample for f64 {
    const MIN_SAMPLE: Self = 0.0;
    const MAX_SAMPLE: Self = 1.0;
    const IS_FLOAT: bool = true;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_round_and_clamp() {
        assert_eq!(u8::from_f64(12.4), 12);
        assert_eq!(u8::from_f64(12.6), 13);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u16::from_f64(70000.0), 65535);
        assert_eq!(u32::from_f64(-1.0), 0);
    }

    #[test]
    fn test_float_store_unclamped() {
        assert_eq!(f32::from_f64(1.5), 1.5f32);
        assert_eq!(f64::from_f64(-0.25), -0.25);
    }
}
