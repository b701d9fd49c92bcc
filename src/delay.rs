use crate::error::{CatResult, Error};

/// Shortest delay a frame gets. Zero-length frames are shown for this long.
pub const MIN_DELAY_MS: u16 = 10;

/// Converts a delay of `num`/`den` seconds to whole milliseconds.
///
/// Rounds half to even, using exact integer arithmetic. A result of 0 becomes [`MIN_DELAY_MS`].
/// Fails if `den` is 0, either value is negative, or the result doesn't fit in `u16`.
pub fn quantize(num: i64, den: i64) -> CatResult<u16> {
    if num < 0 || den <= 0 {
        return Err(Error::InvalidDelay(num, den));
    }
    let scaled = i128::from(num) * 1000;
    let den128 = i128::from(den);
    let (quot, rem) = (scaled / den128, scaled % den128);
    let ms = match (rem * 2).cmp(&den128) {
        std::cmp::Ordering::Less => quot,
        std::cmp::Ordering::Greater => quot + 1,
        std::cmp::Ordering::Equal => quot + (quot & 1),
    };
    let ms = u16::try_from(ms).map_err(|_| Error::InvalidDelay(num, den))?;
    Ok(if ms == 0 { MIN_DELAY_MS } else { ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_and_fractional_seconds() {
        assert_eq!(quantize(1, 1).unwrap(), 1000);
        assert_eq!(quantize(1, 100).unwrap(), 10);
        assert_eq!(quantize(1, 30).unwrap(), 33);
        assert_eq!(quantize(2, 30).unwrap(), 67);
        assert_eq!(quantize(65535, 1000).unwrap(), 65535);
    }

    #[test]
    fn zero_is_floored() {
        assert_eq!(quantize(0, 1).unwrap(), MIN_DELAY_MS);
        assert_eq!(quantize(1, 3000).unwrap(), MIN_DELAY_MS);
        // 0.67 ms rounds up to 1 ms, which is not floored
        assert_eq!(quantize(1, 1500).unwrap(), 1);
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(quantize(1, 2000).unwrap(), MIN_DELAY_MS); // 0.5 ms -> 0 -> floor
        assert_eq!(quantize(3, 2000).unwrap(), 2); // 1.5
        assert_eq!(quantize(5, 2000).unwrap(), 2); // 2.5
        assert_eq!(quantize(7, 2000).unwrap(), 4); // 3.5
        assert_eq!(quantize(1, 16).unwrap(), 62); // 62.5
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(quantize(1, 0), Err(Error::InvalidDelay(1, 0))));
        assert!(matches!(quantize(-1, 10), Err(Error::InvalidDelay(..))));
        assert!(matches!(quantize(1, -10), Err(Error::InvalidDelay(..))));
        assert!(matches!(quantize(66, 1), Err(Error::InvalidDelay(66, 1))));
    }
}
