//! Viewport math.

/// First visible row for a cursor at `row` in a buffer of `len` lines shown
/// through a window of `window` rows.
///
/// The cursor sits in the middle of the window where possible; the result is
/// clamped to `[0, len - window]`, and is 0 when the whole buffer fits.
pub fn start(row: usize, len: usize, window: usize) -> usize {
    if len <= window {
        return 0;
    }
    row.saturating_sub(window / 2).min(len - window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_buffer_starts_at_zero() {
        assert_eq!(start(3, 5, 20), 0);
    }

    #[test]
    fn test_cursor_is_centered() {
        assert_eq!(start(50, 100, 20), 40);
    }

    #[test]
    fn test_clamped_at_end() {
        assert_eq!(start(99, 100, 20), 80);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cursor_row_is_always_visible(len in 1usize..500, window in 1usize..60, seed in 0usize..500) {
                let row = seed % len;
                let top = start(row, len, window);
                prop_assert!(top <= row);
                prop_assert!(row < top + window);
                prop_assert!(top + window.min(len) <= len);
            }
        }
    }
}
