//! Order-preserving batching.

/// Splits `items` left to right into groups of `size`; the last group may be
/// shorter. Empty input yields no groups. A `size` of zero is treated as one.
///
/// ```rust
/// use core_sync::chunk::chunks;
///
/// assert_eq!(chunks(&[1, 2, 3, 4, 5], 2), vec![vec![1, 2], vec![3, 4], vec![5]]);
/// assert!(chunks::<u8>(&[], 20).is_empty());
/// ```
pub fn chunks<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}
