use crate::migration::error::{MigrationError, MigrationResult};

/// Resources per asset bundle export
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Split `items` into consecutive chunks of at most `size`, keeping order.
/// Only the last chunk may be shorter.
pub fn batch<T: Clone>(items: &[T], size: usize) -> MigrationResult<Vec<Vec<T>>> {
    if size == 0 {
        return Err(MigrationError::InvalidInput(
            "batch size must be greater than zero".to_string(),
        ));
    }

    Ok(items.chunks(size).map(|c| c.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_sizes() {
        let items: Vec<usize> = (0..250).collect();
        let batches = batch(&items, 100).unwrap();

        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(batches.concat(), items);
    }

    #[test]
    fn test_batch_count_is_ceiling() {
        for (len, size) in [(0, 3), (1, 3), (3, 3), (4, 3), (10, 1), (7, 100)] {
            let items: Vec<usize> = (0..len).collect();
            let batches = batch(&items, size).unwrap();

            assert_eq!(batches.len(), len.div_ceil(size), "len={} size={}", len, size);
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
            assert_eq!(batches.concat(), items);
        }
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = batch(&[1, 2, 3], 0).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidInput(_)));
    }
}
