//! Round-robin distribution of items into masonry columns

use crate::error::GalleryError;

/// Split `items` into `column_count` columns, item `i` going to column
/// `i % column_count`.
///
/// The partition is stable: relative order inside each column matches
/// the input. Asking for zero or a negative number of columns is only
/// valid when there is nothing to place.
pub fn distribute<T>(items: Vec<T>, column_count: isize) -> Result<Vec<Vec<T>>, GalleryError> {
    if column_count <= 0 {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        return Err(GalleryError::InvalidColumnCount {
            count: column_count,
            items: items.len(),
        });
    }

    let count = column_count as usize;
    let per_column = items.len().div_ceil(count);
    let mut columns: Vec<Vec<T>> = (0..count).map(|_| Vec::with_capacity(per_column)).collect();

    for (index, item) in items.into_iter().enumerate() {
        columns[index % count].push(item);
    }

    Ok(columns)
}
