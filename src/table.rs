use std::cmp::min;
use std::ops::{Index, IndexMut};

use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
    refs: u32,
    occupied: bool,
}

impl<T> Entry<T> {
    /// Create a new cell with the given value.
    pub fn new(value: T) -> Self {
        Self {
            value,
            next: 0,
            refs: 0,
            occupied: false,
        }
    }
}

impl<T> Default for Entry<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// A hash-consing arena.
///
/// Cells are addressed by integer index (0 is a sentry and never used).
/// The bucket chains guarantee that [`Table::put`] returns the index of the
/// already existing equal value, if any. Each cell carries an explicit
/// reference count; freed cells are recycled through the `min_free` scan.
pub struct Table<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Index of the first *possibly* free (non-occupied) cell.
    min_free: usize,
    /// Index of the last occupied cell.
    last_index: usize,
    /// Number of occupied cells.
    real_size: usize,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data: Vec<Entry<T>> = Vec::with_capacity(capacity);
        data.resize_with(capacity, Entry::default);
        data[0].occupied = true; // Set 0th cell as occupied (sentry).

        let buckets_bits = min(bits, 16);
        let buckets_size = 1 << buckets_bits;
        let buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;

        Self {
            data,
            buckets,
            bitmask,
            min_free: 1,
            last_index: 0,
            real_size: 0,
        }
    }
}

impl<T> Table<T> {
    /// Get the capacity of the table.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    /// Get the index of the last occupied cell.
    pub fn size(&self) -> usize {
        self.last_index
    }
    /// Get the number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    /// Check if the cell at the given index is occupied.
    pub fn is_occupied(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].occupied
    }
    /// Get the index of the next cell in the bucket chain.
    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next
    }
    /// Set the index of the next cell in the bucket chain.
    pub fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next = next;
    }

    /// Get the reference count of the cell at the given index.
    pub fn ref_count(&self, index: usize) -> u32 {
        assert!(self.is_occupied(index), "Cell {} is not occupied", index);
        self.data[index].refs
    }

    /// Increment the reference count of the cell at the given index.
    pub fn inc_ref(&mut self, index: usize) -> u32 {
        assert!(self.is_occupied(index), "Cell {} is not occupied", index);
        self.data[index].refs += 1;
        self.data[index].refs
    }

    /// Decrement the reference count of the cell at the given index
    /// and return the new count.
    pub fn dec_ref(&mut self, index: usize) -> u32 {
        assert!(self.is_occupied(index), "Cell {} is not occupied", index);
        assert!(
            self.data[index].refs > 0,
            "Cell {} has zero reference count",
            index
        );
        self.data[index].refs -= 1;
        self.data[index].refs
    }

    /// Allocate a new cell in the table and return its index.
    pub(crate) fn alloc(&mut self) -> usize {
        let index = (self.min_free..=self.last_index)
            .find(|&i| !self.is_occupied(i))
            .unwrap_or_else(|| {
                self.last_index += 1;
                self.last_index
            });

        if index >= self.capacity() {
            panic!("Storage is full");
        }

        self.data[index].occupied = true;
        self.min_free = index + 1;
        self.real_size += 1;

        index
    }

    /// Drop the value at the given index, releasing the cell for reuse.
    pub fn drop(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");

        self.data[index].occupied = false;
        self.min_free = min(self.min_free, index);
        self.real_size -= 1;
    }

    /// Add a new value to the table and return its index.
    ///
    /// The value is *not* linked into a bucket chain; use [`Table::put`]
    /// for hash-consed insertion.
    pub fn add(&mut self, value: T) -> usize {
        let index = self.alloc();

        self.data[index].value = value;
        self.data[index].next = 0;
        self.data[index].refs = 0;

        index
    }
}

impl<T> Table<T>
where
    T: MyHash,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Put a value into the table, returning its index and whether a new
    /// cell was created. If an equal value already exists, the index of the
    /// existing cell is returned instead.
    pub fn put(&mut self, value: T) -> (usize, bool)
    where
        T: Eq,
    {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            // Create new node and put it into the bucket.
            let i = self.add(value);
            self.buckets[bucket_index] = i;
            return (i, true);
        }

        loop {
            assert!(index > 0);

            if &value == self.value(index) {
                // The node already exists.
                return (index, false);
            }

            let next = self.next(index);

            if next == 0 {
                // Create new node and append it to the bucket.
                let i = self.add(value);
                self.set_next(index, i);
                return (i, true);
            } else {
                // Go to the next node in the bucket.
                index = next;
            }
        }
    }

    /// Remove the value at the given index, unlinking it from its bucket
    /// chain and releasing the cell for reuse.
    pub fn remove(&mut self, index: usize) {
        assert!(self.is_occupied(index), "Cell {} is not occupied", index);

        let bucket_index = self.bucket_index(&self.data[index].value);
        let mut i = self.buckets[bucket_index];
        assert_ne!(i, 0, "Cell {} is not in its bucket", index);

        if i == index {
            self.buckets[bucket_index] = self.next(index);
        } else {
            while self.next(i) != index {
                i = self.next(i);
                assert_ne!(i, 0, "Cell {} is not in its bucket", index);
            }
            self.set_next(i, self.next(index));
        }

        self.drop(index);
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}

impl<T> IndexMut<usize> for Table<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        assert_ne!(index, 0, "Index is 0");
        &mut self.data[index].value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc() {
        let mut storage = Table::<()>::new(2);
        assert_eq!(storage.alloc(), 1);
        assert_eq!(storage.alloc(), 2);
        assert_eq!(storage.alloc(), 3);
    }

    #[test]
    #[should_panic(expected = "Storage is full")]
    fn test_alloc_too_much() {
        let mut storage = Table::<()>::new(2);
        assert_eq!(storage.alloc(), 1);
        assert_eq!(storage.alloc(), 2);
        assert_eq!(storage.alloc(), 3);
        storage.alloc();
    }

    #[test]
    fn test_add() {
        let mut table = Table::new(2);
        let index = table.add(42);
        assert_eq!(table[index], 42);
        assert_eq!(table.next(index), 0);
    }

    #[test]
    fn test_drop() {
        let mut storage = Table::new(2);
        let index = storage.add(42);
        assert!(storage.is_occupied(index));
        storage.drop(index);
        assert!(!storage.is_occupied(index));
    }

    #[test]
    fn test_ref_counts() {
        let mut storage = Table::new(2);
        let index = storage.add(42);
        assert_eq!(storage.ref_count(index), 0);
        assert_eq!(storage.inc_ref(index), 1);
        assert_eq!(storage.inc_ref(index), 2);
        assert_eq!(storage.dec_ref(index), 1);
        assert_eq!(storage.dec_ref(index), 0);
    }

    #[test]
    #[should_panic(expected = "has zero reference count")]
    fn test_dec_ref_below_zero() {
        let mut storage = Table::new(2);
        let index = storage.add(42);
        storage.dec_ref(index);
    }

    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
    struct Item(i32);

    impl MyHash for Item {
        fn hash(&self) -> u64 {
            self.0.unsigned_abs() as u64
        }
    }

    #[test]
    fn test_put() {
        let mut storage = Table::new(2);
        let (index1, created1) = storage.put(Item(5));
        let (index2, created2) = storage.put(Item(-5));
        let (index3, created3) = storage.put(Item(5));
        assert_ne!(index1, index2);
        assert_eq!(index1, index3);
        assert!(created1);
        assert!(created2);
        assert!(!created3);
        assert_eq!(storage[index1], Item(5));
        assert_eq!(storage[index2], Item(-5));
        assert_eq!(storage.next(index1), index2);
    }

    #[test]
    fn test_remove_relinks_bucket() {
        let mut storage = Table::new(3);
        // All three items collide in the same bucket.
        let (i1, _) = storage.put(Item(1));
        let (i2, _) = storage.put(Item(-1));
        storage.remove(i1);
        assert!(!storage.is_occupied(i1));
        // The survivor is still found, and the freed cell is recycled.
        let (i2b, created) = storage.put(Item(-1));
        assert_eq!(i2, i2b);
        assert!(!created);
        let (i3, created) = storage.put(Item(1));
        assert!(created);
        assert_eq!(i3, i1);
    }
}
