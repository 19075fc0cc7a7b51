use fnv::FnvBuildHasher;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

// Keys here are grid coordinates and visual handles, short enough for fnv to
// beat the default hasher.
pub type FnvHashSet<T> = HashSet<T, FnvBuildHasher>;
pub type FnvHashMap<K, V> = HashMap<K, V, FnvBuildHasher>;

pub fn fnv_hashset<T: Hash + Eq>(capacity: usize) -> FnvHashSet<T> {
    FnvHashSet::with_capacity_and_hasher(capacity, FnvBuildHasher::default())
}

pub fn fnv_hashmap<K: Hash + Eq, V>(capacity: usize) -> FnvHashMap<K, V> {
    FnvHashMap::with_capacity_and_hasher(capacity, FnvBuildHasher::default())
}
