//! Hash containers with a deterministic hasher, so that pipeline passes
//! iterate in the same order on every run.

use fnv::FnvBuildHasher;

/// [`std::collections::HashMap`] that defaults to a deterministic hasher.
pub type HashMap<K, V, Hasher = FnvBuildHasher> = std::collections::HashMap<K, V, Hasher>;
/// [`std::collections::HashSet`] that defaults to a deterministic hasher.
pub type HashSet<K, Hasher = FnvBuildHasher> = std::collections::HashSet<K, Hasher>;
