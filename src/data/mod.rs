/// Data layer: core types, loading, and `.npy` storage.
///
/// Architecture:
/// ```text
///  version0001.txt .. versionNNNN.txt
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse each file → VcgTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ VcgCollection │  Vec<VcgTable>, lengths()
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   npy     │  vcg_length.npy + vcg.npy
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod npy;
