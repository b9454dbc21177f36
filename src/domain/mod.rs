// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the system works with:
// word pairs and the character alphabets built from them.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums and traits

// Character <-> index vocabulary with reserved markers
pub mod alphabet;

// A source/target word pair
pub mod word_pair;

// Abstractions implemented by the data and application layers
pub mod traits;
