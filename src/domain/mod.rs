// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits defining the core concepts of
// the translation system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - NO ML-specific code
//   - Only plain Rust structs, enums, and traits
//
// This layer defines what things ARE, not how they work.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A source/target sentence pair from the parallel corpus
pub mod sentence_pair;

// Metric events emitted by the training loop
pub mod metric_event;

// Core abstractions (traits) that other layers implement
pub mod traits;
