// ============================================================
// Layer 5 — Machine Learning
// ============================================================
// Everything that touches Burn tensors at training or inference
// time lives here:
//
//   schedule    teacher-forcing ratio schedules
//   model       GRU encoder-decoder (Seq2Seq)
//   metrics     pad-masked loss / accuracy / perplexity
//   bleu        n-gram precision scoring
//   trainer     the training loop
//   translator  checkpoint restore + greedy / beam decoding
//
// The trainer and translator are generic over the backend; the
// binary instantiates them on WGPU, the tests on NdArray.

/// Teacher-forcing ratio schedules
pub mod schedule;

/// GRU encoder-decoder model
pub mod model;

/// Batch-level loss / accuracy / perplexity
pub mod metrics;

/// BLEU n-gram precision
pub mod bleu;

/// Training loop
pub mod trainer;

/// Inference driver
pub mod translator;
