// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec of fixed-length
// TranslationItems into [batch_size, seq_len] Int tensors. All
// items are pre-padded to the same length, so this is a flatten
// plus a reshape — no dynamic padding needed here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::TranslationItem;

// ─── TranslationBatch ─────────────────────────────────────────────────────────
/// One batch of examples ready for the model forward pass.
/// All tensors have shape [batch_size, seq_len].
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// Source token ids
    pub src_input: Tensor<B, 2, Int>,

    /// Decoder input ids (<s> + target, shifted right)
    pub tar_input: Tensor<B, 2, Int>,

    /// Decoder label ids (target + </s>, shifted left)
    pub tar_output: Tensor<B, 2, Int>,
}

// ─── TranslationBatcher ───────────────────────────────────────────────────────
/// Holds the target device so tensors land on the right backend.
#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn stack(&self, items: &[TranslationItem], field: fn(&TranslationItem) -> &[u32]) -> Tensor<B, 2, Int> {
        let batch_size = items.len();
        let seq_len = field(&items[0]).len();

        let flat: Vec<i32> = items
            .iter()
            .flat_map(|item| field(item).iter().map(|&id| id as i32))
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }
}

impl<B: Backend> Batcher<TranslationItem, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationItem>) -> TranslationBatch<B> {
        TranslationBatch {
            src_input:  self.stack(&items, |i| &i.src_ids),
            tar_input:  self.stack(&items, |i| &i.tar_input_ids),
            tar_output: self.stack(&items, |i| &i.tar_output_ids),
        }
    }
}
