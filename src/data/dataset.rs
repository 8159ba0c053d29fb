// ============================================================
// Layer 4 — Translation Dataset
// ============================================================
// Turns sentence pairs into fixed-length token-id triples and
// exposes them through Burn's Dataset trait so the DataLoader
// can enumerate them (random-access, shuffled sampling).
//
// Each item carries three sequences of exactly seq_len ids:
//
//   src_ids        source sentence, padded/truncated
//   tar_input_ids  <s> + target        (decoder input, shifted right)
//   tar_output_ids target + </s>       (decoder labels, shifted left)
//
// Invariant: tar_input_ids and tar_output_ids are a one-position
// shift of the same underlying target sequence.
//
// Reference: Burn Book §4 (Datasets)

use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::sentence_pair::SentencePair;
use crate::infra::vocab::Vocab;

/// One fully tokenised, padded training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationItem {
    pub src_ids:        Vec<u32>,
    pub tar_input_ids:  Vec<u32>,
    pub tar_output_ids: Vec<u32>,
}

pub struct TranslationDataset {
    items: Vec<TranslationItem>,
}

impl TranslationDataset {
    /// Encode every pair with the two vocabularies at a fixed
    /// sequence length.
    pub fn from_pairs(
        pairs:     &[SentencePair],
        src_vocab: &Vocab,
        tar_vocab: &Vocab,
        seq_len:   usize,
    ) -> Result<Self> {
        let mut items = Vec::with_capacity(pairs.len());
        for pair in pairs {
            items.push(encode_pair(pair, src_vocab, tar_vocab, seq_len)?);
        }
        Ok(Self { items })
    }

    pub fn from_items(items: Vec<TranslationItem>) -> Self {
        Self { items }
    }
}

impl Dataset<TranslationItem> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

fn encode_pair(
    pair:      &SentencePair,
    src_vocab: &Vocab,
    tar_vocab: &Vocab,
    seq_len:   usize,
) -> Result<TranslationItem> {
    let src_ids = pad_or_truncate(src_vocab.encode(&pair.source)?, seq_len, src_vocab.pad_id());

    // The target body may use at most seq_len - 1 ids so that both
    // the <s> prefix and the </s> suffix fit.
    let mut tar_ids = tar_vocab.encode(&pair.target)?;
    tar_ids.truncate(seq_len.saturating_sub(1));

    let mut tar_input = Vec::with_capacity(seq_len);
    tar_input.push(tar_vocab.bos_id());
    tar_input.extend_from_slice(&tar_ids);
    let tar_input = pad_or_truncate(tar_input, seq_len, tar_vocab.pad_id());

    let mut tar_output = tar_ids;
    tar_output.push(tar_vocab.eos_id());
    let tar_output = pad_or_truncate(tar_output, seq_len, tar_vocab.pad_id());

    Ok(TranslationItem { src_ids, tar_input_ids: tar_input, tar_output_ids: tar_output })
}

/// Fix a sequence to exactly `seq_len` ids.
pub fn pad_or_truncate(mut ids: Vec<u32>, seq_len: usize, pad_id: u32) -> Vec<u32> {
    ids.truncate(seq_len);
    ids.resize(seq_len, pad_id);
    ids
}
