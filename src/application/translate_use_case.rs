// ============================================================
// Layer 2 — TranslateUseCase
// ============================================================
// Inference workflow: restore the vocabularies and a trained
// checkpoint, then translate single sentences, whole files, or
// score a translation against a reference with BLEU.
//
// The vocabularies must already exist as saved artifacts — there
// is no corpus fallback at inference time, because rebuilding
// could silently produce different token ids than the model was
// trained with.

use anyhow::Result;

use crate::infra::{checkpoint::CheckpointManager, vocab::VocabStore};
use crate::ml::translator::{Translator, BATCH_LIMIT};

type InferBackend = burn::backend::Wgpu;

pub struct TranslateUseCase {
    translator: Translator<InferBackend>,
}

impl TranslateUseCase {
    /// Restore the translator from a checkpoint directory. `step` of
    /// None picks the most recent save point.
    pub fn new(checkpoint_dir: String, step: Option<usize>, beam_width: usize) -> Result<Self> {
        let vocab_store = VocabStore::new(&checkpoint_dir, 0);
        let (src_vocab, tar_vocab) = vocab_store.load()?;

        let ckpt_manager = CheckpointManager::new(&checkpoint_dir);
        let device = burn::backend::wgpu::WgpuDevice::default();
        let translator = Translator::load(
            &ckpt_manager,
            step,
            src_vocab,
            tar_vocab,
            beam_width,
            device,
        )?;
        Ok(Self { translator })
    }

    /// Translate a single sentence.
    pub fn translate(&self, sentence: &str) -> Result<String> {
        self.translator.translate(sentence)
    }

    /// Translate one sentence and report its BLEU score against a
    /// reference translation.
    pub fn evaluate(&self, sentence: &str, reference: &str) -> Result<(String, f64)> {
        self.translator.evaluate(sentence, reference)
    }

    /// Translate every line of a text file. Lines are fed to the
    /// translator in bounded batches.
    pub fn translate_file(&self, path: &str) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(path)?;
        let sentences: Vec<String> = text
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        let mut translated = Vec::with_capacity(sentences.len());
        for chunk in sentences.chunks(BATCH_LIMIT) {
            translated.extend(self.translator.translate_batch(chunk)?);
        }
        Ok(translated)
    }
}
