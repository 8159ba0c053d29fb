// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Manages the source and target vocabularies as HuggingFace
// tokenizer JSON artifacts. Loading order:
//
//   1. {dir}/src_tokenizer.json / {dir}/tar_tokenizer.json
//   2. fallback: rebuild a WordLevel vocab from the raw corpus
//      files and save the artifact for next time
//   3. if that also fails → VocabularyLoad (fatal)
//
// The tokenizer JSON is written directly in the format
// Tokenizer::from_file() expects, with the special tokens at
// fixed low ids:
//
//   <pad> = 0    padding
//   <s>   = 1    start of sequence (decoder bootstrap)
//   </s>  = 2    end of sequence (decoding stops here)
//   <unk> = 3    out-of-vocabulary words

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::error::TranslateError;

pub const PAD_TOKEN: &str = "<pad>";
pub const BOS_TOKEN: &str = "<s>";
pub const EOS_TOKEN: &str = "</s>";
pub const UNK_TOKEN: &str = "<unk>";

// ─── Vocab ────────────────────────────────────────────────────────────────────
/// One side's vocabulary: a tokenizer plus the resolved ids of the
/// special tokens the trainer and translator need constantly.
#[derive(Debug)]
pub struct Vocab {
    tokenizer: Tokenizer,
    pad:       u32,
    bos:       u32,
    eos:       u32,
}

impl Vocab {
    /// Wrap a loaded tokenizer, resolving the special-token ids.
    /// Fails if any special token is missing from the vocabulary.
    pub fn from_tokenizer(tokenizer: Tokenizer, origin: &Path) -> Result<Self> {
        let lookup = |name: &str| -> Result<u32> {
            tokenizer.token_to_id(name).ok_or_else(|| {
                TranslateError::VocabularyLoad {
                    path:   origin.to_path_buf(),
                    reason: format!("special token '{name}' missing from vocabulary"),
                }
                .into()
            })
        };
        let pad = lookup(PAD_TOKEN)?;
        let bos = lookup(BOS_TOKEN)?;
        let eos = lookup(EOS_TOKEN)?;
        Ok(Self { tokenizer, pad, bos, eos })
    }

    /// Build a small in-memory vocabulary from a word list.
    /// Words get ids 4, 5, ... after the four special tokens.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let json = word_level_json(words.into_iter().map(|w| w.as_ref().to_string()));
        let tokenizer = Tokenizer::from_bytes(serde_json::to_vec(&json)?)
            .map_err(|e| anyhow::anyhow!("cannot build in-memory tokenizer: {e}"))?;
        Self::from_tokenizer(tokenizer, Path::new("<memory>"))
    }

    /// Tokenize a sentence into ids. Unknown words map to <unk>.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("tokenise '{text}': {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    /// Look up the surface form of one token id.
    pub fn decode_piece(&self, id: u32) -> String {
        self.tokenizer
            .id_to_token(id)
            .unwrap_or_else(|| UNK_TOKEN.to_string())
    }

    /// Turn a decoded id sequence back into text, stopping at the
    /// first </s> and skipping <pad> and <s>.
    pub fn decode_sequence(&self, ids: &[u32]) -> String {
        let mut words = Vec::new();
        for &id in ids {
            if id == self.eos {
                break;
            }
            if id == self.pad || id == self.bos {
                continue;
            }
            words.push(self.decode_piece(id));
        }
        words.join(" ")
    }

    pub fn pad_id(&self) -> u32 { self.pad }
    pub fn bos_id(&self) -> u32 { self.bos }
    pub fn eos_id(&self) -> u32 { self.eos }

    /// Total vocabulary size including special tokens.
    pub fn size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}

// ─── VocabStore ───────────────────────────────────────────────────────────────
/// Loads or rebuilds the source/target vocabulary pair.
pub struct VocabStore {
    dir:        PathBuf,
    vocab_size: usize,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>, vocab_size: usize) -> Self {
        Self { dir: dir.into(), vocab_size }
    }

    /// Load both vocabularies, rebuilding each missing one from its
    /// raw corpus file. This is the training-time entry point.
    pub fn load_or_build(
        &self,
        src_corpus: &Path,
        tar_corpus: &Path,
    ) -> Result<(Vocab, Vocab)> {
        let src = self.load_or_build_one("src_tokenizer.json", src_corpus)?;
        let tar = self.load_or_build_one("tar_tokenizer.json", tar_corpus)?;
        Ok((src, tar))
    }

    /// Load both vocabularies from saved artifacts only — no corpus
    /// fallback. This is the inference-time entry point.
    pub fn load(&self) -> Result<(Vocab, Vocab)> {
        let src = self.load_one("src_tokenizer.json")?;
        let tar = self.load_one("tar_tokenizer.json")?;
        Ok((src, tar))
    }

    fn load_one(&self, filename: &str) -> Result<Vocab> {
        let path = self.dir.join(filename);
        let tokenizer = Tokenizer::from_file(&path).map_err(|e| {
            TranslateError::VocabularyLoad {
                path:   path.clone(),
                reason: e.to_string(),
            }
        })?;
        Vocab::from_tokenizer(tokenizer, &path)
    }

    fn load_or_build_one(&self, filename: &str, corpus: &Path) -> Result<Vocab> {
        let path = self.dir.join(filename);
        if path.exists() {
            tracing::info!("Loading existing tokenizer from '{}'", path.display());
            return self.load_one(filename);
        }
        tracing::info!(
            "Tokenizer '{}' missing — rebuilding from corpus '{}'",
            path.display(),
            corpus.display()
        );
        self.build_and_save(filename, corpus)
    }

    /// Build a WordLevel vocabulary from corpus word frequencies and
    /// write the tokenizer JSON directly (teacher-style; bypasses the
    /// tokenizers trainer API entirely).
    fn build_and_save(&self, filename: &str, corpus: &Path) -> Result<Vocab> {
        let text = std::fs::read_to_string(corpus).map_err(|e| {
            TranslateError::VocabularyLoad {
                path:   corpus.to_path_buf(),
                reason: format!("corpus fallback failed: {e}"),
            }
        })?;

        // Count every whitespace word in the corpus
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for word in text.split_whitespace() {
            *freq.entry(word).or_insert(0) += 1;
        }

        // Most frequent words first; reserve 4 slots for specials
        let mut words: Vec<(&str, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        words.truncate(self.vocab_size.saturating_sub(4));

        let json = word_level_json(words.into_iter().map(|(w, _)| w.to_string()));

        std::fs::create_dir_all(&self.dir).ok();
        let path = self.dir.join(filename);
        std::fs::write(&path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("cannot write tokenizer JSON '{}'", path.display()))?;

        tracing::info!("Built vocabulary saved to '{}'", path.display());
        self.load_one(filename)
    }
}

/// Assemble a WordLevel tokenizer JSON with the fixed special tokens
/// followed by the given words.
fn word_level_json(words: impl Iterator<Item = String>) -> serde_json::Value {
    let mut vocab = serde_json::json!({
        (PAD_TOKEN): 0,
        (BOS_TOKEN): 1,
        (EOS_TOKEN): 2,
        (UNK_TOKEN): 3,
    });

    let mut next_id = 4usize;
    for word in words {
        if vocab.get(&word).is_none() {
            vocab[&word] = serde_json::json!(next_id);
            next_id += 1;
        }
    }

    serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 0, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 1, "content": BOS_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 2, "content": EOS_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 3, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": UNK_TOKEN
        }
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_vocab_has_fixed_special_ids() {
        let vocab = Vocab::from_words(["hello", "world"]).unwrap();
        assert_eq!(vocab.pad_id(), 0);
        assert_eq!(vocab.bos_id(), 1);
        assert_eq!(vocab.eos_id(), 2);
        assert_eq!(vocab.size(), 6);
    }

    #[test]
    fn encode_maps_known_and_unknown_words() {
        let vocab = Vocab::from_words(["hello", "world"]).unwrap();
        let ids = vocab.encode("hello mars").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(vocab.decode_piece(ids[0]), "hello");
        assert_eq!(vocab.decode_piece(ids[1]), UNK_TOKEN);
    }

    #[test]
    fn decode_sequence_stops_at_eos_and_skips_padding() {
        let vocab = Vocab::from_words(["hello", "world"]).unwrap();
        let hello = vocab.encode("hello").unwrap()[0];
        let world = vocab.encode("world").unwrap()[0];
        let ids = vec![
            vocab.bos_id(),
            hello,
            world,
            vocab.eos_id(),
            hello, // after </s> — must be ignored
            vocab.pad_id(),
        ];
        assert_eq!(vocab.decode_sequence(&ids), "hello world");
    }

    #[test]
    fn store_builds_from_corpus_when_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("train.src");
        std::fs::write(&corpus, "the cat\nthe dog\n").unwrap();

        let store = VocabStore::new(dir.path(), 100);
        let vocab = store.load_or_build_one("src_tokenizer.json", &corpus).unwrap();
        // "the" appears twice, so it gets the first non-special id
        assert_eq!(vocab.encode("the").unwrap(), vec![4]);
        // artifact was persisted for next time
        assert!(dir.path().join("src_tokenizer.json").exists());

        // second call loads the saved artifact
        let reloaded = store.load_or_build_one("src_tokenizer.json", &corpus).unwrap();
        assert_eq!(reloaded.encode("the").unwrap(), vec![4]);
    }

    #[test]
    fn load_without_artifact_or_corpus_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path(), 100);
        let err = store.load().unwrap_err();
        assert!(err.downcast_ref::<TranslateError>().is_some());
    }

    #[test]
    fn fallback_with_unreadable_corpus_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path(), 100);
        let err = store
            .load_or_build_one("src_tokenizer.json", Path::new("/nonexistent/corpus.src"))
            .unwrap_err();
        match err.downcast_ref::<TranslateError>() {
            Some(TranslateError::VocabularyLoad { .. }) => {}
            other => panic!("expected VocabularyLoad, got {other:?}"),
        }
    }
}
