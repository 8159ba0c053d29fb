// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Orchestrates epochs over the training data in a fixed cadence:
//
//   per batch (strictly sequential, one global step each):
//     1. teacher-forcing ratio from the precomputed schedule,
//        indexed by global step
//     2. forward pass at that ratio
//     3. loss / accuracy / perplexity from the metric aggregator
//     4. step % train_log_interval == 0 → train metric event
//     5. step % val_log_interval   == 0 → full validation pass
//        (inner backend, no autodiff) + one sample translation
//        scored with BLEU → validation metric event
//     6. step % checkpoint_interval == 0 → checkpoint save
//     7. backward pass, Adam update, step += 1
//
// The cancellation token is polled at batch boundaries only; when
// set, the current state is checkpointed and Interrupted returned.
// Any other error propagates immediately — a failed batch is never
// retried.
//
// Generic over the autodiff backend: the binary trains on WGPU,
// the tests on NdArray. The device is threaded through explicitly.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TranslationBatch, TranslationBatcher},
    dataset::TranslationDataset,
};
use crate::domain::metric_event::MetricEvent;
use crate::domain::traits::MetricSink;
use crate::error::TranslateError;
use crate::infra::checkpoint::{CheckpointManager, CheckpointMeta};
use crate::infra::interrupt::CancelToken;
use crate::infra::vocab::Vocab;
use crate::ml::bleu::n_gram_precision;
use crate::ml::metrics::{self, RunningMetrics};
use crate::ml::model::{RnnSpec, Seq2Seq};
use crate::ml::schedule::{schedule_for, teacher_forcing_schedule, LearningMethod};

/// Fixed shuffle seed so runs starting from the same state are
/// reproducible.
const SHUFFLE_SEED: u64 = 42;

/// Summary of a completed (uninterrupted) training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOutcome {
    pub steps_run:           usize,
    pub checkpoints_written: usize,
}

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Binary entry point: train on the default WGPU device.
#[allow(clippy::too_many_arguments)]
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: TranslationDataset,
    val_dataset:   TranslationDataset,
    encoder_spec:  RnnSpec,
    decoder_spec:  RnnSpec,
    src_vocab:     &Vocab,
    tar_vocab:     &Vocab,
    ckpt_manager:  &CheckpointManager,
    sink:          &mut dyn MetricSink,
    cancel:        &CancelToken,
) -> Result<TrainOutcome> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(
        cfg,
        train_dataset,
        val_dataset,
        encoder_spec,
        decoder_spec,
        src_vocab,
        tar_vocab,
        ckpt_manager,
        sink,
        cancel,
        device,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: TranslationDataset,
    val_dataset:   TranslationDataset,
    encoder_spec:  RnnSpec,
    decoder_spec:  RnnSpec,
    src_vocab:     &Vocab,
    tar_vocab:     &Vocab,
    ckpt_manager:  &CheckpointManager,
    sink:          &mut dyn MetricSink,
    cancel:        &CancelToken,
    device:        B::Device,
) -> Result<TrainOutcome> {
    use burn::data::dataset::Dataset;

    // ── Validate configuration ────────────────────────────────────────────────
    // The batch size and every cadence divide the step counter; a
    // zero is a misconfiguration, rejected before any state exists.
    for (name, value) in [
        ("batch_size", cfg.batch_size),
        ("train_log_interval", cfg.train_log_interval),
        ("val_log_interval", cfg.val_log_interval),
        ("checkpoint_interval", cfg.checkpoint_interval),
    ] {
        anyhow::ensure!(value != 0, "{name} must be nonzero");
    }

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Seq2Seq<B> = Seq2Seq::new(
        encoder_spec.init_encoder(&device),
        decoder_spec.init_decoder(&device),
        cfg.seq_len,
    );
    tracing::info!(
        "Model ready: encoder {}x{}, decoder {}x{}",
        encoder_spec.n_layers,
        encoder_spec.rnn_dim,
        decoder_spec.n_layers,
        decoder_spec.rnn_dim,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let batches_per_epoch = div_ceil(train_dataset.len(), cfg.batch_size);
    let total_steps = cfg.epochs * batches_per_epoch;

    let train_batcher = TranslationBatcher::<B>::new(device.clone());
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(SHUFFLE_SEED)
        .num_workers(1)
        .build(train_dataset);

    // Validation runs read-only on the inner backend (no autodiff).
    let val_batcher = TranslationBatcher::<B::InnerBackend>::new(device.clone());
    let val_loader = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    // ── Teacher-forcing schedules ─────────────────────────────────────────────
    // The training schedule fails fast on an unknown method name,
    // before any state is touched. Validation always runs fully
    // forced, on its own coarser schedule.
    let train_ratios = schedule_for(&cfg.learning_method, total_steps)?;
    let val_ratios = teacher_forcing_schedule(
        LearningMethod::TeacherForcing,
        total_steps / 100 + 1,
    );

    let pad_id = decoder_spec.pad_id as u32;
    let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
    let mut step = 0usize;
    let mut checkpoints_written = 0usize;

    let make_meta = |epoch: usize, step: usize| CheckpointMeta {
        epoch,
        steps: step,
        seq_len: cfg.seq_len,
        encoder_parameter: encoder_spec.clone(),
        decoder_parameter: decoder_spec.clone(),
    };

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..cfg.epochs {
        for (iter, batch) in train_loader.iter().enumerate() {
            // interrupts are honored here, between batches only
            if cancel.is_cancelled() {
                ckpt_manager.save(&model, optim.to_record(), &make_meta(epoch, step))?;
                return Err(TranslateError::Interrupted { epoch, step }.into());
            }

            let ratio = train_ratios[step];
            let output = model.forward(
                batch.src_input.clone(),
                batch.tar_input.clone(),
                ratio,
                &mut rng,
            );
            let score = metrics::score(output.logits, batch.tar_output.clone(), pad_id);
            if score.degenerate {
                tracing::warn!("All-padding target batch at step {step}; accuracy reported as 0");
            }

            // Training log cadence
            if step % cfg.train_log_interval == 0 {
                sink.record(&MetricEvent::Train {
                    step,
                    loss:       score.loss_value,
                    accuracy:   score.accuracy,
                    perplexity: score.perplexity,
                })?;
                println!(
                    "[Train] epoch : {epoch:2}  iter: {iter:4}/{batches_per_epoch:4}  \
                     step : {step:6}/{total_steps:6}  =>  loss : {loss:10.6}  \
                     accuracy : {accuracy:12.6}  PPL : {ppl:.6}",
                    loss = score.loss_value,
                    accuracy = score.accuracy,
                    ppl = score.perplexity,
                );
            }

            // Validation cadence (suspends training mode for its duration)
            if step % cfg.val_log_interval == 0 {
                let val_index = (step / cfg.val_log_interval).min(val_ratios.len() - 1);
                let val_model = model.valid();
                let (loss, accuracy, perplexity, bleu) = validate(
                    &val_model,
                    &val_loader,
                    val_ratios[val_index],
                    pad_id,
                    src_vocab,
                    tar_vocab,
                    &mut rng,
                )?;
                sink.record(&MetricEvent::Validation {
                    step,
                    loss,
                    accuracy,
                    perplexity,
                    bleu,
                })?;
                println!(
                    "[Val]   epoch : {epoch:2}  iter: {iter:4}/{batches_per_epoch:4}  \
                     step : {step:6}/{total_steps:6}  =>  loss : {loss:10.6}  \
                     accuracy : {accuracy:12.6}  PPL : {perplexity:.6}",
                );
            }

            // Checkpoint cadence
            if step % cfg.checkpoint_interval == 0 {
                ckpt_manager.save(&model, optim.to_record(), &make_meta(epoch, step))?;
                checkpoints_written += 1;
            }

            // Backward pass + Adam update
            let grads = score.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
            step += 1;
        }
    }

    tracing::info!("Training complete: {step} steps, {checkpoints_written} checkpoints");
    Ok(TrainOutcome { steps_run: step, checkpoints_written })
}

/// One full pass over the validation set. Returns the unweighted
/// batch-mean loss / accuracy / perplexity plus the BLEU score of
/// one illustrative sentence from the final batch.
fn validate<B: Backend>(
    model:     &Seq2Seq<B>,
    loader:    &Arc<dyn DataLoader<TranslationBatch<B>>>,
    ratio:     f64,
    pad_id:    u32,
    src_vocab: &Vocab,
    tar_vocab: &Vocab,
    rng:       &mut impl Rng,
) -> Result<(f64, f64, f64, f64)> {
    let mut running = RunningMetrics::new();
    let mut last: Option<(Tensor<B, 3>, TranslationBatch<B>)> = None;

    for batch in loader.iter() {
        let output = model.forward(
            batch.src_input.clone(),
            batch.tar_input.clone(),
            ratio,
            rng,
        );
        let score = metrics::score(output.logits.clone(), batch.tar_output.clone(), pad_id);
        running.record(score.loss_value, score.accuracy, score.perplexity);
        last = Some((output.logits, batch));
    }

    let (loss, accuracy, perplexity) = running.finish();

    // One illustrative translation from the last batch, scored with
    // BLEU against its reference.
    let bleu = match last {
        None => 0.0,
        Some((logits, batch)) => {
            let [_, seq_len, vocab] = logits.dims();
            let predicted_ids = tensor_row_argmax(logits, seq_len, vocab);
            let predicted = tar_vocab.decode_sequence(&predicted_ids);
            let reference = tar_vocab.decode_sequence(&tensor_row(batch.tar_output));
            let source = src_vocab.decode_sequence(&tensor_row(batch.src_input));
            let bleu = n_gram_precision(&predicted, &reference);

            println!("Source    : {source}");
            println!("Predicted : {predicted}");
            println!("Target    : {reference}");
            println!("BLEU Score: {bleu:.6}");
            bleu
        }
    };

    Ok((loss, accuracy, perplexity, bleu))
}

/// First row of a [batch, seq_len] Int tensor as plain ids.
fn tensor_row<B: Backend>(tensor: Tensor<B, 2, Int>) -> Vec<u32> {
    let [_, seq_len] = tensor.dims();
    tensor
        .slice([0..1, 0..seq_len])
        .reshape([seq_len])
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .unwrap_or_default()
        .into_iter()
        .map(|id| id as u32)
        .collect()
}

/// Greedy ids for the first sequence of a [batch, seq_len, vocab]
/// logits tensor.
fn tensor_row_argmax<B: Backend>(logits: Tensor<B, 3>, seq_len: usize, vocab: usize) -> Vec<u32> {
    logits
        .slice([0..1, 0..seq_len, 0..vocab])
        .reshape([seq_len, vocab])
        .argmax(1)
        .reshape([seq_len])
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .unwrap_or_default()
        .into_iter()
        .map(|id| id as u32)
        .collect()
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}
