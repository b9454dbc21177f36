// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Only used when the corpus ships without a separate validation
// file: the training pairs are shuffled and a fraction is held
// back for validation.
//
// The shuffle is seeded so that a rerun with the same --seed
// gets the same split (and therefore comparable val metrics).

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation),
/// where `train_fraction` of the samples (rounded) go to training.
pub fn split_train_val<T>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    seed:           u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}
