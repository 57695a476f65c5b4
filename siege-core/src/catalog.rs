use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::config::RequestTemplate;

/// Shared, immutable execution sequence every worker iterates over.
pub(crate) type Sequence = Arc<[Arc<RequestTemplate>]>;

/// Expands each template into `repeat` single-shot instances, concatenated in
/// input order, then uniformly shuffled.
///
/// The result length is always the sum of the repeat counts; the shuffle only
/// permutes instance order. Called once per run, the sequence is then shared
/// read-only across all workers.
pub fn build_sequence(templates: &[RequestTemplate]) -> Vec<Arc<RequestTemplate>> {
    build_sequence_with(templates, &mut rand::rng())
}

/// [`build_sequence`] with a caller-provided RNG, deterministic for a fixed
/// seed.
pub fn build_sequence_with<R: Rng + ?Sized>(
    templates: &[RequestTemplate],
    rng: &mut R,
) -> Vec<Arc<RequestTemplate>> {
    let total: usize = templates.iter().map(|t| t.repeat as usize).sum();
    let mut out = Vec::with_capacity(total);

    for template in templates {
        for _ in 0..template.repeat {
            out.push(Arc::new(RequestTemplate {
                repeat: 1,
                ..template.clone()
            }));
        }
    }

    out.shuffle(rng);
    out
}
