use crate::error::{Result, SonoSceneError};
use ndarray::{Array2, Array3};

/// Binary masks marking where each source dominates a mixture.
///
/// `spectrograms[i]` is the magnitude of source `i` (all the same shape). The result has
/// shape `[sources, bins, frames]` with a 1 wherever source `i` is strictly louder than
/// every other source, so ties leave every mask at 0. A lone source owns every cell.
pub fn dominance_masks(spectrograms: &[Array2<f32>]) -> Result<Array3<f32>> {
    let Some(first) = spectrograms.first() else {
        return Err(SonoSceneError::InvalidArgument(
            "Dominance masks need at least one spectrogram".to_string(),
        ));
    };
    let (bins, frames) = first.dim();
    if let Some(bad) = spectrograms.iter().find(|s| s.dim() != (bins, frames)) {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Spectrogram shapes differ: {:?} vs {:?}",
            first.dim(),
            bad.dim()
        )));
    }

    let count = spectrograms.len();
    let mut masks = Array3::<f32>::zeros((count, bins, frames));
    if count == 1 {
        masks.fill(1.0);
        return Ok(masks);
    }

    for f in 0..bins {
        for t in 0..frames {
            for (i, spec) in spectrograms.iter().enumerate() {
                let value = spec[[f, t]];
                let dominates = spectrograms
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .all(|(_, other)| value > other[[f, t]]);
                if dominates {
                    masks[[i, f, t]] = 1.0;
                }
            }
        }
    }
    Ok(masks)
}
