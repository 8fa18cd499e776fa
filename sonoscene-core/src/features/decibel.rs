use ndarray::Array2;

/// What 0 dB corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbReference {
    /// Absolute scale, 0 dB at power 1.0
    #[default]
    Unit,
    /// Relative scale, 0 dB at the loudest cell of the spectrogram
    Max,
}

/// Power-to-decibel conversion settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecibelConfig {
    pub reference: DbReference,
    /// Smallest power considered, avoids `log10(0)`
    pub amin: f32,
    /// Dynamic range kept below the loudest cell, `None` keeps everything
    pub top_db: Option<f32>,
}

impl Default for DecibelConfig {
    fn default() -> Self {
        Self {
            reference: DbReference::Unit,
            amin: 1e-10,
            top_db: Some(80.0),
        }
    }
}

/// Convert a power spectrogram to decibels.
///
/// `10 * log10(max(amin, S)) - 10 * log10(max(amin, ref))`, then floored at
/// `max - top_db` when a dynamic range is set.
pub fn power_to_db(power: &Array2<f32>, config: &DecibelConfig) -> Array2<f32> {
    let amin = config.amin.max(f32::MIN_POSITIVE);
    let reference = match config.reference {
        DbReference::Unit => 1.0,
        DbReference::Max => power.iter().copied().fold(0.0f32, f32::max),
    };
    let ref_db = 10.0 * reference.max(amin).log10();

    let mut db = power.mapv(|p| 10.0 * p.max(amin).log10() - ref_db);

    if let Some(top_db) = config.top_db {
        let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if peak.is_finite() {
            let floor = peak - top_db;
            db.mapv_inplace(|v| v.max(floor));
        }
    }
    db
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_unit_reference() {
        let power = array![[1.0f32, 10.0], [100.0, 0.0]];
        let config = DecibelConfig {
            top_db: None,
            ..Default::default()
        };
        let db = power_to_db(&power, &config);
        assert!((db[[0, 0]] - 0.0).abs() < 1e-5);
        assert!((db[[0, 1]] - 10.0).abs() < 1e-5);
        assert!((db[[1, 0]] - 20.0).abs() < 1e-5);
        // amin floor: 10 * log10(1e-10)
        assert!((db[[1, 1]] + 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_max_reference_peaks_at_zero() {
        let power = array![[0.5f32, 2.0], [0.02, 1.0]];
        let config = DecibelConfig {
            reference: DbReference::Max,
            top_db: None,
            ..Default::default()
        };
        let db = power_to_db(&power, &config);
        assert!(db[[0, 1]].abs() < 1e-5);
        assert!(db.iter().all(|&v| v <= 1e-5));
        assert!((db[[1, 0]] + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_top_db_floor() {
        let power = array![[1.0f32, 1e-12]];
        let db = power_to_db(&power, &DecibelConfig::default());
        assert!((db[[0, 0]] - 0.0).abs() < 1e-5);
        assert!((db[[0, 1]] + 80.0).abs() < 1e-4);
    }
}
