use super::{ATTENUATION_ALPHA, SPEED_OF_SOUND, SoundSource};
use crate::config::{NearFieldPolicy, RenderOptions};
use crate::error::{Result, SonoSceneError};
use crate::math::DVec3;

/// Whole-sample delay before a source is heard at `distance` meters.
///
/// `floor(sample_rate * (start_time + distance / SPEED_OF_SOUND))`
pub fn delay_samples(sample_rate: u32, start_time: f64, distance: f64) -> usize {
    let seconds = start_time + distance / SPEED_OF_SOUND;
    (sample_rate as f64 * seconds).floor().max(0.0) as usize
}

/// Amplitude factor applied to a source heard at `distance` meters.
///
/// # Errors
///
/// [`SonoSceneError::Domain`] if geometric attenuation is enabled, the distance is zero
/// and the near-field policy is [`NearFieldPolicy::Reject`].
pub fn attenuation_gain(distance: f64, options: &RenderOptions) -> Result<f64> {
    let mut gain = 1.0;

    if options.geometric_attenuation {
        let effective = match options.near_field {
            NearFieldPolicy::Reject => {
                if distance <= 0.0 {
                    return Err(SonoSceneError::Domain(
                        "Source coincides with a microphone; inverse-square attenuation is \
                         undefined at zero distance"
                            .to_string(),
                    ));
                }
                distance
            }
            NearFieldPolicy::Clamp { min_distance } => {
                if distance < min_distance {
                    log::warn!(
                        "Source {:.4} m from microphone, attenuating as if at {:.4} m",
                        distance,
                        min_distance
                    );
                }
                distance.max(min_distance)
            }
        };
        gain /= effective * effective;
    }

    if options.atmospheric_attenuation {
        gain *= (-ATTENUATION_ALPHA * distance).exp();
    }

    Ok(gain)
}

/// What `source` sounds like at `mic_position` over the first `total_samples` samples.
///
/// The waveform is shifted right by [`delay_samples`], scaled by [`attenuation_gain`], then
/// zero-padded or truncated to exactly `total_samples`.
pub fn render_contribution(
    source: &SoundSource,
    mic_position: DVec3,
    total_samples: usize,
    options: &RenderOptions,
) -> Result<Vec<f32>> {
    let distance = source.position().distance(mic_position);
    let delay = delay_samples(source.sample_rate(), source.start_time(), distance);
    let gain = attenuation_gain(distance, options)?;

    log::debug!(
        "Source at {} -> mic at {}: distance {:.4} m, delay {} samples, gain {:.6}",
        source.position(),
        mic_position,
        distance,
        delay,
        gain
    );

    let mut contribution = vec![0.0f32; total_samples];
    if delay >= total_samples {
        log::warn!(
            "Source at {} reaches mic at {} after the cutoff ({} >= {} samples)",
            source.position(),
            mic_position,
            delay,
            total_samples
        );
        return Ok(contribution);
    }

    for (out, &sample) in contribution[delay..].iter_mut().zip(source.samples()) {
        *out = (sample as f64 * gain) as f32;
    }
    Ok(contribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::AudioData;

    fn click_at(position: DVec3, sample_rate: u32, start_time: f64) -> SoundSource {
        let audio = AudioData::from_samples(vec![1.0], sample_rate, 1).unwrap();
        SoundSource::from_audio(position, audio, start_time).unwrap()
    }

    #[test]
    fn test_delay_one_meter() {
        // 48000 / 343 = 139.94
        assert_eq!(delay_samples(48000, 0.0, 1.0), 139);
        assert_eq!(delay_samples(48000, 0.5, 0.0), 24000);
        assert_eq!(delay_samples(16000, 0.0, 0.0), 0);
    }

    #[test]
    fn test_inverse_square() {
        let options = RenderOptions::new().atmospheric_attenuation(false);
        let near = attenuation_gain(1.0, &options).unwrap();
        let far = attenuation_gain(2.0, &options).unwrap();
        assert!((near / far - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_atmospheric_only() {
        let options = RenderOptions::new().geometric_attenuation(false);
        let gain = attenuation_gain(1.0, &options).unwrap();
        assert!((gain - 0.995032).abs() < 1e-6);

        let none = RenderOptions::new()
            .geometric_attenuation(false)
            .atmospheric_attenuation(false);
        assert_eq!(attenuation_gain(123.0, &none).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_distance_policies() {
        let reject = RenderOptions::default();
        assert!(matches!(
            attenuation_gain(0.0, &reject),
            Err(SonoSceneError::Domain(_))
        ));

        let clamp = RenderOptions::new()
            .atmospheric_attenuation(false)
            .near_field(NearFieldPolicy::clamp(0.5));
        assert!((attenuation_gain(0.0, &clamp).unwrap() - 4.0).abs() < 1e-12);
        // Clamping leaves distant pairs alone
        assert!((attenuation_gain(2.0, &clamp).unwrap() - 0.25).abs() < 1e-12);

        // Without geometric attenuation zero distance is harmless
        let flat = RenderOptions::new().geometric_attenuation(false);
        assert_eq!(attenuation_gain(0.0, &flat).unwrap(), 1.0);
    }

    #[test]
    fn test_contribution_shift_and_gain() {
        let source = click_at(DVec3::new(1.0, 0.0, 0.0), 48000, 0.0);
        let out =
            render_contribution(&source, DVec3::ZERO, 48000, &RenderOptions::default()).unwrap();

        assert_eq!(out.len(), 48000);
        assert!((out[139] - 0.995032).abs() < 1e-5);
        assert_eq!(out.iter().filter(|&&s| s != 0.0).count(), 1);
    }

    #[test]
    fn test_contribution_truncated_to_cutoff() {
        let audio = AudioData::from_samples(vec![0.5; 100], 1000, 1).unwrap();
        let source = SoundSource::from_audio(DVec3::ZERO, audio, 0.05).unwrap();
        let options = RenderOptions::new()
            .geometric_attenuation(false)
            .atmospheric_attenuation(false);

        let out = render_contribution(&source, DVec3::ZERO, 80, &options).unwrap();
        assert_eq!(out.len(), 80);
        assert!(out[..50].iter().all(|&s| s == 0.0));
        assert!(out[50..].iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_contribution_after_cutoff_is_silent() {
        let source = click_at(DVec3::new(343.0, 0.0, 0.0), 1000, 0.0);
        let out =
            render_contribution(&source, DVec3::ZERO, 500, &RenderOptions::default()).unwrap();
        assert_eq!(out, vec![0.0; 500]);
    }
}
