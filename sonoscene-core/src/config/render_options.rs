use crate::error::{Result, SonoSceneError};

/// How the renderer treats a source that coincides with a microphone.
///
/// Geometric attenuation divides by the squared distance, which is singular at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NearFieldPolicy {
    /// Fail the render with [`SonoSceneError::Domain`] when a source sits on a microphone
    Reject,
    /// Attenuate as if the pair were at least `min_distance` meters apart.
    ///
    /// The propagation delay still uses the true distance.
    Clamp {
        /// Minimum attenuation distance in meters (must be positive)
        min_distance: f64,
    },
}

impl Default for NearFieldPolicy {
    fn default() -> Self {
        Self::Reject
    }
}

impl NearFieldPolicy {
    /// Create a clamping policy with the given floor in meters
    pub fn clamp(min_distance: f64) -> Self {
        Self::Clamp { min_distance }
    }

    /// Returns the floor if this policy clamps
    pub fn min_distance(&self) -> Option<f64> {
        match self {
            Self::Clamp { min_distance } => Some(*min_distance),
            Self::Reject => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Clamp { min_distance } if !(*min_distance > 0.0 && min_distance.is_finite()) => {
                Err(SonoSceneError::InvalidArgument(format!(
                    "Near-field clamp distance must be positive and finite, got {}",
                    min_distance
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Options controlling [`Scene::render`](crate::scene::Scene::render).
///
/// # Example
///
/// ```
/// use sonoscene_core::config::{NearFieldPolicy, RenderOptions};
///
/// let options = RenderOptions::new()
///     .atmospheric_attenuation(false)
///     .near_field(NearFieldPolicy::clamp(0.05));
/// assert!(options.geometric_attenuation);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Divide each contribution by the squared source-microphone distance
    pub geometric_attenuation: bool,
    /// Multiply each contribution by `exp(-ATTENUATION_ALPHA * distance)`
    pub atmospheric_attenuation: bool,
    /// Guard for the zero-distance singularity of geometric attenuation
    pub near_field: NearFieldPolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            geometric_attenuation: true,
            atmospheric_attenuation: true,
            near_field: NearFieldPolicy::default(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn geometric_attenuation(mut self, enable: bool) -> Self {
        self.geometric_attenuation = enable;
        self
    }

    pub fn atmospheric_attenuation(mut self, enable: bool) -> Self {
        self.atmospheric_attenuation = enable;
        self
    }

    pub fn near_field(mut self, policy: NearFieldPolicy) -> Self {
        self.near_field = policy;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.near_field.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_both_attenuations() {
        let options = RenderOptions::default();
        assert!(options.geometric_attenuation);
        assert!(options.atmospheric_attenuation);
        assert_eq!(options.near_field, NearFieldPolicy::Reject);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_clamp_validation() {
        assert!(NearFieldPolicy::clamp(0.01).validate().is_ok());
        assert!(NearFieldPolicy::clamp(0.0).validate().is_err());
        assert!(NearFieldPolicy::clamp(-1.0).validate().is_err());
        assert!(NearFieldPolicy::clamp(f64::NAN).validate().is_err());
        assert_eq!(NearFieldPolicy::clamp(0.5).min_distance(), Some(0.5));
        assert_eq!(NearFieldPolicy::Reject.min_distance(), None);
    }
}
