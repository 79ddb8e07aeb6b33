use crate::error::Result;
use crate::math::Vector3;
use crate::network::SampledNetwork;

/// Translates a sampled network by a displacement vector.
pub struct Translate {
    displacement: Vector3,
}

impl Translate {
    /// Creates a new `Translate` operation.
    #[must_use]
    pub fn new(displacement: Vector3) -> Self {
        Self { displacement }
    }

    /// Executes the translation, moving every sampled position in-place.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` to match the other transforms.
    pub fn execute(&self, network: &mut SampledNetwork) -> Result<()> {
        for point in network.points_mut() {
            point.position += self.displacement;
        }
        Ok(())
    }
}
