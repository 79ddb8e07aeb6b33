mod bend;
mod general;
mod rotate;
mod translate;

pub use bend::Bend;
pub use general::GeneralTransform;
pub use rotate::Rotate;
pub use translate::Translate;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn sample_network() -> crate::network::SampledNetwork {
    use crate::network::{BuildParameters, NetworkMeshBuilder};

    let parameters = BuildParameters {
        inner_proportion: Some(0.5),
        ..BuildParameters::with_element_count(2)
    };
    NetworkMeshBuilder::from_descriptor("1-2", parameters)
        .unwrap()
        .build()
        .unwrap()
}
