use thiserror::Error;

/// Input problems caught before any request reaches the routing service.
///
/// The messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select at least {required} places for routing")]
    NotEnoughPlaces { required: usize, found: usize },
    #[error("Please select at least 1 place for isochrones")]
    NoPlace,
    #[error("Please select a valid location")]
    NoResolvedPlace,
    #[error("Enter at least one positive range")]
    EmptyRanges,
}
