mod forge;
mod generation;
mod transport;

pub use forge::{ApiErrorBody, ApiErrorObject, ForgeError};
pub use generation::GenerationError;
pub use transport::TransportError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
