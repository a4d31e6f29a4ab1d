mod generate_content_request;
mod generate_content_response;

pub use generate_content_request::GenerateContentRequest;
pub use generate_content_request::{Content, GenerationConfig, Part};
pub use generate_content_response::{Candidate, GenerateContentResponse};
