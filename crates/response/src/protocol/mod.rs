//! Protocol types shared by the response writer.
//!
//! - [`ResponseError`]: errors returned to the handler
//! - [`RequestInfo`]: the request descriptor the writer consults and closes
//! - [`status`]: body-allowed and status code validation rules

mod error;
pub use error::ResponseError;

mod request;
pub use request::CloseBody;
pub use request::FormCleanup;
pub use request::RequestInfo;

pub mod status;
