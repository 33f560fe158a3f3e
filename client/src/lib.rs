// HTTP side of the portal client:
// - API client with the error mapping shared by all endpoints
// - Login/confirmation against the API
// - Resource endpoints (users, courses, grades)
// - `Portal`, the composition root used by front ends

pub mod auth_api;
pub mod http;
pub mod portal;
pub mod resources;

pub use auth_api::HttpAuthenticator;
pub use http::ApiClient;
pub use portal::Portal;
pub use resources::ResourceClient;
