//! HTTP implementation of the Lyra backend services.
//!
//! [`HttpApi`] implements the `lyra-core` service traits against the REST
//! backend, normalizing error bodies and classifying auth/rate-limit
//! responses for the application layer.

mod account;
mod chat;
mod conversations;
mod http;

pub use http::HttpApi;
