#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entry point for the streetwise API server.

#[actix_web::main]
async fn main() -> Result<(), streetwise_server::ServerError> {
    streetwise_server::run_server().await
}
