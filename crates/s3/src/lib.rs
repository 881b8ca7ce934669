//! cfr2-s3: Cloudflare R2 adapter for the cfr2 CLI client
//!
//! This crate provides the implementation of the ObjectStore trait
//! using the aws-sdk-s3 crate, pointed at an account's R2 endpoint.
//! It is the only crate that directly depends on the AWS SDK.

pub mod client;
pub mod endpoint;
pub mod multipart;

pub use client::R2Client;
pub use endpoint::{bucket_url, endpoint_url, object_url};
pub use multipart::MultipartConfig;
