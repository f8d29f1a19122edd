// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Chunked multipart uploads for S3-compatible object stores.
//!
//! This crate uploads a local file (or any [AsyncRead] source of known size)
//! to an object store using the multipart upload protocol: the source is
//! split into fixed-size parts, each part is transferred independently (and
//! retried on transient failures), and the store assembles the parts into a
//! single object.
//!
//! Most applications use [Uploader][client::Uploader] with the
//! [S3Store][s3::S3Store] backend:
//!
//! ```no_run
//! # async fn sample() -> multipart_upload::Result<()> {
//! use multipart_upload::client::Uploader;
//! use multipart_upload::location::Location;
//! use multipart_upload::s3::S3Store;
//!
//! let store = S3Store::builder().build().await?;
//! let destination = Location::parse("s3://my-bucket/backups/2025")?;
//! let object = Uploader::new(store)
//!     .upload_file("database.tar.gz", &destination)
//!     .await?;
//! println!("uploaded {object:?}");
//! # Ok(()) }
//! ```
//!
//! [AsyncRead]: tokio::io::AsyncRead

/// An alias of [std::result::Result] where the error is always [Error].
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

pub mod backoff_policy;
pub mod client;
pub mod error;
pub mod location;
pub mod retry_policy;
pub mod s3;
pub mod source;
pub mod store;

mod perform_upload;
mod request_options;
mod retry_loop;
