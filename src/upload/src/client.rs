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

//! The entry point to upload objects.

use crate::backoff_policy::BackoffPolicy;
use crate::location::Location;
use crate::perform_upload::PerformUpload;
use crate::request_options::RequestOptions;
use crate::retry_policy::RetryPolicy;
use crate::s3::S3Store;
use crate::store::{Store, UploadedObject};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Uploads local files and other sources as multipart uploads.
///
/// The uploader splits the source in parts of 10 MiB, uploads each part
/// (retrying transient failures), and then asks the store to assemble the
/// parts into a single object.
///
/// # Example
/// ```no_run
/// # use multipart_upload::client::Uploader;
/// # use multipart_upload::location::Location;
/// # use multipart_upload::s3::S3Store;
/// # async fn sample() -> anyhow::Result<()> {
/// let uploader = Uploader::new(S3Store::builder().build().await?);
/// let destination: Location = "s3://my-bucket/backups".parse()?;
/// let object = uploader.upload_file("/var/tmp/db.tar.gz", &destination).await?;
/// println!("uploaded {} to {}", object.key, object.bucket);
/// # Ok(()) }
/// ```
///
/// # Configuration
///
/// The default retry policy stops after 10 attempts or 5 minutes for each
/// part. Change it with [with_retry_policy()][Uploader::with_retry_policy].
/// Parts are uploaded one at a time, use
/// [with_max_in_flight_parts()][Uploader::with_max_in_flight_parts] to
/// upload several parts concurrently.
#[derive(Clone, Debug)]
pub struct Uploader<S = S3Store> {
    store: Arc<S>,
    options: RequestOptions,
}

impl<S> Uploader<S>
where
    S: Store,
{
    /// Creates a new uploader for `store`.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            options: RequestOptions::new(),
        }
    }

    /// The retry policy used for each part.
    ///
    /// # Example
    /// ```
    /// # use multipart_upload::client::Uploader;
    /// # use multipart_upload::s3::S3Store;
    /// use multipart_upload::retry_policy::{RetryPolicyExt, RetryableErrors};
    /// use std::time::Duration;
    /// # fn sample(uploader: Uploader<S3Store>) {
    /// let uploader = uploader.with_retry_policy(
    ///     RetryableErrors
    ///         .with_attempt_limit(5)
    ///         .with_time_limit(Duration::from_secs(30)),
    /// );
    /// # }
    /// ```
    pub fn with_retry_policy<V: RetryPolicy + 'static>(mut self, v: V) -> Self {
        self.options.retry_policy = Arc::new(v);
        self
    }

    /// The backoff policy used between attempts for the same part.
    pub fn with_backoff_policy<V: BackoffPolicy + 'static>(mut self, v: V) -> Self {
        self.options.backoff_policy = Arc::new(v);
        self
    }

    /// Sets a deadline for each attempt to upload a part.
    ///
    /// Attempts exceeding this deadline fail with a
    /// [timeout][Error::is_timeout] error, and are retried if the retry policy
    /// allows it.
    pub fn with_attempt_timeout(mut self, v: Duration) -> Self {
        self.options.attempt_timeout = Some(v);
        self
    }

    /// The maximum number of parts uploaded at the same time.
    ///
    /// Each part in flight holds its data in memory. Values below 1 are
    /// treated as 1.
    pub fn with_max_in_flight_parts(mut self, v: usize) -> Self {
        self.options.max_in_flight_parts = v;
        self
    }

    /// Stops uploads when `v` is cancelled.
    ///
    /// Cancelled uploads fail with a [cancelled][Error::is_cancelled] error.
    /// The session in the store is not aborted.
    pub fn with_cancellation(mut self, v: CancellationToken) -> Self {
        self.options.cancel = v;
        self
    }

    /// Uploads a local file to `destination`.
    ///
    /// The object key is the destination prefix followed by the base name of
    /// `path`.
    pub async fn upload_file<P>(&self, path: P, destination: &Location) -> Result<UploadedObject>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let key = destination.object_key_for_path(path)?;
        let file = tokio::fs::File::open(path).await.map_err(Error::read)?;
        let metadata = file.metadata().await.map_err(Error::read)?;
        if !metadata.is_file() {
            return Err(Error::config(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        self.upload_object(destination.bucket(), key, file, metadata.len())
            .send()
            .await
    }

    /// Returns a request builder to upload `size` bytes from `reader`.
    ///
    /// # Example
    /// ```no_run
    /// # use multipart_upload::client::Uploader;
    /// # async fn sample(uploader: &Uploader) -> anyhow::Result<()> {
    /// let data: &[u8] = b"the quick brown fox jumps over the lazy dog";
    /// let object = uploader
    ///     .upload_object("my-bucket", "my-object", data, data.len() as u64)
    ///     .with_max_in_flight_parts(4)
    ///     .send()
    ///     .await?;
    /// println!("object={object:?}");
    /// # Ok(()) }
    /// ```
    pub fn upload_object<B, K, R>(
        &self,
        bucket: B,
        key: K,
        reader: R,
        size: u64,
    ) -> UploadObject<S, R>
    where
        B: Into<String>,
        K: Into<String>,
        R: AsyncRead + Unpin,
    {
        UploadObject {
            store: self.store.clone(),
            bucket: bucket.into(),
            key: key.into(),
            reader,
            size,
            options: self.options.clone(),
        }
    }
}

/// A request builder for a single upload.
///
/// Created by [Uploader::upload_object]. The configuration starts with the
/// uploader values, and can be changed for this upload only.
pub struct UploadObject<S, R> {
    store: Arc<S>,
    bucket: String,
    key: String,
    reader: R,
    size: u64,
    options: RequestOptions,
}

impl<S, R> UploadObject<S, R>
where
    S: Store,
    R: AsyncRead + Unpin,
{
    /// The retry policy used for each part in this upload.
    pub fn with_retry_policy<V: RetryPolicy + 'static>(mut self, v: V) -> Self {
        self.options.retry_policy = Arc::new(v);
        self
    }

    /// The backoff policy used for each part in this upload.
    pub fn with_backoff_policy<V: BackoffPolicy + 'static>(mut self, v: V) -> Self {
        self.options.backoff_policy = Arc::new(v);
        self
    }

    /// Sets a deadline for each attempt to upload a part.
    pub fn with_attempt_timeout(mut self, v: Duration) -> Self {
        self.options.attempt_timeout = Some(v);
        self
    }

    /// The maximum number of parts uploaded at the same time.
    pub fn with_max_in_flight_parts(mut self, v: usize) -> Self {
        self.options.max_in_flight_parts = v;
        self
    }

    /// Stops this upload when `v` is cancelled.
    pub fn with_cancellation(mut self, v: CancellationToken) -> Self {
        self.options.cancel = v;
        self
    }

    #[cfg(test)]
    fn with_part_size(mut self, v: u64) -> Self {
        self.options.part_size = v;
        self
    }

    /// Runs the upload.
    pub async fn send(self) -> Result<UploadedObject> {
        PerformUpload::new(
            self.store,
            self.bucket,
            self.key,
            self.reader,
            self.size,
            self.options,
        )
        .send()
        .await
    }
}

impl<S, R> std::fmt::Debug for UploadObject<S, R>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadObject")
            .field("store", &self.store)
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("size", &self.size)
            .field("options", &self.options)
            .finish()
    }
}
