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

//! The contract between the uploader and the object store.
//!
//! Any store implementing the three calls in [Store] (open a session, upload
//! a part, finalize the session) can be used with the
//! [Uploader][crate::client::Uploader]. The [S3Store][crate::s3::S3Store]
//! implements this contract for S3-compatible services.

use crate::Result;

/// Defines the trait used to implement the remote side of an upload.
///
/// Application developers may need to implement this trait to mock the
/// store, or to support other object stores with a multipart protocol.
pub trait Store: std::fmt::Debug + Send + Sync {
    /// Starts a new multipart upload for `bucket` and `key`.
    fn open_session(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<UploadSession>> + Send;

    /// Uploads one part.
    ///
    /// Uploading the same part number twice replaces the previous data, this
    /// call is safe to retry.
    fn upload_part(
        &self,
        session: &UploadSession,
        part_number: u32,
        data: bytes::Bytes,
    ) -> impl std::future::Future<Output = Result<CompletedPart>> + Send;

    /// Assembles the uploaded parts into the final object.
    ///
    /// `parts` has exactly one record per part number and is sorted by part
    /// number.
    fn finalize(
        &self,
        session: &UploadSession,
        parts: &[CompletedPart],
    ) -> impl std::future::Future<Output = Result<UploadedObject>> + Send;
}

/// An in-progress multipart upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSession {
    bucket: String,
    key: String,
    upload_id: String,
}

impl UploadSession {
    /// Creates a new session from the token issued by the store.
    pub fn new<B, K, U>(bucket: B, key: K, upload_id: U) -> Self
    where
        B: Into<String>,
        K: Into<String>,
        U: Into<String>,
    {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            upload_id: upload_id.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The opaque token identifying this upload in the store.
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }
}

/// The completion record for an uploaded part.
///
/// Pairs the part number with the integrity tag (the `ETag`) returned by the
/// store. Finalizing an upload requires one record per part.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    part_number: u32,
    etag: String,
}

impl CompletedPart {
    pub fn new<T: Into<String>>(part_number: u32, etag: T) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }

    pub fn part_number(&self) -> u32 {
        self.part_number
    }

    /// The integrity tag, including any quotes returned by the store.
    pub fn etag(&self) -> &str {
        &self.etag
    }
}

/// The result of a successful upload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct UploadedObject {
    /// The bucket containing the object.
    pub bucket: String,

    /// The object key.
    pub key: String,

    /// The entity tag of the assembled object, if the store returns one.
    pub etag: Option<String>,

    /// The URL of the object, if the store returns one.
    pub location: Option<String>,
}

impl UploadedObject {
    pub fn new<B: Into<String>, K: Into<String>>(bucket: B, key: K) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Sets the value of [etag][UploadedObject::etag].
    pub fn set_etag<T: Into<String>>(mut self, v: T) -> Self {
        self.etag = Some(v.into());
        self
    }

    /// Sets the value of [location][UploadedObject::location].
    pub fn set_location<T: Into<String>>(mut self, v: T) -> Self {
        self.location = Some(v.into());
        self
    }
}
