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

//! The error type for multipart uploads.
//!
//! Uploads fail for many reasons: the destination may be malformed, the
//! credentials may be missing, the local source may be unreadable, the store
//! may refuse to open the upload session, a part may fail more times than the
//! retry policy allows, or the store may reject the final assembly.
//!
//! All these conditions are reported as an [Error]. Most applications just
//! log the error and exit. Applications that need more details can use the
//! `is_*()` predicates to find which stage failed, and query the error
//! [source][std::error::Error::source] for the underlying problem.

use crate::store::CompletedPart;
use http::HeaderMap;
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The error returned by all the functions in this crate.
///
/// # Example
/// ```
/// # use multipart_upload::Error;
/// fn report(error: &Error) {
///     if error.is_finalize() {
///         let parts = error.completed_parts().unwrap_or_default();
///         eprintln!("all {} parts uploaded, but the assembly failed: {error}", parts.len());
///     } else if error.is_exhausted() {
///         eprintln!("gave up after too many transient errors: {error}");
///     } else {
///         eprintln!("upload failed: {error}");
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error representing invalid inputs or configuration.
    pub(crate) fn config<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Config,
            source: Some(source.into()),
        }
    }

    /// The arguments, destination, or source are invalid.
    ///
    /// This is always detected before any request is sent to the store, and
    /// retrying with the same inputs fails again.
    pub fn is_config(&self) -> bool {
        matches!(self.kind, ErrorKind::Config)
    }

    /// Creates an error representing a problem loading the credentials.
    pub(crate) fn authentication<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Authentication,
            source: Some(source.into()),
        }
    }

    /// The ambient credentials could not be loaded.
    ///
    /// # Troubleshooting
    ///
    /// Set `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`, select a profile
    /// from the shared configuration files with `AWS_PROFILE`, or run in an
    /// environment with an instance or container role. The error source has
    /// more details.
    pub fn is_authentication(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication)
    }

    /// Creates an error representing a rejected upload session.
    pub(crate) fn session<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Session,
            source: Some(source.into()),
        }
    }

    /// The store refused to open the upload session.
    ///
    /// Common causes are a bucket that does not exist, or credentials without
    /// permission to write in it.
    pub fn is_session(&self) -> bool {
        matches!(self.kind, ErrorKind::Session)
    }

    /// Creates an error representing a problem reading the upload source.
    pub(crate) fn read<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Read,
            source: Some(source.into()),
        }
    }

    /// The local source could not be read.
    ///
    /// This includes I/O errors and sources that end before their declared
    /// size.
    pub fn is_read(&self) -> bool {
        matches!(self.kind, ErrorKind::Read)
    }

    /// Creates an error from an HTTP response with a non-success status code.
    pub fn http(status_code: u16, headers: HeaderMap, payload: bytes::Bytes) -> Self {
        let details = TransportDetails {
            status_code: Some(status_code),
            headers: Some(headers),
            payload: Some(payload),
            service_code: None,
        };
        Self {
            kind: ErrorKind::Transport(Box::new(details)),
            source: None,
        }
    }

    /// Attaches the error code reported by the store to an [http][Error::http]
    /// error.
    pub(crate) fn with_service_code<T: Into<String>>(mut self, code: T) -> Self {
        if let ErrorKind::Transport(d) = &mut self.kind {
            if d.status_code.is_some() {
                d.service_code = Some(code.into());
            }
        }
        self
    }

    /// Creates an error for a request that did not receive a full response.
    ///
    /// Examples include connection failures, broken connections, or any
    /// error that did not include a status code.
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Transport(Box::default()),
            source: Some(source.into()),
        }
    }

    /// The request failed before a response was received.
    pub fn is_io(&self) -> bool {
        matches!(
            &self.kind,
            ErrorKind::Transport(d) if matches!(**d, TransportDetails {
                status_code: None,
                headers: None,
                payload: None,
                service_code: None,
            })
        )
    }

    /// The request failed in the transport layer, or the store returned an
    /// error status code.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }

    /// Creates an error representing an attempt that exceeded its deadline.
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            source: Some(source.into()),
        }
    }

    /// A single request did not complete before the attempt timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Creates an error representing a response that could not be parsed.
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Deserialization,
            source: Some(source.into()),
        }
    }

    /// The store response could not be parsed.
    ///
    /// This is a bug in the store or in this crate. It is never retried.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    /// Creates an error for a part that failed with a non-retryable error.
    pub(crate) fn transfer(part_number: u32, source: Error) -> Self {
        Self {
            kind: ErrorKind::Transfer { part_number },
            source: Some(source.into()),
        }
    }

    /// A part upload failed with an error that cannot be retried.
    pub fn is_transfer(&self) -> bool {
        matches!(self.kind, ErrorKind::Transfer { .. })
    }

    /// Creates an error representing an exhausted retry policy.
    pub(crate) fn exhausted<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Exhausted { part_number: None },
            source: Some(source.into()),
        }
    }

    /// Records which part gave up in an [exhausted][Error::is_exhausted]
    /// error. Other errors are returned unchanged.
    pub(crate) fn for_part(mut self, part_number: u32) -> Self {
        if let ErrorKind::Exhausted { part_number: p } = &mut self.kind {
            *p = Some(part_number);
        }
        self
    }

    /// The retry policy stopped before a part was uploaded.
    ///
    /// The error source is the last error received while uploading the part,
    /// and [part_number()][Error::part_number] says which part gave up.
    ///
    /// # Troubleshooting
    ///
    /// The most common cause of this problem is a transient problem that
    /// lasts longer than the retry policy. Consider a retry policy with more
    /// attempts or a longer time limit.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted { .. })
    }

    /// Creates an error for a failed assembly.
    pub(crate) fn finalize<T: Into<BoxError>>(
        upload_id: String,
        completed_parts: Vec<CompletedPart>,
        source: T,
    ) -> Self {
        let details = FinalizeDetails {
            upload_id,
            completed_parts,
        };
        Self {
            kind: ErrorKind::Finalize(Box::new(details)),
            source: Some(source.into()),
        }
    }

    /// The store rejected the final assembly after all parts were uploaded.
    ///
    /// # Troubleshooting
    ///
    /// The store may retain the incomplete upload session. Use
    /// [upload_id()][Error::upload_id] and
    /// [completed_parts()][Error::completed_parts] to complete or abort the
    /// upload manually.
    pub fn is_finalize(&self) -> bool {
        matches!(self.kind, ErrorKind::Finalize(_))
    }

    /// Creates an error for a cancelled upload.
    pub(crate) fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: None,
        }
    }

    /// The application cancelled the upload.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// The HTTP status code, if any, associated with this error.
    pub fn http_status_code(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Transport(d) => d.status_code,
            _ => None,
        }
    }

    /// The HTTP headers, if any, associated with this error.
    pub fn http_headers(&self) -> Option<&HeaderMap> {
        match &self.kind {
            ErrorKind::Transport(d) => d.headers.as_ref(),
            _ => None,
        }
    }

    /// The HTTP payload, if any, associated with this error.
    pub fn http_payload(&self) -> Option<&bytes::Bytes> {
        match &self.kind {
            ErrorKind::Transport(d) => d.payload.as_ref(),
            _ => None,
        }
    }

    /// The error code reported by the store, e.g. `SlowDown` or
    /// `NoSuchUpload`.
    ///
    /// This is `None` for errors without a response, and for responses where
    /// the store did not include an error code.
    pub fn service_code(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Transport(d) => d.service_code.as_deref(),
            _ => None,
        }
    }

    /// The part number associated with a [transfer][Error::is_transfer] or
    /// [exhausted][Error::is_exhausted] error.
    pub fn part_number(&self) -> Option<u32> {
        match &self.kind {
            ErrorKind::Transfer { part_number } => Some(*part_number),
            ErrorKind::Exhausted { part_number } => *part_number,
            _ => None,
        }
    }

    /// The upload session id for a [finalize][Error::is_finalize] error.
    pub fn upload_id(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Finalize(d) => Some(d.upload_id.as_str()),
            _ => None,
        }
    }

    /// The completion records for a [finalize][Error::is_finalize] error.
    ///
    /// Contains one record per part, ordered by part number.
    pub fn completed_parts(&self) -> Option<&[CompletedPart]> {
        match &self.kind {
            ErrorKind::Finalize(d) => Some(d.completed_parts.as_slice()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Config, Some(e)) => write!(f, "invalid upload configuration: {e}"),
            (ErrorKind::Authentication, Some(e)) => write!(f, "cannot load the credentials: {e}"),
            (ErrorKind::Session, Some(e)) => write!(f, "cannot open the upload session: {e}"),
            (ErrorKind::Read, Some(e)) => write!(f, "cannot read the upload source: {e}"),
            (ErrorKind::Transport(d), source) => d.display(source.as_deref(), f),
            (ErrorKind::Timeout, Some(e)) => {
                write!(f, "the request exceeded the attempt deadline: {e}")
            }
            (ErrorKind::Deserialization, Some(e)) => {
                write!(f, "cannot deserialize the response: {e}")
            }
            (ErrorKind::Transfer { part_number }, Some(e)) => {
                write!(f, "cannot upload part {part_number}: {e}")
            }
            (ErrorKind::Exhausted { part_number: Some(n) }, Some(e)) => write!(
                f,
                "the retry policy is exhausted for part {n}, last error: {e}"
            ),
            (ErrorKind::Exhausted { part_number: None }, Some(e)) => {
                write!(f, "the retry policy is exhausted, last error: {e}")
            }
            (ErrorKind::Finalize(d), Some(e)) => write!(
                f,
                "cannot finalize upload {} with {} parts: {e}",
                d.upload_id,
                d.completed_parts.len()
            ),
            (ErrorKind::Cancelled, _) => write!(f, "the upload was cancelled"),
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

#[derive(Debug)]
enum ErrorKind {
    Config,
    Authentication,
    Session,
    Read,
    Transport(Box<TransportDetails>),
    Timeout,
    Deserialization,
    Transfer { part_number: u32 },
    Exhausted { part_number: Option<u32> },
    Finalize(Box<FinalizeDetails>),
    Cancelled,
}

#[derive(Debug, Default)]
struct TransportDetails {
    status_code: Option<u16>,
    headers: Option<HeaderMap>,
    payload: Option<bytes::Bytes>,
    service_code: Option<String>,
}

impl TransportDetails {
    fn display(
        &self,
        source: Option<&(dyn StdError + Send + Sync + 'static)>,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match (source, self.status_code, &self.service_code, &self.payload) {
            (Some(e), _, _, _) => write!(f, "the transport reports an error: {e}"),
            (None, Some(code), Some(service_code), _) => {
                write!(f, "the store returned HTTP status {code} ({service_code})")
            }
            (None, Some(code), None, Some(p)) if !p.is_empty() => {
                let body = String::from_utf8_lossy(p);
                write!(f, "the store returned HTTP status {code}: {body}")
            }
            (None, Some(code), None, _) => write!(f, "the store returned HTTP status {code}"),
            (None, None, _, _) => write!(f, "the transport reports an unknown error"),
        }
    }
}

#[derive(Debug)]
struct FinalizeDetails {
    upload_id: String,
    completed_parts: Vec<CompletedPart>,
}

/// Protocol problems detected by the client.
///
/// These are returned as the [source][std::error::Error::source] of an
/// [Error].
///
/// # Example
/// ```
/// # use multipart_upload::{Error, error::UploadError};
/// use std::error::Error as _;
/// fn short_read(error: &Error) -> Option<u64> {
///     match error.source()?.downcast_ref::<UploadError>()? {
///         UploadError::ShortRead(missing) => Some(*missing),
///         _ => None,
///     }
/// }
/// ```
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum UploadError {
    /// Empty sources are not uploaded.
    ///
    /// The multipart protocol requires at least one part, and completing an
    /// upload without parts is rejected by the store.
    #[error("the source is empty, there is nothing to upload")]
    EmptySource,

    /// The source needs more parts than the store accepts.
    #[error("the source needs {parts} parts, but the store accepts at most {limit}")]
    TooManyParts { parts: u64, limit: u64 },

    /// The source ended before its declared size.
    #[error("missing {0} bytes at the end of the source")]
    ShortRead(u64),

    /// Successful responses must include some fields.
    #[error("the response is missing '{0}', a required field")]
    MissingField(&'static str),

    /// Some parts have no completion record.
    ///
    /// This indicates a bug in the client library, finalizing the upload
    /// would create a corrupted object.
    #[error("missing completion records for parts {missing:?}")]
    IncompleteParts { missing: Vec<u32> },
}
