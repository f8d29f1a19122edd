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

//! Parse destination locators.
//!
//! A destination is a URL such as `s3://my-bucket/backups/2025`. The host
//! names the bucket and the path, without leading or trailing separators, is
//! the prefix for the object key. The object key is the prefix followed by
//! the base name of the uploaded file.

use crate::{Error, Result};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// The only scheme accepted in destinations.
pub const SCHEME: &str = "s3";

// Characters that must be escaped to format a prefix as a URL path. The `/`
// separators stay as-is.
const PREFIX_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Problems found while parsing a destination locator.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum LocationError {
    #[error("cannot parse {0:?} as a URL: {1}")]
    Url(String, #[source] url::ParseError),
    #[error("the destination scheme must be `{SCHEME}`, got `{0}`")]
    UnsupportedScheme(String),
    #[error("the destination {0:?} does not name a bucket")]
    MissingBucket(String),
    #[error("the destination {0:?} must not include a port, credentials, query, or fragment")]
    UnexpectedComponent(String),
    #[error("the key prefix in {0:?} is not valid UTF-8 after percent-decoding")]
    InvalidPrefix(String),
    #[error("cannot use {0:?} as an object name, it has no base name")]
    MissingBaseName(String),
}

/// A parsed destination: the bucket and the key prefix.
///
/// # Example
/// ```
/// # use multipart_upload::location::Location;
/// let location = Location::parse("s3://my-bucket/backups/2025/")?;
/// assert_eq!(location.bucket(), "my-bucket");
/// assert_eq!(location.prefix(), "backups/2025");
/// assert_eq!(location.object_key("db.tar.gz"), "backups/2025/db.tar.gz");
/// # Ok::<(), multipart_upload::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    bucket: String,
    prefix: String,
}

impl Location {
    /// Parses a destination locator.
    ///
    /// Fails with a [config][Error::is_config] error if the locator is not a
    /// URL, does not use the `s3` scheme, or has no bucket.
    pub fn parse(locator: &str) -> Result<Self> {
        Self::parse_impl(locator).map_err(Error::config)
    }

    fn parse_impl(locator: &str) -> std::result::Result<Self, LocationError> {
        let url = url::Url::parse(locator)
            .map_err(|e| LocationError::Url(locator.to_string(), e))?;
        if url.scheme() != SCHEME {
            return Err(LocationError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.port().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(LocationError::UnexpectedComponent(locator.to_string()));
        }
        let bucket = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(LocationError::MissingBucket(locator.to_string())),
        };
        let prefix = percent_decode_str(url.path().trim_matches('/'))
            .decode_utf8()
            .map_err(|_| LocationError::InvalidPrefix(locator.to_string()))?
            .into_owned();
        Ok(Self { bucket, prefix })
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key prefix, without leading or trailing separators. May be empty.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The object key for a file with the given base name.
    ///
    /// With an empty prefix the key is just the base name.
    pub fn object_key(&self, base_name: &str) -> String {
        if self.prefix.is_empty() {
            return base_name.to_string();
        }
        format!("{}/{base_name}", self.prefix)
    }

    /// The object key for a local file path.
    pub(crate) fn object_key_for_path(&self, path: &std::path::Path) -> Result<String> {
        let base_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            Error::config(LocationError::MissingBaseName(path.display().to_string()))
        })?;
        Ok(self.object_key(base_name))
    }
}

impl std::str::FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prefix.is_empty() {
            return write!(f, "{SCHEME}://{}", self.bucket);
        }
        let prefix = utf8_percent_encode(&self.prefix, PREFIX_ENCODE_SET);
        write!(f, "{SCHEME}://{}/{prefix}", self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;
    use std::path::Path;
    use test_case::test_case;

    #[test_case("s3://bucket", "bucket", "")]
    #[test_case("s3://bucket/", "bucket", "")]
    #[test_case("s3://bucket/prefix", "bucket", "prefix")]
    #[test_case("s3://bucket/a/b/c/", "bucket", "a/b/c")]
    #[test_case("s3://bucket//a/b//", "bucket", "a/b")]
    #[test_case("s3://my.bucket-1/logs", "my.bucket-1", "logs")]
    #[test_case("s3://bucket/with%20space", "bucket", "with space")]
    fn parse(input: &str, bucket: &str, prefix: &str) -> anyhow::Result<()> {
        let got = Location::parse(input)?;
        assert_eq!(got.bucket(), bucket);
        assert_eq!(got.prefix(), prefix);
        Ok(())
    }

    #[test]
    fn parse_is_idempotent() -> anyhow::Result<()> {
        let input = "s3://bucket/a/b";
        let first = Location::parse(input)?;
        let second = Location::parse(input)?;
        assert_eq!(first, second);
        let reparsed = Location::parse(&first.to_string())?;
        assert_eq!(first, reparsed);
        Ok(())
    }

    #[test_case("")]
    #[test_case("bucket/prefix")]
    #[test_case("not a url")]
    #[test_case("gs://bucket/prefix")]
    #[test_case("https://bucket/prefix")]
    #[test_case("s3:///prefix")]
    #[test_case("s3:bucket")]
    #[test_case("s3://bucket:9000/prefix")]
    #[test_case("s3://user:pass@bucket/prefix")]
    #[test_case("s3://bucket/prefix?versionId=1")]
    #[test_case("s3://bucket/prefix#frag")]
    #[test_case("s3://bucket/%FF")]
    fn parse_errors(input: &str) {
        let got = Location::parse(input);
        let err = got.unwrap_err();
        assert!(err.is_config(), "{err:?}");
        let source = err.source().and_then(|e| e.downcast_ref::<LocationError>());
        assert!(source.is_some(), "{err:?}");
    }

    #[test]
    fn from_str() -> anyhow::Result<()> {
        let got: Location = "s3://bucket/prefix".parse()?;
        assert_eq!(got.bucket(), "bucket");
        Ok(())
    }

    #[test_case("s3://bucket/prefix", "file.bin", "prefix/file.bin")]
    #[test_case("s3://bucket/a/b/", "file.bin", "a/b/file.bin")]
    #[test_case("s3://bucket", "file.bin", "file.bin")]
    fn object_key(input: &str, base_name: &str, want: &str) -> anyhow::Result<()> {
        let location = Location::parse(input)?;
        assert_eq!(location.object_key(base_name), want);
        Ok(())
    }

    #[test]
    fn object_key_for_path() -> anyhow::Result<()> {
        let location = Location::parse("s3://bucket/backups")?;
        let got = location.object_key_for_path(Path::new("/var/tmp/db.tar.gz"))?;
        assert_eq!(got, "backups/db.tar.gz");
        let got = location.object_key_for_path(Path::new("relative.txt"))?;
        assert_eq!(got, "backups/relative.txt");

        let err = location.object_key_for_path(Path::new("/")).unwrap_err();
        assert!(err.is_config(), "{err:?}");
        Ok(())
    }

    #[test_case("s3://bucket", "s3://bucket")]
    #[test_case("s3://bucket/", "s3://bucket")]
    #[test_case("s3://bucket/a/b/", "s3://bucket/a/b")]
    #[test_case("s3://bucket/with%20space", "s3://bucket/with%20space")]
    #[test_case("s3://b/a%2525", "s3://b/a%2525")]
    #[test_case("s3://b/what%3F/why%23", "s3://b/what%3F/why%23")]
    fn display(input: &str, want: &str) -> anyhow::Result<()> {
        let location = Location::parse(input)?;
        assert_eq!(location.to_string(), want);
        Ok(())
    }

    #[test_case("s3://b/a%2525", "a%25")]
    #[test_case("s3://b/100%25/done", "100%/done")]
    #[test_case("s3://b/caf%C3%A9/men%C3%BC", "café/menü")]
    #[test_case("s3://b/q%3Fx%3D1", "q?x=1")]
    #[test_case("s3://b/h%23tag/a%20b", "h#tag/a b")]
    fn display_round_trip(input: &str, prefix: &str) -> anyhow::Result<()> {
        let location = Location::parse(input)?;
        assert_eq!(location.prefix(), prefix);
        let reparsed = Location::parse(&location.to_string())?;
        assert_eq!(reparsed, location);
        assert_eq!(reparsed.prefix(), prefix);
        Ok(())
    }
}
