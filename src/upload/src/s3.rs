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

//! A [Store] for S3-compatible services.
//!
//! The store maps the three calls in [Store] to the S3 multipart upload
//! operations: `CreateMultipartUpload`, `UploadPart`, and
//! `CompleteMultipartUpload`. Requests are sent with the AWS SDK, which signs
//! them and resolves the endpoint for each bucket.
//!
//! The SDK retries are disabled, the upload retry loop controls all retries.

use crate::error::UploadError;
use crate::store::{CompletedPart, Store, UploadSession, UploadedObject};
use crate::{Error, Result};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{
    RequestChecksumCalculation, ResponseChecksumValidation, SharedCredentialsProvider,
};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::CompletedMultipartUpload;
use http::{HeaderMap, HeaderName, HeaderValue};

pub use aws_sdk_s3::config::Credentials;

const ENDPOINT_VARS: [&str; 2] = ["AWS_ENDPOINT_URL_S3", "AWS_ENDPOINT_URL"];
const DEFAULT_REGION: &str = "us-east-1";

/// Uploads objects to an S3-compatible service.
///
/// # Example
/// ```no_run
/// # async fn sample() -> multipart_upload::Result<()> {
/// # use multipart_upload::s3::S3Store;
/// // Use the ambient configuration: region, endpoint, and credentials.
/// let store = S3Store::builder().build().await?;
/// // Or point to a local S3-compatible service.
/// let store = S3Store::builder()
///     .with_endpoint("http://localhost:9000")
///     .with_region("us-east-1")
///     .build()
///     .await?;
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Returns a builder for [S3Store].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Creates a store using an existing SDK client.
    ///
    /// The client configuration is used as-is. Consider disabling its retries,
    /// otherwise each attempt in the upload retry loop may send several
    /// requests.
    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// The region used to sign requests.
    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(|r| r.as_ref())
    }
}

impl Store for S3Store {
    async fn open_session(&self, bucket: &str, key: &str) -> Result<UploadSession> {
        let response = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(map_sdk_error)?;
        let upload_id = response
            .upload_id()
            .ok_or_else(|| Error::deser(UploadError::MissingField("UploadId")))?;
        Ok(UploadSession::new(bucket, key, upload_id))
    }

    async fn upload_part(
        &self,
        session: &UploadSession,
        part_number: u32,
        data: bytes::Bytes,
    ) -> Result<CompletedPart> {
        let response = self
            .client
            .upload_part()
            .bucket(session.bucket())
            .key(session.key())
            .upload_id(session.upload_id())
            .part_number(sdk_part_number(part_number)?)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(map_sdk_error)?;
        let etag = response
            .e_tag()
            .ok_or_else(|| Error::deser(UploadError::MissingField("ETag")))?;
        Ok(CompletedPart::new(part_number, etag))
    }

    async fn finalize(
        &self,
        session: &UploadSession,
        parts: &[CompletedPart],
    ) -> Result<UploadedObject> {
        let mut sorted = parts.iter().collect::<Vec<_>>();
        sorted.sort_by_key(|p| p.part_number());
        let parts = sorted
            .into_iter()
            .map(|p| {
                Ok(aws_sdk_s3::types::CompletedPart::builder()
                    .part_number(sdk_part_number(p.part_number())?)
                    .e_tag(p.etag())
                    .build())
            })
            .collect::<Result<Vec<_>>>()?;
        let upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();
        let response = self
            .client
            .complete_multipart_upload()
            .bucket(session.bucket())
            .key(session.key())
            .upload_id(session.upload_id())
            .multipart_upload(upload)
            .send()
            .await
            .map_err(map_sdk_error)?;
        let mut object = UploadedObject::new(session.bucket(), session.key());
        object.etag = response.e_tag().map(str::to_string);
        object.location = response.location().map(str::to_string);
        Ok(object)
    }
}

fn sdk_part_number(part_number: u32) -> Result<i32> {
    i32::try_from(part_number).map_err(Error::config)
}

/// Converts SDK errors into the errors used by the retry policies.
///
/// Error responses keep their status code, headers, payload, and the error
/// code reported by the service. Successful responses that cannot be parsed
/// are deserialization errors.
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => {
            let raw = context.raw();
            let status = raw.status();
            let headers = raw
                .headers()
                .iter()
                .filter_map(|(k, v)| {
                    let name = HeaderName::from_bytes(k.as_bytes()).ok()?;
                    let value = HeaderValue::from_str(v).ok()?;
                    Some((name, value))
                })
                .collect::<HeaderMap>();
            let payload = raw
                .body()
                .bytes()
                .map(bytes::Bytes::copy_from_slice)
                .unwrap_or_default();
            let code = context.err().code().map(str::to_string);
            match code {
                Some(code) => {
                    Error::http(status.as_u16(), headers, payload).with_service_code(code)
                }
                None if status.is_success() => Error::deser(context.into_err()),
                None => Error::http(status.as_u16(), headers, payload),
            }
        }
        SdkError::DispatchFailure(failure) => {
            let timeout = failure.is_timeout();
            let err = SdkError::<E, HttpResponse>::DispatchFailure(failure);
            if timeout {
                Error::timeout(err)
            } else {
                Error::io(err)
            }
        }
        SdkError::TimeoutError(_) => Error::timeout(err),
        SdkError::ResponseError(_) => Error::deser(err),
        _ => Error::config(err),
    }
}

/// A builder for [S3Store].
///
/// Values not set in the builder are taken from the ambient configuration,
/// as the AWS CLI does: environment variables such as `AWS_REGION` and
/// `AWS_ENDPOINT_URL_S3`, the shared `config` and `credentials` files and
/// their profiles, web identity tokens, SSO, and container or instance roles.
///
/// If no region is configured the store uses `us-east-1`.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    endpoint: Option<String>,
    region: Option<String>,
    path_style: Option<bool>,
    credentials: Option<SharedCredentialsProvider>,
}

impl Builder {
    /// Sets the service endpoint, e.g. `http://localhost:9000`.
    ///
    /// Custom endpoints use path-style addressing by default.
    pub fn with_endpoint<T: Into<String>>(mut self, v: T) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Sets the region used to sign requests.
    pub fn with_region<T: Into<String>>(mut self, v: T) -> Self {
        self.region = Some(v.into());
        self
    }

    /// Use `{endpoint}/{bucket}/{key}` URLs instead of
    /// `{bucket}.{endpoint}/{key}`.
    ///
    /// Buckets with dots in their name always use path-style addressing over
    /// `https`, their names do not match the service TLS certificates.
    pub fn with_path_style(mut self, v: bool) -> Self {
        self.path_style = Some(v);
        self
    }

    /// Use explicit credentials instead of the ambient credentials.
    pub fn with_credentials(mut self, v: Credentials) -> Self {
        self.credentials = Some(SharedCredentialsProvider::new(v));
        self
    }

    /// Use a custom credentials provider instead of the ambient credentials.
    pub fn with_credentials_provider<P>(mut self, v: P) -> Self
    where
        P: ProvideCredentials + 'static,
    {
        self.credentials = Some(SharedCredentialsProvider::new(v));
        self
    }

    /// Creates the store.
    ///
    /// Loads the ambient configuration and the credentials. Missing
    /// credentials are reported here, before any upload starts.
    pub async fn build(self) -> Result<S3Store> {
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint).map_err(Error::config)?;
            if url.host_str().is_none_or(str::is_empty) {
                return Err(Error::config(format!(
                    "the endpoint {endpoint} does not have a host"
                )));
            }
        }
        let custom_endpoint = self.endpoint.is_some() || has_endpoint_var();

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = self.region {
            loader = loader.region(Region::new(region));
        }
        if let Some(credentials) = self.credentials {
            loader = loader.credentials_provider(credentials);
        }
        let sdk_config = loader.load().await;

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| Error::authentication("no credentials provider is configured"))?;
        provider
            .provide_credentials()
            .await
            .map_err(Error::authentication)?;

        let region = sdk_config
            .region()
            .cloned()
            .unwrap_or_else(|| Region::from_static(DEFAULT_REGION));
        let mut config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .region(region)
            .retry_config(RetryConfig::disabled())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .force_path_style(self.path_style.unwrap_or(custom_endpoint));
        if let Some(endpoint) = self.endpoint {
            config = config.endpoint_url(endpoint);
        }
        let client = aws_sdk_s3::Client::from_conf(config.build());
        Ok(S3Store { client })
    }
}

fn has_endpoint_var() -> bool {
    ENDPOINT_VARS
        .iter()
        .any(|n| std::env::var(n).is_ok_and(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::error::CredentialsError;
    use aws_credential_types::provider::future;
    use aws_sdk_s3::presigning::PresigningConfig;
    use httptest::{Expectation, Server, matchers::*, responders::status_code};
    use pretty_assertions::assert_eq;
    use scoped_env::ScopedEnv;
    use std::time::Duration;

    type Result = anyhow::Result<()>;

    const INITIATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Bucket>test-bucket</Bucket>
  <Key>prefix/file.bin</Key>
  <UploadId>upload-123</UploadId>
</InitiateMultipartUploadResult>"#;

    const COMPLETE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CompleteMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Location>http://test-bucket.example.com/prefix/file.bin</Location>
  <Bucket>test-bucket</Bucket>
  <Key>prefix/file.bin</Key>
  <ETag>"final-etag-2"</ETag>
</CompleteMultipartUploadResult>"#;

    const INTERNAL_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>InternalError</Code>
  <Message>We encountered an internal error. Please try again.</Message>
  <RequestId>656c76696e6727732072657175657374</RequestId>
</Error>"#;

    const NO_SUCH_BUCKET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchBucket</Code>
  <Message>The specified bucket does not exist</Message>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;

    fn test_credentials() -> Credentials {
        Credentials::from_keys("AKID", "SECRET", None)
    }

    async fn test_store(server: &Server) -> anyhow::Result<S3Store> {
        let store = S3Store::builder()
            .with_endpoint(format!("http://{}", server.addr()))
            .with_region("us-east-1")
            .with_credentials(test_credentials())
            .build()
            .await?;
        Ok(store)
    }

    fn session() -> UploadSession {
        UploadSession::new("test-bucket", "prefix/file.bin", "upload-123")
    }

    #[derive(Debug)]
    struct NoCredentials;

    impl ProvideCredentials for NoCredentials {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::ready(Err(CredentialsError::not_loaded(
                "no credentials in this environment",
            )))
        }
    }

    #[tokio::test]
    async fn open_session() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/test-bucket/prefix/file.bin"),
                request::query(url_decoded(contains(("uploads", any())))),
                request::headers(contains(("authorization", any()))),
                request::headers(contains(("x-amz-date", any()))),
            ])
            .respond_with(status_code(200).body(INITIATE)),
        );

        let store = test_store(&server).await?;
        let got = store.open_session("test-bucket", "prefix/file.bin").await?;
        assert_eq!(got, session());
        Ok(())
    }

    #[tokio::test]
    async fn open_session_error() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/test-bucket/prefix/file.bin"))
                .respond_with(status_code(404).body(NO_SUCH_BUCKET)),
        );

        let store = test_store(&server).await?;
        let err = store
            .open_session("test-bucket", "prefix/file.bin")
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), Some(404), "{err:?}");
        assert_eq!(err.service_code(), Some("NoSuchBucket"), "{err:?}");
        let payload = err.http_payload().map(|p| String::from_utf8_lossy(p).to_string());
        assert!(
            payload.as_deref().is_some_and(|p| p.contains("NoSuchBucket")),
            "{payload:?}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn open_session_bad_payload() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/test-bucket/prefix/file.bin"))
                .respond_with(status_code(200).body("<Unexpected/>")),
        );

        let store = test_store(&server).await?;
        let err = store
            .open_session("test-bucket", "prefix/file.bin")
            .await
            .unwrap_err();
        assert!(err.is_deserialization(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn upload_part() -> Result {
        let server = Server::run();
        let data = bytes::Bytes::from_static(b"the quick brown fox");
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", "/test-bucket/prefix/file.bin"),
                request::query(url_decoded(contains(("partNumber", "7")))),
                request::query(url_decoded(contains(("uploadId", "upload-123")))),
                request::headers(contains(("authorization", any()))),
                request::body("the quick brown fox"),
            ])
            .respond_with(status_code(200).append_header("etag", "\"etag-7\"")),
        );

        let store = test_store(&server).await?;
        let got = store.upload_part(&session(), 7, data).await?;
        assert_eq!(got, CompletedPart::new(7, "\"etag-7\""));
        Ok(())
    }

    #[tokio::test]
    async fn upload_part_missing_etag() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PUT", "/test-bucket/prefix/file.bin"))
                .respond_with(status_code(200)),
        );

        let store = test_store(&server).await?;
        let err = store
            .upload_part(&session(), 1, bytes::Bytes::from_static(b"abc"))
            .await
            .unwrap_err();
        assert!(err.is_deserialization(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn upload_part_transient() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PUT", "/test-bucket/prefix/file.bin"))
                .times(1)
                .respond_with(status_code(503).body("try again later")),
        );

        let store = test_store(&server).await?;
        let err = store
            .upload_part(&session(), 1, bytes::Bytes::from_static(b"abc"))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), Some(503), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn upload_part_connection_refused() -> Result {
        let server = Server::run();
        let store = test_store(&server).await?;
        drop(server);
        let err = store
            .upload_part(&session(), 1, bytes::Bytes::from_static(b"abc"))
            .await
            .unwrap_err();
        assert!(err.is_io() || err.is_timeout(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn finalize() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/test-bucket/prefix/file.bin"),
                request::query(url_decoded(contains(("uploadId", "upload-123")))),
                request::body(matches(
                    "<PartNumber>1</PartNumber>.*<PartNumber>2</PartNumber>.*<PartNumber>3</PartNumber>"
                )),
            ])
            .respond_with(status_code(200).body(COMPLETE)),
        );

        let store = test_store(&server).await?;
        // Finalize sorts the parts.
        let parts = [
            CompletedPart::new(3, "\"etag-3\""),
            CompletedPart::new(1, "\"etag-1\""),
            CompletedPart::new(2, "\"etag-2\""),
        ];
        let got = store.finalize(&session(), &parts).await?;
        let want = UploadedObject::new("test-bucket", "prefix/file.bin")
            .set_etag("\"final-etag-2\"")
            .set_location("http://test-bucket.example.com/prefix/file.bin");
        assert_eq!(got, want);
        Ok(())
    }

    #[tokio::test]
    async fn finalize_etags() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/test-bucket/prefix/file.bin"),
                request::body(matches("<ETag>(\"|&quot;)etag-1(\"|&quot;)</ETag>")),
                request::body(matches("<ETag>(\"|&quot;)etag-2(\"|&quot;)</ETag>")),
            ])
            .respond_with(status_code(200).body(COMPLETE)),
        );

        let store = test_store(&server).await?;
        let parts = [
            CompletedPart::new(1, "\"etag-1\""),
            CompletedPart::new(2, "\"etag-2\""),
        ];
        store.finalize(&session(), &parts).await?;
        Ok(())
    }

    #[tokio::test]
    async fn finalize_error_in_success() -> Result {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/test-bucket/prefix/file.bin"))
                .respond_with(status_code(200).body(INTERNAL_ERROR)),
        );

        let store = test_store(&server).await?;
        let parts = [CompletedPart::new(1, "\"etag-1\"")];
        let err = store.finalize(&session(), &parts).await.unwrap_err();
        // Depending on the SDK version the error document is reported as an
        // error response, or as a result that cannot be parsed.
        assert!(
            err.service_code() == Some("InternalError") || err.is_deserialization(),
            "{err:?}"
        );
        Ok(())
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn addressing_style() -> Result {
        let _endpoint = ScopedEnv::remove("AWS_ENDPOINT_URL_S3");
        let _generic = ScopedEnv::remove("AWS_ENDPOINT_URL");
        let store = S3Store::builder()
            .with_region("eu-west-1")
            .with_credentials(test_credentials())
            .build()
            .await?;
        let presign = |bucket: &'static str| {
            let client = store.client.clone();
            async move {
                let config = PresigningConfig::expires_in(Duration::from_secs(60))?;
                let request = client
                    .upload_part()
                    .bucket(bucket)
                    .key("a/b.txt")
                    .upload_id("upload-123")
                    .part_number(1)
                    .presigned(config)
                    .await?;
                anyhow::Ok(request.uri().to_string())
            }
        };

        let uri = presign("my-bucket").await?;
        assert!(
            uri.starts_with("https://my-bucket.s3.eu-west-1.amazonaws.com/a/b.txt?"),
            "{uri}"
        );
        // Dotted names do not match the `*.s3.{region}.amazonaws.com`
        // certificate.
        let uri = presign("my.bucket-1").await?;
        assert!(
            uri.starts_with("https://s3.eu-west-1.amazonaws.com/my.bucket-1/a/b.txt?"),
            "{uri}"
        );
        Ok(())
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn region_from_config_file() -> Result {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("config");
        let contents = "[default]\nregion = eu-west-1\n\n[profile other]\nregion = ap-south-1\n";
        std::fs::write(&config, contents)?;
        let config = config.to_str().expect("temporary paths are UTF-8");
        let _config = ScopedEnv::set("AWS_CONFIG_FILE", config);
        let _profile = ScopedEnv::remove("AWS_PROFILE");
        let _region = ScopedEnv::remove("AWS_REGION");
        let _default_region = ScopedEnv::remove("AWS_DEFAULT_REGION");
        let store = S3Store::builder()
            .with_credentials(test_credentials())
            .build()
            .await?;
        assert_eq!(store.region(), Some("eu-west-1"));

        let _profile = ScopedEnv::set("AWS_PROFILE", "other");
        let store = S3Store::builder()
            .with_credentials(test_credentials())
            .build()
            .await?;
        assert_eq!(store.region(), Some("ap-south-1"));

        // The environment overrides the configuration files.
        let _region = ScopedEnv::set("AWS_REGION", "us-west-2");
        let store = S3Store::builder()
            .with_credentials(test_credentials())
            .build()
            .await?;
        assert_eq!(store.region(), Some("us-west-2"));
        Ok(())
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn default_region() -> Result {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("config");
        std::fs::write(&config, "")?;
        let config = config.to_str().expect("temporary paths are UTF-8");
        let _config = ScopedEnv::set("AWS_CONFIG_FILE", config);
        let _imds = ScopedEnv::set("AWS_EC2_METADATA_DISABLED", "true");
        let _profile = ScopedEnv::remove("AWS_PROFILE");
        let _region = ScopedEnv::remove("AWS_REGION");
        let _default_region = ScopedEnv::remove("AWS_DEFAULT_REGION");
        let store = S3Store::builder()
            .with_credentials(test_credentials())
            .build()
            .await?;
        assert_eq!(store.region(), Some(DEFAULT_REGION));
        Ok(())
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn credentials_from_environment() -> Result {
        let _id = ScopedEnv::set("AWS_ACCESS_KEY_ID", "AKID");
        let _secret = ScopedEnv::set("AWS_SECRET_ACCESS_KEY", "SECRET");
        let _imds = ScopedEnv::set("AWS_EC2_METADATA_DISABLED", "true");
        let store = S3Store::builder()
            .with_endpoint("http://127.0.0.1:9000")
            .with_region("us-east-1")
            .build()
            .await?;
        assert_eq!(store.region(), Some("us-east-1"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_credentials() {
        let err = S3Store::builder()
            .with_endpoint("http://127.0.0.1:9000")
            .with_region("us-east-1")
            .with_credentials_provider(NoCredentials)
            .build()
            .await
            .unwrap_err();
        assert!(err.is_authentication(), "{err:?}");
    }

    #[tokio::test]
    async fn bad_endpoint() {
        let err = S3Store::builder()
            .with_credentials(test_credentials())
            .with_endpoint("not a url")
            .build()
            .await
            .unwrap_err();
        assert!(err.is_config(), "{err:?}");
    }

    #[test]
    fn part_numbers() {
        assert!(matches!(sdk_part_number(1), Ok(1)));
        assert!(matches!(sdk_part_number(10_000), Ok(10_000)));
        let err = sdk_part_number(u32::MAX).unwrap_err();
        assert!(err.is_config(), "{err:?}");
    }
}
