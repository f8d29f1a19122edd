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

//! Uploads a local file to an S3-compatible bucket using multipart uploads.

mod args;

use anyhow::Result;
use args::Args;
use clap::Parser;
use multipart_upload::client::Uploader;
use multipart_upload::s3::S3Store;
use std::process::ExitCode;

const DESCRIPTION: &str = concat!(
    "Uploads SOURCE to the bucket and prefix named by DESTINATION, for example",
    " `s3://my-bucket/backups`. The file is split in 10 MiB parts, each part is",
    " uploaded (and retried on transient errors), and then the parts are",
    " assembled into a single object named after the base name of SOURCE.",
    " The region, endpoint, and credentials are taken from the AWS_*",
    " environment variables, the shared config and credentials files, or the",
    " instance or container role, as in the AWS CLI."
);

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    enable_tracing();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let destination = args.validate()?;
    tracing::info!("Configuration: {args:?}");

    let store = S3Store::builder().build().await?;
    let object = Uploader::new(store)
        .upload_file(&args.source, &destination)
        .await?;
    tracing::info!(
        bucket = object.bucket.as_str(),
        key = object.key.as_str(),
        etag = ?object.etag,
        "upload completed"
    );
    Ok(())
}

fn enable_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_level(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
