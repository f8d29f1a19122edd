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

use anyhow::bail;
use clap::Parser;
use multipart_upload::location::Location;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = super::DESCRIPTION)]
pub struct Args {
    /// The local file to upload.
    pub source: PathBuf,

    /// The destination bucket and prefix, e.g. `s3://my-bucket/backups`.
    pub destination: String,
}

impl Args {
    /// Validates the arguments after parsing, returns the parsed destination.
    pub fn validate(&self) -> anyhow::Result<Location> {
        if self.source.file_name().is_none() {
            bail!(
                "invalid source {}, it must name a file",
                self.source.display()
            )
        }
        let destination = Location::parse(&self.destination)?;
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn validate_success() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["program", "data/db.tar.gz", "s3://bucket/a/b"])?;
        assert_eq!(args.source, PathBuf::from("data/db.tar.gz"));
        let got = args.validate()?;
        assert_eq!(got.bucket(), "bucket");
        assert_eq!(got.prefix(), "a/b");
        Ok(())
    }

    #[test_case(&["program", "db.tar.gz", "gs://bucket/a"]; "wrong scheme")]
    #[test_case(&["program", "db.tar.gz", "s3:///a"]; "missing bucket")]
    #[test_case(&["program", "db.tar.gz", "not a url"]; "not a url")]
    #[test_case(&["program", "/", "s3://bucket/a"]; "no file name")]
    #[test_case(&["program", "..", "s3://bucket/a"]; "parent directory")]
    fn validate(input: &[&str]) -> anyhow::Result<()> {
        let args = Args::try_parse_from(input)?;
        let got = args.validate();
        assert!(got.is_err(), "{got:?} {args:?}");
        Ok(())
    }

    #[test_case(&["program"])]
    #[test_case(&["program", "db.tar.gz"])]
    #[test_case(&["program", "db.tar.gz", "s3://bucket", "extra"])]
    fn parse_errors(input: &[&str]) {
        let got = Args::try_parse_from(input);
        assert!(got.is_err(), "{got:?}");
    }
}
