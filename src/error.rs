// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Error type shared by the conversion pipeline.
//!
//! Every variant describes a per-frame condition: the caller drops the frame
//! and carries on with the next one. None of them leave state behind that
//! would affect later conversions.

use std::fmt;

/// Common error type for depth conversion.
#[derive(Debug)]
pub enum Error {
    /// No camera intrinsics have been received yet.
    NotReady,
    /// Image encoding is not one of the supported kinds.
    UnsupportedEncoding(String),
    /// Buffer extents do not match the declared width, height and stride.
    MalformedInput(String),
    /// Invalid conversion parameters.
    Config(String),
    /// CDR message encoding or decoding failed.
    Cdr(cdr::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotReady => write!(f, "camera intrinsics not available"),
            Error::UnsupportedEncoding(encoding) => {
                write!(f, "unsupported encoding: {}", encoding)
            }
            Error::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::Cdr(err) => write!(f, "cdr error: {}", err),
        }
    }
}

impl From<cdr::Error> for Error {
    fn from(err: cdr::Error) -> Self {
        Error::Cdr(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::NotReady.to_string(),
            "camera intrinsics not available"
        );
        assert_eq!(
            Error::UnsupportedEncoding("bgr8".into()).to_string(),
            "unsupported encoding: bgr8"
        );
        assert_eq!(
            Error::Config("decimation must be at least 1".into()).to_string(),
            "configuration error: decimation must be at least 1"
        );
    }
}
