// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use thiserror::Error;

/// Errors raised at the outer surfaces of the crate: parsing inputs and
/// resolving names. The pipeline stages themselves are infallible.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),

    #[error("unknown intent '{0}'")]
    UnknownIntent(String),

    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownIntent("browse".to_string());
        assert_eq!(err.to_string(), "unknown intent 'browse'");

        let err = Error::Config("iterations must be > 0".to_string());
        assert_eq!(err.to_string(), "config error: iterations must be > 0");
    }

    #[test]
    fn test_json_error_converts() {
        fn parse(s: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(s)?)
        }
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
