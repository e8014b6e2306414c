// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The single escape path from deep translation call stacks.
//!
//! Expression constructors never fail: type-discipline violations are
//! bugs and assert. Everything user-visible funnels through this error
//! type so the driver can print one diagnostic and exit non-zero.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An unsupported command-line value.
    #[error("unsupported parameter: {0}")]
    Parameter(String),

    /// A construct the translator does not cover.
    #[error("implementation limitation: {0}")]
    ImplementationLimitation(String),

    /// A condition that makes the input untranslatable.
    #[error("{0}")]
    Fatal(String),
}

impl Error {
    pub fn parameter(msg: impl Into<String>) -> Error {
        Error::Parameter(msg.into())
    }

    pub fn implementation_limitation(msg: impl Into<String>) -> Error {
        Error::ImplementationLimitation(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Error {
        Error::Fatal(msg.into())
    }
}
