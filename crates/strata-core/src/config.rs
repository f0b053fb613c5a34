//! # Base Layer Configuration
//!
//! Settings the base layer's generic routines depend on.
//!
//! The only setting today is the target architecture, which decides the
//! software breakpoint instruction and the widest region a hardware
//! watchpoint may cover. It defaults to the host architecture and can be
//! overridden with `STRATA_ARCH` (`arm64` or `x86_64`).

use std::env;

use crate::error::{StrataError, StrataResult};
use crate::types::Architecture;

/// Environment variable read by [`BaseConfig::from_env`].
pub const ARCH_ENV: &str = "STRATA_ARCH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseConfig
{
    pub arch: Architecture,
}

impl BaseConfig
{
    #[must_use]
    pub fn with_arch(arch: Architecture) -> Self
    {
        Self { arch }
    }

    /// Read the configuration from the environment.
    ///
    /// An unset or empty `STRATA_ARCH` keeps the host architecture.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if `STRATA_ARCH` names an unknown architecture.
    pub fn from_env() -> StrataResult<Self>
    {
        match env::var(ARCH_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::parse_arch(value.trim()),
            _ => Ok(Self::default()),
        }
    }

    fn parse_arch(value: &str) -> StrataResult<Self>
    {
        value
            .parse::<Architecture>()
            .map(Self::with_arch)
            .map_err(StrataError::InvalidArgument)
    }
}
