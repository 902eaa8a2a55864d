//! Simulator configuration: the `§6.3` presets, validation, and the
//! resolved `legacy_fold` / `legacy` behavior branches.

use redcode::Standard;
use thiserror::Error;

/// Configuration errors: an unknown preset name or a preset/override
/// combination that fails validation.
///
/// Grounded in `gmars`'s `config.go` `Validate`, translated 1:1 into typed
/// variants instead of formatted strings.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    /// No preset is registered under this name.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    /// `core_size` is below the minimum of 3.
    #[error("core size must be at least 3, got {0}")]
    CoreSizeTooSmall(u32),
    /// `max_processes` is zero.
    #[error("process limit must be at least 1")]
    InvalidProcessLimit,
    /// `read_limit` is zero.
    #[error("read limit must be at least 1")]
    InvalidReadLimit,
    /// `write_limit` is zero.
    #[error("write limit must be at least 1")]
    InvalidWriteLimit,
    /// `max_cycles` is zero.
    #[error("cycle limit must be at least 1")]
    InvalidCycleLimit,
    /// `max_length` exceeds `core_size`.
    #[error("warrior length {length} exceeds core size {core_size}")]
    LengthExceedsCoreSize {
        /// The configured maximum warrior length.
        length: u32,
        /// The configured core size.
        core_size: u32,
    },
    /// `max_length + min_distance` exceeds `core_size`.
    #[error(
        "warrior length {length} plus minimum distance {distance} exceeds \
         core size {core_size}"
    )]
    DistanceExceedsCoreSize {
        /// The configured maximum warrior length.
        length: u32,
        /// The configured minimum distance between warriors.
        distance: u32,
        /// The configured core size.
        core_size: u32,
    },
}

/// The full set of parameters a [`crate::Simulator`] is constructed from.
///
/// Covers both the §6.3 preset table and the two historic-behavior branches
/// the spec leaves as open questions (§9): `legacy_fold` (the `<` vs `>`
/// comparison in the read/write fold) and `standard` (which also selects the
/// default operand mode and legal opcode/addressing-mode sets at compile
/// time via [`redcode::Standard`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Which ICWS standard this configuration conforms to.
    pub standard: Standard,
    /// `M`: the number of addresses in the core, and the modulus all field
    /// arithmetic is performed under.
    pub core_size: u32,
    /// Maximum size of each warrior's process queue.
    pub max_processes: u32,
    /// Number of cycles `Simulator::run` executes before declaring a tie.
    pub max_cycles: u64,
    /// Maximum number of instructions a single warrior's code may contain.
    pub max_length: u32,
    /// Minimum required gap between the start of two placed warriors.
    pub min_distance: u32,
    /// The window size operand reads are folded into, centered on `PC`.
    pub read_limit: u32,
    /// The window size operand writes are folded into, centered on `PC`.
    pub write_limit: u32,
    /// Resolves the open question in §9: whether the read/write fold wraps
    /// on `r < limit/2` (`true`, historic behavior some simulators exhibit)
    /// or `r > limit/2` (`false`, the correct ICWS'94 behavior). Defaults to
    /// `false`; the `88`/`icws` presets set it `true` to reproduce pMARS
    /// behavior against warriors tuned for it.
    pub legacy_fold: bool,
}

impl SimulatorConfig {
    /// Look up one of the named presets from §6.3.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] if `name` does not match any
    /// preset (case-insensitively).
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let config = match name.to_ascii_lowercase().as_str() {
            "88" | "koth88" => Self {
                standard: Standard::Icws88,
                core_size: 8000,
                max_processes: 8000,
                max_cycles: 80_000,
                max_length: 100,
                min_distance: 100,
                read_limit: 8000,
                write_limit: 8000,
                legacy_fold: true,
            },
            "icws" => Self {
                standard: Standard::Icws88,
                core_size: 8192,
                max_processes: 8000,
                max_cycles: 10_000,
                max_length: 300,
                min_distance: 100,
                read_limit: 8000,
                write_limit: 8000,
                legacy_fold: true,
            },
            "nop94" => Self {
                standard: Standard::Icws94,
                core_size: 8000,
                max_processes: 8000,
                max_cycles: 80_000,
                max_length: 100,
                min_distance: 100,
                read_limit: 8000,
                write_limit: 8000,
                legacy_fold: false,
            },
            "noptiny" => Self {
                standard: Standard::Icws94,
                core_size: 800,
                max_processes: 800,
                max_cycles: 8000,
                max_length: 20,
                min_distance: 20,
                read_limit: 800,
                write_limit: 800,
                legacy_fold: false,
            },
            "nopnano" => Self {
                standard: Standard::Icws94,
                core_size: 80,
                max_processes: 80,
                max_cycles: 800,
                max_length: 5,
                min_distance: 5,
                read_limit: 80,
                write_limit: 80,
                legacy_fold: false,
            },
            other => return Err(ConfigError::UnknownPreset(other.to_owned())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the §6.3 invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: `core_size >= 3`;
    /// `max_processes, max_cycles, read_limit, write_limit >= 1`;
    /// `max_length <= core_size`; `max_length + min_distance <= core_size`.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.core_size < 3 {
            return Err(ConfigError::CoreSizeTooSmall(self.core_size));
        }
        if self.max_processes < 1 {
            return Err(ConfigError::InvalidProcessLimit);
        }
        if self.read_limit < 1 {
            return Err(ConfigError::InvalidReadLimit);
        }
        if self.write_limit < 1 {
            return Err(ConfigError::InvalidWriteLimit);
        }
        if self.max_cycles < 1 {
            return Err(ConfigError::InvalidCycleLimit);
        }
        if self.max_length > self.core_size {
            return Err(ConfigError::LengthExceedsCoreSize {
                length: self.max_length,
                core_size: self.core_size,
            });
        }
        // max_length + min_distance cannot overflow u32 in any realistic
        // configuration, but saturate rather than trust that.
        if self.max_length.saturating_add(self.min_distance) > self.core_size
        {
            return Err(ConfigError::DistanceExceedsCoreSize {
                length: self.max_length,
                distance: self.min_distance,
                core_size: self.core_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;

    #[test]
    fn all_named_presets_resolve_and_validate() {
        for name in ["88", "icws", "nop94", "noptiny", "nopnano"] {
            let config = SimulatorConfig::preset(name)
                .unwrap_or_else(|_| panic!("preset {name} should resolve"));
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn preset_lookup_is_case_insensitive() {
        assert_eq!(
            SimulatorConfig::preset("NOP94"),
            SimulatorConfig::preset("nop94")
        );
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert_eq!(
            SimulatorConfig::preset("not-a-real-preset"),
            Err(ConfigError::UnknownPreset("not-a-real-preset".to_owned()))
        );
    }

    #[test]
    fn legacy_presets_set_legacy_fold() {
        assert!(SimulatorConfig::preset("88").unwrap().legacy_fold);
        assert!(SimulatorConfig::preset("icws").unwrap().legacy_fold);
        assert!(!SimulatorConfig::preset("nop94").unwrap().legacy_fold);
    }

    #[test]
    fn core_size_below_minimum_is_rejected() {
        let mut config = SimulatorConfig::preset("nopnano").unwrap();
        config.core_size = 2;
        assert_eq!(config.validate(), Err(ConfigError::CoreSizeTooSmall(2)));
    }

    #[test]
    fn length_exceeding_core_size_is_rejected() {
        let mut config = SimulatorConfig::preset("nopnano").unwrap();
        config.max_length = config.core_size + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LengthExceedsCoreSize { .. })
        ));
    }

    #[test]
    fn length_plus_distance_exceeding_core_size_is_rejected() {
        let mut config = SimulatorConfig::preset("nopnano").unwrap();
        config.min_distance = config.core_size;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DistanceExceedsCoreSize { .. })
        ));
    }
}
