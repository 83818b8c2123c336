/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * CC Evidence SDK is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! YAML configuration for the evidence agent.
//!
//! Every section is optional; an absent file or section falls back to the
//! platform defaults, so detection-and-collect works with zero setup.

use evidence_api::EvidenceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tdx_attester::TdxAttesterConfig;
use tpm_attester::{PcrSelectionConfig, QuoteSignatureScheme, TpmAttesterConfig};
use virtcca_attester::VirtCcaAttesterConfig;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PcrSelectionSection {
    pub banks: Option<Vec<u32>>,
    pub hash_alg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSignatureSchemeSection {
    pub signature_alg: String,
    pub hash_alg: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TpmSection {
    pub tcti: Option<String>,
    pub ak_handle: Option<u32>,
    #[serde(default)]
    pub pcr_selection: PcrSelectionSection,
    pub quote_signature_scheme: Option<QuoteSignatureSchemeSection>,
    pub event_log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TdxSection {
    pub ccel_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtCcaSection {
    pub ccel_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tpm: TpmSection,
    #[serde(default)]
    pub tdx: TdxSection,
    #[serde(default)]
    pub virtcca: VirtCcaSection,
}

impl Config {
    /// Load a configuration file.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for unreadable files or invalid
    /// YAML, and any error [`validate`](Self::validate) reports.
    pub fn from_file(path: &Path) -> Result<Self, EvidenceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EvidenceError::InputError(format!(
                "Failed to read configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            EvidenceError::InputError(format!(
                "Failed to parse configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration before any backend is built.
    ///
    /// # Errors
    /// Returns `EvidenceError::InputError` for an unknown log level or an
    /// inconsistent TPM section.
    pub fn validate(&self) -> Result<(), EvidenceError> {
        if !["trace", "debug", "info", "warn", "error", "off"]
            .contains(&self.logging.level.as_str())
        {
            return Err(EvidenceError::InputError(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        self.tpm_attester_config().validate()
    }

    /// TPM backend configuration with defaults filled in.
    pub fn tpm_attester_config(&self) -> TpmAttesterConfig {
        let defaults = TpmAttesterConfig::default();
        let default_selection = PcrSelectionConfig::default();

        TpmAttesterConfig {
            tcti: self.tpm.tcti.clone().unwrap_or(defaults.tcti),
            ak_handle: self.tpm.ak_handle.unwrap_or(defaults.ak_handle),
            pcr_selection: PcrSelectionConfig {
                banks: self
                    .tpm
                    .pcr_selection
                    .banks
                    .clone()
                    .unwrap_or(default_selection.banks),
                hash_alg: self
                    .tpm
                    .pcr_selection
                    .hash_alg
                    .clone()
                    .unwrap_or(default_selection.hash_alg),
            },
            quote_signature_scheme: self.tpm.quote_signature_scheme.as_ref().map(|scheme| {
                QuoteSignatureScheme {
                    signature_alg: scheme.signature_alg.clone(),
                    hash_alg: scheme.hash_alg.clone(),
                }
            }),
            event_log_path: self
                .tpm
                .event_log_path
                .clone()
                .unwrap_or(defaults.event_log_path),
        }
    }

    /// TDX backend configuration with defaults filled in.
    pub fn tdx_attester_config(&self) -> TdxAttesterConfig {
        let defaults = TdxAttesterConfig::default();
        TdxAttesterConfig {
            ccel_path: self.tdx.ccel_path.clone().unwrap_or(defaults.ccel_path),
        }
    }

    /// virtCCA backend configuration with defaults filled in.
    pub fn virtcca_attester_config(&self) -> VirtCcaAttesterConfig {
        let defaults = VirtCcaAttesterConfig::default();
        VirtCcaAttesterConfig {
            ccel_path: self.virtcca.ccel_path.clone().unwrap_or(defaults.ccel_path),
        }
    }
}
