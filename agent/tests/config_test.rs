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

use evidence_agent::Config;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_defaults_without_file() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let tpm = config.tpm_attester_config();
    assert_eq!(tpm.tcti, "device:/dev/tpmrm0");
    assert_eq!(tpm.pcr_selection.hash_alg, "sha256");
    assert_eq!(tpm.pcr_selection.banks, (0..=7).collect::<Vec<u32>>());

    let tdx = config.tdx_attester_config();
    assert_eq!(
        tdx.ccel_path,
        PathBuf::from("/sys/firmware/acpi/tables/data/CCEL")
    );
}

#[test]
fn test_full_config_file() {
    let file = write_config(
        r#"
logging:
  level: debug
tpm:
  tcti: "mssim:host=localhost,port=2321"
  ak_handle: 2164392962
  pcr_selection:
    banks: [0, 1, 2, 3]
    hash_alg: sha384
  quote_signature_scheme:
    signature_alg: rsassa
    hash_alg: sha256
  event_log_path: /tmp/binary_bios_measurements
tdx:
  ccel_path: /tmp/CCEL
virtcca:
  ccel_path: /tmp/CCEL
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.logging.level, "debug");

    let tpm = config.tpm_attester_config();
    assert_eq!(tpm.tcti, "mssim:host=localhost,port=2321");
    assert_eq!(tpm.ak_handle, 0x8101_0002);
    assert_eq!(tpm.pcr_selection.banks, vec![0, 1, 2, 3]);
    assert_eq!(tpm.pcr_selection.hash_alg, "sha384");
    let scheme = tpm.quote_signature_scheme.unwrap();
    assert_eq!(scheme.signature_alg, "rsassa");

    assert_eq!(
        config.tdx_attester_config().ccel_path,
        PathBuf::from("/tmp/CCEL")
    );
}

#[test]
fn test_partial_config_keeps_defaults() {
    let file = write_config(
        r#"
tpm:
  pcr_selection:
    hash_alg: sha1
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    let tpm = config.tpm_attester_config();
    assert_eq!(tpm.pcr_selection.hash_alg, "sha1");
    // Unset fields fall back to the defaults.
    assert_eq!(tpm.tcti, "device:/dev/tpmrm0");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let file = write_config("logging:\n  level: verbose\n");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_invalid_pcr_bank_is_rejected() {
    let file = write_config(
        r#"
tpm:
  pcr_selection:
    banks: [0, 31]
"#,
    );
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_unreadable_file_is_rejected() {
    assert!(Config::from_file(std::path::Path::new("/nonexistent/evidence.yaml")).is_err());
}

#[test]
fn test_malformed_yaml_is_rejected() {
    let file = write_config("tpm: [not, a, mapping\n");
    assert!(Config::from_file(file.path()).is_err());
}
