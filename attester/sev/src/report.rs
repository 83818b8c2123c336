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

//! SNP_GET_REPORT guest ioctl, kernel ABI from `include/uapi/linux/sev-guest.h`.

use evidence_api::cc_type::TEE_SEV_PATH;
use evidence_api::EvidenceError;

/// Report-data field carried into the report.
pub const SNP_REPORT_DATA_LEN: usize = 64;
/// Attestation report length per the SEV-SNP firmware ABI.
pub const SNP_REPORT_SIZE: usize = 1184;
/// Most privileged VM permission level.
pub const SNP_VMPL_MAX: u32 = 3;

// Attestation report field offsets (SEV-SNP firmware ABI, Table 23).
pub const SNP_REPORT_DATA_OFFSET: usize = 0x50;
pub const SNP_MEASUREMENT_OFFSET: usize = 0x90;
pub const SNP_MEASUREMENT_SIZE: usize = 48;

/// Kernel struct `snp_report_req` (96 bytes).
#[repr(C)]
pub struct SnpReportReq {
    pub user_data: [u8; SNP_REPORT_DATA_LEN],
    pub vmpl: u32,
    pub rsvd: [u8; 28],
}

/// Kernel struct `snp_report_resp` (4000 bytes).
#[repr(C)]
pub struct SnpReportResp {
    pub data: [u8; 4000],
}

/// Kernel struct `snp_guest_request_ioctl`. The exitinfo2 union is split
/// into the two error words read on failure.
#[repr(C)]
pub struct SnpGuestRequestIoctl {
    pub msg_version: u8,
    pub _pad: [u8; 7],
    pub req_data: u64,
    pub resp_data: u64,
    pub fw_error: u32,
    pub vmm_error: u32,
}

/// Slice the launch measurement out of a raw report.
///
/// # Errors
/// Returns `EvidenceError::InputError` for a short report buffer.
pub fn measurement_from_report(report: &[u8]) -> Result<Vec<u8>, EvidenceError> {
    let end = SNP_MEASUREMENT_OFFSET + SNP_MEASUREMENT_SIZE;
    if report.len() < end {
        return Err(EvidenceError::InputError(format!(
            "SNP report too short: {} bytes, measurement ends at {}",
            report.len(),
            end
        )));
    }
    Ok(report[SNP_MEASUREMENT_OFFSET..end].to_vec())
}

#[cfg(target_os = "linux")]
mod ioctl {
    use super::*;

    use std::fs::File;
    use std::os::fd::AsRawFd;
    use std::ptr;

    nix::ioctl_readwrite!(snp_get_report_ioctl, b'S', 0x0, SnpGuestRequestIoctl);

    /// Issue SNP_GET_REPORT and return the attestation report bytes.
    pub fn get_snp_report(
        report_data: [u8; SNP_REPORT_DATA_LEN],
        vmpl: u32,
    ) -> Result<Vec<u8>, EvidenceError> {
        let device = File::options()
            .read(true)
            .write(true)
            .open(TEE_SEV_PATH)
            .map_err(|e| {
                EvidenceError::InternalError(format!("Failed to open {}: {}", TEE_SEV_PATH, e))
            })?;

        let request = SnpReportReq {
            user_data: report_data,
            vmpl,
            rsvd: [0u8; 28],
        };
        let mut response = SnpReportResp { data: [0u8; 4000] };

        let mut guest_request = SnpGuestRequestIoctl {
            msg_version: 1,
            _pad: [0u8; 7],
            req_data: ptr::addr_of!(request) as u64,
            resp_data: ptr::addr_of_mut!(response) as u64,
            fw_error: 0,
            vmm_error: 0,
        };

        unsafe { snp_get_report_ioctl(device.as_raw_fd(), &mut guest_request) }.map_err(|e| {
            EvidenceError::InternalError(format!(
                "SNP_GET_REPORT ioctl failed: {} (fw_error=0x{:08X}, vmm_error=0x{:08X})",
                e, guest_request.fw_error, guest_request.vmm_error
            ))
        })?;

        Ok(response.data[..SNP_REPORT_SIZE].to_vec())
    }
}

#[cfg(target_os = "linux")]
pub use ioctl::get_snp_report;

#[cfg(not(target_os = "linux"))]
pub fn get_snp_report(
    _report_data: [u8; SNP_REPORT_DATA_LEN],
    _vmpl: u32,
) -> Result<Vec<u8>, EvidenceError> {
    Err(EvidenceError::InternalError(
        "SEV-SNP report retrieval is only available on Linux".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_request_struct_sizes() {
        // user_data(64) + vmpl(4) + rsvd(28)
        assert_eq!(size_of::<SnpReportReq>(), 96);
        assert_eq!(size_of::<SnpReportResp>(), 4000);
        // msg_version(1) + pad(7) + req(8) + resp(8) + fw(4) + vmm(4)
        assert_eq!(size_of::<SnpGuestRequestIoctl>(), 32);
    }

    #[test]
    fn test_report_field_offsets() {
        assert!(SNP_REPORT_DATA_OFFSET + SNP_REPORT_DATA_LEN <= SNP_REPORT_SIZE);
        assert!(SNP_MEASUREMENT_OFFSET + SNP_MEASUREMENT_SIZE <= SNP_REPORT_SIZE);
    }

    #[test]
    fn test_measurement_slicing() {
        let mut report = vec![0u8; SNP_REPORT_SIZE];
        report[SNP_MEASUREMENT_OFFSET..SNP_MEASUREMENT_OFFSET + SNP_MEASUREMENT_SIZE].fill(0x7E);
        assert_eq!(
            measurement_from_report(&report).unwrap(),
            vec![0x7E; SNP_MEASUREMENT_SIZE]
        );
        assert!(measurement_from_report(&report[..100]).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_get_snp_report_without_device() {
        // Only meaningful outside an SNP guest.
        if !std::path::Path::new(TEE_SEV_PATH).exists() {
            assert!(get_snp_report([0u8; SNP_REPORT_DATA_LEN], 0).is_err());
        }
    }
}
