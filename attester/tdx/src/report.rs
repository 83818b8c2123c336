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

//! TDREPORT retrieval through the TDX guest device.
//!
//! TDX 1.0 (`/dev/tdx-guest`) and 1.5 (`/dev/tdx_guest`) expose the same
//! TDCALL[TDG.MR.REPORT] through differently shaped ioctl requests: 1.0
//! passes buffer pointers, 1.5 passes the buffers in line.

use evidence_api::cc_type::{TEE_TDX_1_0_PATH, TEE_TDX_1_5_PATH};
use evidence_api::EvidenceError;
use std::path::Path;

/// Length of the REPORTDATA field, fixed by the TDX module.
pub const TDX_REPORT_DATA_LEN: usize = 64;
/// Length of the TDREPORT structure, fixed by the TDX module.
pub const TDX_REPORT_LEN: usize = 1024;
/// Number of runtime measurement registers.
pub const TDX_RTMR_COUNT: u32 = 4;

// TDINFO layout inside the TDREPORT: the TDINFO region starts at 512 and
// holds attr(8), xfam(8), mrtd(48), mrconfigid(48), mrowner(48),
// mrownerconfig(48) ahead of the RTMR array.
const RTMR0_OFFSET: usize = 512 + 8 + 8 + 48 * 4;
const RTMR_SIZE: usize = 48;

/// TDX module generation, decided by which guest device node exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdxVersion {
    Tdx10,
    Tdx15,
}

impl TdxVersion {
    /// Guest device node for this generation.
    pub fn device_path(&self) -> &'static str {
        match self {
            TdxVersion::Tdx10 => TEE_TDX_1_0_PATH,
            TdxVersion::Tdx15 => TEE_TDX_1_5_PATH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TdxVersion::Tdx10 => "1.0",
            TdxVersion::Tdx15 => "1.5",
        }
    }

    /// Probe the guest device nodes.
    pub fn detect() -> Option<TdxVersion> {
        if Path::new(TEE_TDX_1_0_PATH).exists() {
            Some(TdxVersion::Tdx10)
        } else if Path::new(TEE_TDX_1_5_PATH).exists() {
            Some(TdxVersion::Tdx15)
        } else {
            None
        }
    }
}

/// TDX 1.0 report request: user-space buffers passed by address.
#[repr(C)]
pub struct TdxReportReq10 {
    pub subtype: u8,
    pub reportdata: u64,
    pub rpd_len: u32,
    pub tdreport: u64,
    pub tdr_len: u32,
}

/// TDX 1.5 report request: buffers carried in line.
#[repr(C)]
pub struct TdxReportReq15 {
    pub reportdata: [u8; TDX_REPORT_DATA_LEN],
    pub tdreport: [u8; TDX_REPORT_LEN],
}

/// Slice one RTMR value out of a raw TDREPORT.
///
/// # Errors
/// Returns `EvidenceError::InvalidMeasurementIndex` for an index beyond
/// RTMR3 and `EvidenceError::InputError` for a short report buffer.
pub fn rtmr_from_report(tdreport: &[u8], index: u32) -> Result<Vec<u8>, EvidenceError> {
    if index >= TDX_RTMR_COUNT {
        return Err(EvidenceError::InvalidMeasurementIndex {
            index,
            max: TDX_RTMR_COUNT - 1,
        });
    }

    let start = RTMR0_OFFSET + index as usize * RTMR_SIZE;
    let end = start + RTMR_SIZE;
    if tdreport.len() < end {
        return Err(EvidenceError::InputError(format!(
            "TDREPORT too short: {} bytes, RTMR{} ends at {}",
            tdreport.len(),
            index,
            end
        )));
    }

    Ok(tdreport[start..end].to_vec())
}

#[cfg(target_os = "linux")]
mod ioctl {
    use super::*;
    use std::fs::File;
    use std::os::fd::AsRawFd;
    use std::ptr;

    const TDX_CMD_GET_REPORT: u8 = 1;

    nix::ioctl_readwrite!(tdx_get_report_1_0, b'T', TDX_CMD_GET_REPORT, u64);
    nix::ioctl_readwrite!(tdx_get_report_1_5, b'T', TDX_CMD_GET_REPORT, TdxReportReq15);

    /// Issue the report ioctl and return the raw TDREPORT bytes.
    pub fn get_td_report(
        version: TdxVersion,
        report_data: [u8; TDX_REPORT_DATA_LEN],
    ) -> Result<Vec<u8>, EvidenceError> {
        let device = File::options()
            .read(true)
            .write(true)
            .open(version.device_path())
            .map_err(|e| {
                EvidenceError::InternalError(format!(
                    "Failed to open {}: {}",
                    version.device_path(),
                    e
                ))
            })?;

        match version {
            TdxVersion::Tdx10 => {
                let mut tdreport = [0u8; TDX_REPORT_LEN];
                let mut request = TdxReportReq10 {
                    subtype: 0,
                    reportdata: ptr::addr_of!(report_data) as u64,
                    rpd_len: TDX_REPORT_DATA_LEN as u32,
                    tdreport: ptr::addr_of_mut!(tdreport) as u64,
                    tdr_len: TDX_REPORT_LEN as u32,
                };

                unsafe {
                    tdx_get_report_1_0(
                        device.as_raw_fd(),
                        ptr::addr_of_mut!(request) as *mut u64,
                    )
                }
                .map_err(|e| {
                    EvidenceError::InternalError(format!("TDX report ioctl failed: {}", e))
                })?;

                Ok(tdreport.to_vec())
            }
            TdxVersion::Tdx15 => {
                let mut request = TdxReportReq15 {
                    reportdata: report_data,
                    tdreport: [0u8; TDX_REPORT_LEN],
                };

                unsafe { tdx_get_report_1_5(device.as_raw_fd(), &mut request) }.map_err(|e| {
                    EvidenceError::InternalError(format!("TDX report ioctl failed: {}", e))
                })?;

                Ok(request.tdreport.to_vec())
            }
        }
    }
}

#[cfg(target_os = "linux")]
pub use ioctl::get_td_report;

#[cfg(not(target_os = "linux"))]
pub fn get_td_report(
    _version: TdxVersion,
    _report_data: [u8; TDX_REPORT_DATA_LEN],
) -> Result<Vec<u8>, EvidenceError> {
    Err(EvidenceError::InternalError(
        "TDX report retrieval is only available on Linux".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_report_request_sizes() {
        // reportdata(64) + tdreport(1024)
        assert_eq!(size_of::<TdxReportReq15>(), 1088);
    }

    #[test]
    fn test_rtmr_offsets_within_report() {
        assert_eq!(RTMR0_OFFSET, 720);
        assert!(RTMR0_OFFSET + TDX_RTMR_COUNT as usize * RTMR_SIZE <= TDX_REPORT_LEN);
    }

    #[test]
    fn test_rtmr_slicing() {
        let mut report = vec![0u8; TDX_REPORT_LEN];
        report[RTMR0_OFFSET + RTMR_SIZE..RTMR0_OFFSET + 2 * RTMR_SIZE].fill(0x5A);

        let rtmr1 = rtmr_from_report(&report, 1).unwrap();
        assert_eq!(rtmr1, vec![0x5A; RTMR_SIZE]);
        assert_eq!(rtmr_from_report(&report, 0).unwrap(), vec![0u8; RTMR_SIZE]);
    }

    #[test]
    fn test_rtmr_index_bounds() {
        let report = vec![0u8; TDX_REPORT_LEN];
        assert!(matches!(
            rtmr_from_report(&report, 4),
            Err(EvidenceError::InvalidMeasurementIndex { index: 4, max: 3 })
        ));
    }

    #[test]
    fn test_rtmr_short_report() {
        assert!(rtmr_from_report(&[0u8; 100], 0).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_get_td_report_without_device() {
        // Only meaningful outside a TD guest.
        if TdxVersion::detect().is_none() {
            let result = get_td_report(TdxVersion::Tdx10, [0u8; TDX_REPORT_DATA_LEN]);
            assert!(result.is_err());
        }
    }
}
