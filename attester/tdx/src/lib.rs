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

//! Intel TDX evidence backend.
//!
//! Retrieves TDREPORT structures and TD quotes through the guest device
//! ioctls, reads RTMR measurements out of the TDREPORT, and serves the CCEL
//! measured-boot log.

pub mod attester;
pub mod quote;
pub mod report;

pub use attester::{TdxAttester, TdxAttesterConfig};
pub use report::TdxVersion;
