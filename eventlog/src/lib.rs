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

//! TCG measured-boot event log handling.
//!
//! Parses binary PC-Client event logs (TPM `binary_bios_measurements` files
//! and CCEL ACPI table data), supports windowed selection of the parsed
//! events, and replays them into expected measurement-register values.

pub mod byte_reader;
pub mod log;
pub mod model;
pub mod replay;

pub use crate::log::EventLog;
pub use model::{EfiSpecIdEvent, EventLogFormat, TcgEfiSpecIdEventAlgorithmSize};
pub use replay::{replay_event_log, BankReplay, EventLogReplay, ReplayError};
