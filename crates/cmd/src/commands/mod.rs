// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod read;
pub mod registry;
pub mod write;

pub use read::read_command;
pub use registry::registry_command;
pub use write::write_command;
