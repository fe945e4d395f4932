// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for tokens, queue stats and ephemeral entries.

pub mod dispatch;
pub mod ephemeral;
pub mod lifecycle;
pub mod snapshot;
pub mod stats;
pub mod tokens;
