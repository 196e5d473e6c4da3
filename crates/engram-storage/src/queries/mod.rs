// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the Engram storage entities.

pub mod messages;
pub mod metadata;
pub mod sessions;
pub mod summaries;
pub mod vectors;
