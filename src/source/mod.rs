// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record sources: where activity records come from.
//!
//! The cache depends only on the narrow [`RecordSource`] capability. The
//! HTTP adapter for the real upstream lives in the host application;
//! [`MemorySource`] is an in-process implementation for tests and demos.

pub mod traits;
pub mod memory;

pub use traits::{FetchRequest, RecordSource, SourceError};
pub use memory::MemorySource;
