// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Batch repository acquisition.
//!
//! Clonetools materializes remote repositories onto local disk, either by
//! cloning them through git or by downloading and extracting a zip archive.
//! Repositories can be acquired one at a time through the
//! [`SingleCloneController`], or as a sequential batch through the
//! [`BatchQueueRunner`].
//!
//! # Destinations
//!
//! Every acquired repository lands in a folder under a base directory. The
//! folder name is either given explicitly, or derived from the repository
//! URL, see [`remote::resolve_target_path`]. An existing folder is never
//! overwritten. Acquiring into it reports a duplicate instead.

pub mod acquire;
pub mod batch;
pub mod config;
pub mod path;
pub mod prompt;
pub mod remote;
pub mod single;
pub mod store;

pub use acquire::{AcquisitionOptions, AcquisitionResult, AcquisitionStatus, Acquirer};
pub use batch::{BatchOptions, BatchPlacementMode, BatchQueueRunner, BatchRunSummary, BatchState};
pub use config::{Config, ConfigPatch, EditorId, RepositoryDescriptor};
pub use single::SingleCloneController;
