// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod snapshot;
pub mod tabular;

pub use snapshot::{RestoreSummary, SNAPSHOT_VERSION, Snapshot, SnapshotData};
pub use tabular::{CsvRow, NameIndex};
