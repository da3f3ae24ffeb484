// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod backup;
pub mod bills;
pub mod categories;
pub mod config;
pub mod doctor;
pub mod exporter;
pub mod importer;
pub mod methods;
pub mod owners;
pub mod quick;
pub mod stats;
