// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Format adapters: model files to [`LayerRecord`](crate::LayerRecord)s.
//!
//! | Adapter | Recognises |
//! |---|---|
//! | [`ManifestAdapter`] | `{ "name", "dtype", "layers": [{ "name", "kind", ... }] }` |
//! | [`KerasAdapter`] | `model.to_json()` output (Sequential, Functional, nested) |

pub mod keras;
pub mod manifest;
pub mod sequence;

pub use keras::{activation_caption, KerasAdapter};
pub use manifest::{ManifestAdapter, ModelManifest};
pub use sequence::{list_models, Checkpoint, ModelSequence};

use crate::FormatAdapter;

/// Every adapter, in detection priority order.
pub fn all() -> [&'static dyn FormatAdapter; 2] {
    [&KerasAdapter, &ManifestAdapter]
}
