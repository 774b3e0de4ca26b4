//! Error types for scene loading and lookup.
//!
//! Only asset I/O and id lookups are fallible; the sampling hot path never
//! surfaces errors, it uses internal control flow (clamps, caps, `Option`).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to load mesh {path}: {source}")]
    Mesh {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("mesh {path} contains no triangles")]
    EmptyMesh { path: PathBuf },

    #[error("failed to load skydome {path}: {source}")]
    Skydome {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unknown model id {0}")]
    UnknownModel(u32),
}
