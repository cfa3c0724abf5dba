//! Handler for `depot resolve`.

use std::path::Path;

use miette::Result;

use depot_ops::ops_resolve::{self, ResolveOptions};
use depot_util::errors::DepotError;

pub async fn exec(file: &Path, no_tree: bool, depth: Option<usize>, json: bool) -> Result<()> {
    if !file.is_file() {
        return Err(DepotError::Config {
            message: format!("Request file {} not found", file.display()),
        }
        .into());
    }

    let opts = ResolveOptions {
        no_tree,
        depth,
        json,
    };

    ops_resolve::resolve(file, &opts).await
}
