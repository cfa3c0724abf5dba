//! Handler for `depot versions`.

use miette::Result;

use depot_core::config::ResolverConfig;
use depot_ops::ops_versions;

pub async fn exec(module: &str, repos: &[String]) -> Result<()> {
    let entries = depot_ops::repository_entries(repos, &ResolverConfig::default());
    let repositories = depot_ops::build_repositories(&entries, false)?;
    ops_versions::versions(module, &repositories).await
}
