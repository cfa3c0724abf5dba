//! Operation: show the direct dependencies a descriptor declares.

use std::sync::Arc;

use depot_core::descriptor::Descriptor;
use depot_core::module::ModuleIdentifier;
use depot_maven::client::RepositoryClient;
use depot_util::errors::DepotError;

/// Fetch the descriptor for `id` from the first repository that has it.
pub async fn fetch_descriptor(
    repositories: &[Arc<dyn RepositoryClient>],
    id: &ModuleIdentifier,
) -> miette::Result<Descriptor> {
    let mut last_err = None;
    for repo in repositories {
        match repo.fetch_descriptor(id).await {
            Ok(descriptor) => {
                tracing::debug!("{id} served by {}", repo.name());
                return Ok(descriptor);
            }
            Err(e) => {
                tracing::debug!("{e}");
                last_err = Some(e);
            }
        }
    }
    Err(last_err
        .map(DepotError::from)
        .unwrap_or_else(|| DepotError::Config {
            message: "no repositories configured".to_string(),
        })
        .into())
}

/// Print the dependency specifications of `coordinate` (`group:name:version`).
pub async fn descriptor(
    coordinate: &str,
    repositories: &[Arc<dyn RepositoryClient>],
) -> miette::Result<()> {
    let id = ModuleIdentifier::parse(coordinate)?;
    let descriptor = fetch_descriptor(repositories, &id).await?;

    println!("{}", descriptor.module_identifier);
    if descriptor.dependency_specifications.is_empty() {
        println!("  (no dependencies)");
    }
    for spec in &descriptor.dependency_specifications {
        println!("  {spec}");
    }
    Ok(())
}
