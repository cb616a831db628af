//! Argument builders for the `npm trust` subcommands.

use crate::types::DesiredBinding;

/// `trust list --json <pkg> [--registry <url>]`
pub fn list_args(package: &str, registry: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "trust".to_string(),
        "list".to_string(),
        "--json".to_string(),
        package.to_string(),
    ];
    push_registry(&mut args, registry);
    args
}

/// `trust revoke --id <id> <pkg> [--registry <url>]`
pub fn revoke_args(id: &str, package: &str, registry: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "trust".to_string(),
        "revoke".to_string(),
        "--id".to_string(),
        id.to_string(),
        package.to_string(),
    ];
    push_registry(&mut args, registry);
    args
}

/// `trust <provider> <pkg> <--repo|--project> <repo> --file <file> --yes [--env <env>] [--registry <url>]`
///
/// The environment claim only applies to creation.
pub fn create_args(
    package: &str,
    desired: &DesiredBinding,
    env: Option<&str>,
    registry: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "trust".to_string(),
        desired.provider.trust_subcommand().to_string(),
        package.to_string(),
        desired.provider.repository_flag().to_string(),
        desired.repository.clone(),
        "--file".to_string(),
        desired.pipeline_file.clone(),
        "--yes".to_string(),
    ];
    if let Some(env) = env {
        args.push("--env".to_string());
        args.push(env.to_string());
    }
    push_registry(&mut args, registry);
    args
}

fn push_registry(args: &mut Vec<String>, registry: Option<&str>) {
    if let Some(registry) = registry {
        args.push("--registry".to_string());
        args.push(registry.to_string());
    }
}
