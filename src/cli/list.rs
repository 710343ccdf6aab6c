//! # List Command
//!
//! Command to list Movies resources.

use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use movie_rating_controller::crd::{Movies, ResourceKey};

const PENDING: &str = "<pending>";

/// List Movies resources as a table of namespace, name, movie and rating
pub async fn list_command(
    client: Client,
    namespace: Option<String>,
    all_namespaces: bool,
) -> Result<()> {
    let api: Api<Movies> = if all_namespaces {
        println!("Listing Movies resources in all namespaces...");
        Api::all(client)
    } else if let Some(ns) = &namespace {
        println!("Listing Movies resources in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing Movies resources in the default namespace...");
        Api::default_namespaced(client)
    };

    let movies = api
        .list(&ListParams::default())
        .await
        .context("Failed to list Movies resources")?;

    if movies.items.is_empty() {
        println!("No Movies resources found.");
        return Ok(());
    }

    println!();
    for line in render_table(&movies.items) {
        println!("{line}");
    }

    Ok(())
}

fn render_table(items: &[Movies]) -> Vec<String> {
    let mut rows: Vec<(ResourceKey, &str, &str)> = items
        .iter()
        .map(|m| {
            (
                ResourceKey::from_resource(m),
                m.spec.movie_name.as_str(),
                m.rating().unwrap_or(PENDING),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut lines = vec![
        format!("{:<20} {:<30} {:<30} {:<10}", "NAMESPACE", "NAME", "MOVIE", "RATING"),
        "-".repeat(93),
    ];
    lines.extend(rows.into_iter().map(|(key, movie, rating)| {
        format!("{:<20} {:<30} {:<30} {:<10}", key.namespace, key.name, movie, rating)
    }));
    lines
}
