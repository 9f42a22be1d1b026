use indexmap::IndexSet;
use tracing::warn;

use crate::{
    dto::roster::MetadataResponse,
    services::persistence::bounded,
    state::{SharedState, roster::Division},
};

/// Age groups and seasons to suggest in the admin UI: configured values merged with every
/// division in storage (or in the snapshot while storage is unreachable).
pub async fn metadata(state: &SharedState) -> MetadataResponse {
    let divisions = match state.repository().await {
        Some(repository) => match bounded(state, repository.list(None)).await {
            Ok(divisions) => divisions,
            Err(err) => {
                warn!(error = %err, "failed to list divisions for metadata; using snapshot");
                state.rosters().list(None).await
            }
        },
        None => state.rosters().list(None).await,
    };

    let config = state.config();
    collect(config.age_groups(), config.default_season(), &divisions)
}

fn collect(age_groups: &[String], default_season: &str, divisions: &[Division]) -> MetadataResponse {
    let age_groups: IndexSet<String> = age_groups
        .iter()
        .cloned()
        .chain(divisions.iter().map(|d| d.age_group.clone()))
        .collect();

    let mut seasons: Vec<String> = std::iter::once(default_season.to_owned())
        .chain(divisions.iter().map(|d| d.season.clone()))
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();
    seasons.sort_by(|a, b| b.cmp(a));

    MetadataResponse {
        age_groups: age_groups.into_iter().collect(),
        seasons,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::roster_store::memory::InMemoryRosterStore,
        state::AppState,
    };

    #[test]
    fn merges_configured_and_stored_values() {
        let configured = vec!["U11".to_string(), "U13".to_string()];
        let divisions = vec![
            Division::new("U13", "2024"),
            Division::new("Masters", "2025"),
            Division::new("U11", "2024"),
        ];

        let metadata = collect(&configured, "2026", &divisions);

        assert_eq!(metadata.age_groups, ["U11", "U13", "Masters"]);
        assert_eq!(metadata.seasons, ["2026", "2025", "2024"]);
    }

    #[tokio::test]
    async fn reads_divisions_from_storage() {
        let config = AppConfig::from_json(r#"{ "defaultSeason": "2026", "ageGroups": ["U15"] }"#)
            .unwrap();
        let state = AppState::new(config);
        let repository = InMemoryRosterStore::with_documents([Division::new("U17", "2023")]);
        state.set_repository(Arc::new(repository)).await;

        let metadata = metadata(&state).await;

        assert_eq!(metadata.age_groups, ["U15", "U17"]);
        assert_eq!(metadata.seasons, ["2026", "2023"]);
    }
}
