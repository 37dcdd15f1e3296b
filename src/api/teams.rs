// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::ApiClient;
use crate::error::ApiResult;
use crate::types::{Team, TeamPayload, NOT_AVAILABLE};

/// The dashboard never shows more than this many teams.
pub const DASHBOARD_TEAM_LIMIT: usize = 20;

impl ApiClient {
    pub async fn list_teams(&self) -> ApiResult<Vec<Team>> {
        self.get(&["teams"]).await
    }

    pub async fn get_team(&self, id: i64) -> ApiResult<Team> {
        self.get(&["teams", &id.to_string()]).await
    }

    pub async fn create_team(&self, payload: &TeamPayload) -> ApiResult<Option<Team>> {
        let created: Option<Team> = self.post(&["teams"], payload).await?;
        tracing::info!("TEAM_CREATED | name={} persons={}", payload.name, payload.num_persons);
        Ok(created)
    }

    pub async fn update_team(&self, id: i64, payload: &TeamPayload) -> ApiResult<Option<Team>> {
        let updated: Option<Team> = self.put(&["teams", &id.to_string()], payload).await?;
        tracing::info!("TEAM_UPDATED | id={} name={}", id, payload.name);
        Ok(updated)
    }
}

/// Teams shown on the dashboard, in backend order.
pub fn dashboard_teams(teams: &[Team]) -> &[Team] {
    &teams[..teams.len().min(DASHBOARD_TEAM_LIMIT)]
}

/// Name of team `id`, or `N/A` when it is not in the list.
pub fn team_name(teams: &[Team], id: i64) -> &str {
    teams
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.name.as_str())
        .unwrap_or(NOT_AVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_limit() {
        let teams: Vec<Team> = (1..=25).map(|id| Team { id, ..Team::default() }).collect();
        assert_eq!(dashboard_teams(&teams).len(), DASHBOARD_TEAM_LIMIT);
        assert_eq!(dashboard_teams(&teams[..3]).len(), 3);
    }

    #[test]
    fn test_team_name_lookup() {
        let teams = vec![Team { id: 2, name: "Costura".into(), ..Team::default() }];
        assert_eq!(team_name(&teams, 2), "Costura");
        assert_eq!(team_name(&teams, 7), NOT_AVAILABLE);
    }
}
