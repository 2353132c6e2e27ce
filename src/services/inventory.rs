//! Server inventory fetching and group/tag selection.
//!
//! The filtering itself is pure (`filter_servers`); `InventoryFetcher` only
//! gathers the selection criteria from the environment or the operator.

use crate::config::DEFAULT_PROJECT_NAME;
use crate::models::{ApiCredential, JinnError, JinnResult, ServerRecord};
use crate::services::api_client::JinnApiClient;
use crate::services::context::RunContext;
use crate::utils::Prompter;
use std::collections::{BTreeSet, HashSet};

/// Parsed group or tag choice
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    All,
    /// 1-based indices into the displayed menu, all in range
    Indices(Vec<usize>),
}

/// Which servers to keep; `None` means no restriction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCriteria {
    pub groups: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Active servers of the selected project, plus the project name for naming files
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySelection {
    pub project_name: String,
    pub servers: Vec<ServerRecord>,
}

impl Default for InventorySelection {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            servers: Vec::new(),
        }
    }
}

/// Parse `"*"`, an empty line, or space-separated 1-based indices
pub fn parse_selection(input: &str, len: usize) -> Result<Selection, String> {
    let input = input.trim();
    if input.is_empty() || input == "*" {
        return Ok(Selection::All);
    }

    let mut indices = Vec::new();
    for part in input.split_whitespace() {
        let index: usize = part
            .parse()
            .map_err(|_| "Please enter valid numbers or '*'.".to_string())?;
        if index == 0 || index > len {
            return Err(format!(
                "Invalid choice {}. Please select numbers between 1 and {}.",
                index, len
            ));
        }
        indices.push(index);
    }
    Ok(Selection::Indices(indices))
}

/// Resolve a selection against the menu it was made from
pub fn select_names(selection: &Selection, names: &[String]) -> Vec<String> {
    match selection {
        Selection::All => names.to_vec(),
        Selection::Indices(indices) => indices.iter().map(|i| names[i - 1].clone()).collect(),
    }
}

/// Sorted distinct group names
pub fn groups_from(records: &[ServerRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(ServerRecord::group_name)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted distinct tags, skipping blank ones
pub fn tags_from<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ServerRecord>,
{
    records
        .into_iter()
        .flat_map(|record| record.tags.iter())
        .filter(|tag| !tag.trim().is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// First non-empty project name in response order, else `"default"`
pub fn project_name(records: &[ServerRecord]) -> String {
    records
        .iter()
        .find_map(ServerRecord::project_name)
        .unwrap_or(DEFAULT_PROJECT_NAME)
        .to_string()
}

/// Active servers in the selected groups carrying any selected tag, in API order
pub fn filter_servers(records: &[ServerRecord], criteria: &SelectionCriteria) -> Vec<ServerRecord> {
    let groups: Option<HashSet<&str>> = criteria
        .groups
        .as_ref()
        .map(|g| g.iter().map(String::as_str).collect());
    let tags: Option<HashSet<&str>> = criteria
        .tags
        .as_ref()
        .map(|t| t.iter().map(String::as_str).collect());

    records
        .iter()
        .filter(|record| record.is_active)
        .filter(|record| match &groups {
            Some(groups) => record.group_name().is_some_and(|g| groups.contains(g)),
            None => true,
        })
        .filter(|record| match &tags {
            Some(tags) => record.tags.iter().any(|t| tags.contains(t.as_str())),
            None => true,
        })
        .cloned()
        .collect()
}

pub struct InventoryFetcher<'a> {
    api: &'a JinnApiClient,
    ctx: &'a RunContext,
    prompter: &'a dyn Prompter,
}

impl<'a> InventoryFetcher<'a> {
    pub fn new(api: &'a JinnApiClient, ctx: &'a RunContext, prompter: &'a dyn Prompter) -> Self {
        Self { api, ctx, prompter }
    }

    /// Fetch and filter the inventory. Errors are logged and yield an empty selection.
    pub async fn fetch(
        &self,
        credential: &ApiCredential,
        preselected_group: Option<&str>,
    ) -> InventorySelection {
        match self.try_fetch(credential, preselected_group).await {
            Ok(selection) => selection,
            Err(e) => {
                log::error!("[inventory] {} error: {}", e.error_type(), e);
                InventorySelection::default()
            }
        }
    }

    pub async fn try_fetch(
        &self,
        credential: &ApiCredential,
        preselected_group: Option<&str>,
    ) -> JinnResult<InventorySelection> {
        let records = self.api.fetch_inventory(credential).await?;
        log::info!("[inventory] Received {} servers", records.len());

        let project_name = project_name(&records);
        let servers = self.select(&records, preselected_group)?;
        Ok(InventorySelection {
            project_name,
            servers,
        })
    }

    /// Gather group and tag criteria, then filter
    pub fn select(
        &self,
        records: &[ServerRecord],
        preselected_group: Option<&str>,
    ) -> JinnResult<Vec<ServerRecord>> {
        let groups = match preselected_group {
            Some(group) => vec![group.to_string()],
            None => self.choose_groups(&groups_from(records))?,
        };
        log::info!("[inventory] Selected groups: {}", groups.join(", "));

        let mut criteria = SelectionCriteria {
            groups: Some(groups),
            tags: None,
        };
        let in_groups = filter_servers(records, &criteria);

        let tags = tags_from(&in_groups);
        if tags.is_empty() {
            return Ok(in_groups);
        }
        criteria.tags = self.choose_tags(&tags)?;
        if let Some(tags) = &criteria.tags {
            log::info!("[inventory] Selected tags: {}", tags.join(", "));
        }
        Ok(filter_servers(&in_groups, &criteria))
    }

    fn choose_groups(&self, groups: &[String]) -> JinnResult<Vec<String>> {
        log::info!("[inventory] Available groups (sorted alphabetically):");
        for (i, group) in groups.iter().enumerate() {
            log::info!("{:>2}. {}", i + 1, group);
        }

        if let Some(preset) = &self.ctx.config().groups {
            match parse_selection(preset, groups.len()) {
                Ok(selection) => return Ok(select_names(&selection, groups)),
                Err(e) => log::warn!("[inventory] Ignoring JINN_GROUPS={:?}: {}", preset, e),
            }
        }

        let max_attempts = self.ctx.config().max_selection_attempts;
        let mut attempts = 0;
        loop {
            let answer = self.prompter.input(
                "Enter group numbers (space-separated) or '*' for all groups",
                None,
            )?;
            match parse_selection(&answer, groups.len()) {
                Ok(selection) => return Ok(select_names(&selection, groups)),
                Err(e) => log::warn!("[inventory] {}", e),
            }

            attempts += 1;
            if max_attempts.is_some_and(|max| attempts >= max) {
                return Err(JinnError::Prompt {
                    message: format!("no valid group selection after {} attempts", attempts),
                });
            }
        }
    }

    /// `None` keeps every tag
    fn choose_tags(&self, tags: &[String]) -> JinnResult<Option<Vec<String>>> {
        log::info!("[inventory] Available tags (sorted alphabetically):");
        for (i, tag) in tags.iter().enumerate() {
            log::info!("{:>2}. {}", i + 1, tag);
        }

        let answer = match &self.ctx.config().tags {
            Some(preset) => preset.clone(),
            None => self
                .prompter
                .input("Select tags (space-separated), '*' or Enter for all", None)?,
        };

        Ok(parse_tag_selection(&answer, tags))
    }
}

/// Tag choices are lenient: out-of-range indices are dropped and
/// unparsable input keeps every tag.
pub fn parse_tag_selection(input: &str, tags: &[String]) -> Option<Vec<String>> {
    let input = input.trim();
    if input.is_empty() || input == "*" {
        return None;
    }

    let indices: Result<Vec<usize>, _> = input.split_whitespace().map(str::parse).collect();
    match indices {
        Ok(indices) => Some(
            indices
                .into_iter()
                .filter(|i| (1..=tags.len()).contains(i))
                .map(|i| tags[i - 1].clone())
                .collect(),
        ),
        Err(_) => {
            log::warn!("[inventory] Invalid tag selection, keeping all servers");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupRef;

    fn record(host: &str, group: &str, tags: &[&str], active: bool) -> ServerRecord {
        ServerRecord {
            ssh_hostname: host.to_string(),
            ssh_user: Some("deploy".to_string()),
            ssh_port: None,
            group: Some(GroupRef {
                name_en: Some(group.to_string()),
                project: None,
            }),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_active: active,
            bastion: None,
            ssh_key: None,
            attributes: Default::default(),
        }
    }

    fn sample() -> Vec<ServerRecord> {
        vec![
            record("web1", "staging", &["web"], true),
            record("db1", "prod", &["db"], true),
            record("web2", "prod", &["web", " "], true),
            record("db2", "prod", &["db"], true),
            record("old", "prod", &["db"], false),
        ]
    }

    #[test]
    fn test_groups_sorted_distinct() {
        assert_eq!(groups_from(&sample()), vec!["prod", "staging"]);
    }

    #[test]
    fn test_tags_skip_blank() {
        assert_eq!(tags_from(&sample()), vec!["db", "web"]);
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("*", 2), Ok(Selection::All));
        assert_eq!(parse_selection("  ", 2), Ok(Selection::All));
        assert_eq!(parse_selection("2 1", 2), Ok(Selection::Indices(vec![2, 1])));
        assert!(parse_selection("0", 2).is_err());
        assert!(parse_selection("3", 2).is_err());
        assert!(parse_selection("one", 2).is_err());
    }

    #[test]
    fn test_group_index_maps_to_name() {
        let groups = groups_from(&sample());
        for index in 1..=groups.len() {
            let selection = parse_selection(&index.to_string(), groups.len()).unwrap();
            assert_eq!(select_names(&selection, &groups), vec![groups[index - 1].clone()]);
        }
    }

    #[test]
    fn test_filter_excludes_inactive_and_keeps_order() {
        let criteria = SelectionCriteria {
            groups: Some(vec!["prod".to_string()]),
            tags: Some(vec!["db".to_string()]),
        };
        let hosts: Vec<String> = filter_servers(&sample(), &criteria)
            .into_iter()
            .map(|r| r.ssh_hostname)
            .collect();
        assert_eq!(hosts, vec!["db1", "db2"]);
    }

    #[test]
    fn test_filter_without_criteria_still_drops_inactive() {
        let all = filter_servers(&sample(), &SelectionCriteria::default());
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|r| r.is_active));
    }

    #[test]
    fn test_parse_tag_selection_is_lenient() {
        let tags = vec!["db".to_string(), "web".to_string()];
        assert_eq!(parse_tag_selection("", &tags), None);
        assert_eq!(parse_tag_selection("*", &tags), None);
        assert_eq!(parse_tag_selection("x", &tags), None);
        assert_eq!(parse_tag_selection("1 9", &tags), Some(vec!["db".to_string()]));
        assert_eq!(parse_tag_selection("9", &tags), Some(vec![]));
    }

    #[test]
    fn test_project_name() {
        let mut records = sample();
        assert_eq!(project_name(&records), "default");
        records[1].group.as_mut().unwrap().project = Some(crate::models::ProjectRef {
            name_en: Some("atlas".to_string()),
        });
        assert_eq!(project_name(&records), "atlas");
    }
}
