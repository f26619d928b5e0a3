//! The example prompt batch run by `adopilot run`.

use adopilot_core::config::PromptsConfig;

/// The ten example prompts, filled from `config`.
pub fn example_prompts(config: &PromptsConfig) -> Vec<String> {
    let PromptsConfig {
        project,
        team,
        work_item_id,
        repository,
        ..
    } = config;

    vec![
        "Get list of all projects in my Azure DevOps organization".to_string(),
        format!("Get my work items for project {project}"),
        format!("Get list of teams for project {project}"),
        format!(
            "Get work item {work_item_id} and show me the fields: ID, Type, State, Title, \
             Assigned To, and Priority. Also get all comments and summarize them."
        ),
        format!("Get backlogs for {project} project and {team} team, then show me the Stories backlog"),
        format!(
            "Create a new Task in project {project} with title 'Update documentation' \
             and description 'Need to update API documentation with latest changes'"
        ),
        format!(
            "Update work item {work_item_id}: set State to 'Active', \
             Priority to 2, and add a comment 'Working on this now'"
        ),
        format!("List all active pull requests for project {project} and repository {repository}"),
        format!("Get list of wikis in project {project}"),
        format!(
            "For project {project} and team {team}: \
             1. Get the current iteration \
             2. List all unassigned bugs with priority 1 or 2 \
             3. Show me the top 5 by creation date"
        ),
    ]
}

/// The configured custom prompt, or the repository listing for the project.
pub fn custom_prompt(config: &PromptsConfig) -> String {
    match &config.custom_prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt.clone(),
        _ => format!("List all the repositories in {} project", config.project),
    }
}

/// Examples followed by the custom prompt.
pub fn batch(config: &PromptsConfig) -> Vec<String> {
    let mut prompts = example_prompts(config);
    prompts.push(custom_prompt(config));
    prompts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PromptsConfig {
        PromptsConfig {
            project: "Fabrikam".into(),
            team: "Fabrikam Team".into(),
            work_item_id: 42,
            repository: "fabrikam-web".into(),
            custom_prompt: None,
        }
    }

    #[test]
    fn test_batch_has_examples_then_custom() {
        let prompts = batch(&config());
        assert_eq!(prompts.len(), 11);
        assert_eq!(prompts[0], "Get list of all projects in my Azure DevOps organization");
        assert_eq!(prompts[10], "List all the repositories in Fabrikam project");
    }

    #[test]
    fn test_templating() {
        let prompts = example_prompts(&config());
        assert_eq!(prompts[1], "Get my work items for project Fabrikam");
        assert!(prompts[3].starts_with("Get work item 42 and show me the fields: ID, Type, State, Title, Assigned To"));
        assert_eq!(
            prompts[4],
            "Get backlogs for Fabrikam project and Fabrikam Team team, then show me the Stories backlog"
        );
        assert_eq!(
            prompts[7],
            "List all active pull requests for project Fabrikam and repository fabrikam-web"
        );
        assert_eq!(
            prompts[9],
            "For project Fabrikam and team Fabrikam Team: 1. Get the current iteration \
             2. List all unassigned bugs with priority 1 or 2 3. Show me the top 5 by creation date"
        );
    }

    #[test]
    fn test_custom_prompt_override() {
        let mut cfg = config();
        cfg.custom_prompt = Some("Show the wiki pages of Fabrikam".into());
        assert_eq!(custom_prompt(&cfg), "Show the wiki pages of Fabrikam");

        cfg.custom_prompt = Some("   ".into());
        assert_eq!(custom_prompt(&cfg), "List all the repositories in Fabrikam project");
    }

    #[test]
    fn test_defaults_use_placeholders() {
        let prompts = batch(&PromptsConfig::default());
        assert_eq!(prompts[1], "Get my work items for project your-project-name");
        assert!(prompts[3].contains("12345"));
    }
}
