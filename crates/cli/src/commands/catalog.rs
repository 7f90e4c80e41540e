use helioflow_core::config::{AppConfig, LoadOptions};
use helioflow_core::domain::step::StepDefinition;
use helioflow_db::repositories::{SqlStepCatalogRepository, StepCatalogRepository};
use helioflow_db::{connect_with_settings, migrations};

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "catalog",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "catalog",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let definitions = SqlStepCatalogRepository::new(pool.clone())
            .list()
            .await
            .map_err(|error| ("catalog_query", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<Vec<StepDefinition>, (&'static str, String, u8)>(definitions)
    });

    match result {
        Ok(definitions) => CommandResult::success("catalog", render_catalog(&definitions)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("catalog", error_class, message, exit_code)
        }
    }
}

fn render_catalog(definitions: &[StepDefinition]) -> String {
    if definitions.is_empty() {
        return "step catalog is empty; run `helioflow seed` to load the demo pipeline"
            .to_string();
    }

    let mut lines = vec![format!("{} step definitions:", definitions.len())];
    for definition in definitions {
        let roles = definition
            .allowed_roles
            .iter()
            .map(|role| role.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "  {:>6}  {}  [{}]{}",
            definition.order_index,
            definition.name,
            roles,
            if definition.remarks_required { "  remarks required" } else { "" }
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use helioflow_core::domain::role::Role;
    use helioflow_core::domain::step::{StepDefinition, StepDefinitionId};

    use super::render_catalog;

    #[test]
    fn empty_catalog_suggests_seeding() {
        let message = render_catalog(&[]);
        assert!(message.contains("helioflow seed"));
    }

    #[test]
    fn catalog_lines_show_order_name_and_roles() {
        let definitions = vec![StepDefinition {
            id: StepDefinitionId("sd-1".to_string()),
            name: "Site Survey".to_string(),
            order_index: 2000,
            allowed_roles: [Role::Surveyor].into_iter().collect::<BTreeSet<_>>(),
            remarks_required: true,
            attachments_allowed: true,
            customer_upload_allowed: false,
        }];

        let message = render_catalog(&definitions);
        assert!(message.starts_with("1 step definitions:"));
        assert!(message.contains("2000  Site Survey  [surveyor]  remarks required"));
    }
}
