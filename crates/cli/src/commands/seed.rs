use crate::commands::CommandResult;
use helioflow_core::config::{AppConfig, LoadOptions};
use helioflow_db::{connect_with_settings, migrations, seed_demo_data, SeedResult};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
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
                "seed",
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

        let seed_result = seed_demo_data(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<SeedResult, (&'static str, String, u8)>(seed_result)
    });

    match result {
        Ok(seed_result) => {
            let message = render_summary(&seed_result);
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn render_summary(result: &SeedResult) -> String {
    if result.already_seeded {
        return "step catalog already populated; nothing to seed".to_string();
    }
    format!(
        "seeded {} step definitions, {} demo lead with {} timeline steps",
        result.step_definitions_created, result.leads_created, result.timeline_steps_created
    )
}

#[cfg(test)]
mod tests {
    use helioflow_db::SeedResult;

    use super::render_summary;

    #[test]
    fn summary_reports_created_counts() {
        let message = render_summary(&SeedResult {
            step_definitions_created: 8,
            leads_created: 1,
            timeline_steps_created: 8,
            already_seeded: false,
        });
        assert_eq!(message, "seeded 8 step definitions, 1 demo lead with 8 timeline steps");
    }

    #[test]
    fn summary_notes_when_already_seeded() {
        let message = render_summary(&SeedResult {
            step_definitions_created: 0,
            leads_created: 0,
            timeline_steps_created: 0,
            already_seeded: true,
        });
        assert_eq!(message, "step catalog already populated; nothing to seed");
    }
}
