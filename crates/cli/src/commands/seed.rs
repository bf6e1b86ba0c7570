use crate::commands::CommandResult;
use procura_core::config::{AppConfig, LoadOptions};
use procura_db::{connect_with_settings, migrations, DemoSeedDataset};

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

        let seed_result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if verification.all_present {
            Ok(seed_result)
        } else {
            Err(("seed_verification", verification_message(&verification.checks), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seed_result) => {
            let tender_lines: Vec<String> = seed_result
                .tenders_seeded
                .iter()
                .map(|t| format!("  - {} ({}): {}", t.tender_id, t.code, t.description))
                .collect();
            let message = format!(
                "demo dataset loaded: {} tenders, {} proposals\n{}",
                seed_result.tenders_seeded.len(),
                seed_result.proposals_seeded,
                tender_lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "some seed data failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks =
            [("tender-demo-001", true), ("seed-proposals", false), ("no-seeded-approvals", false)];
        assert_eq!(
            verification_message(&checks),
            "seed verification failed for checks: seed-proposals, no-seeded-approvals"
        );
    }

    #[test]
    fn verification_error_message_falls_back_when_no_labels() {
        let checks = [("tender-demo-001", true)];
        assert_eq!(verification_message(&checks), "some seed data failed to load");
    }
}
