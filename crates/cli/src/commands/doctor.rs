use std::path::Path;

use chowbot_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{escape_json, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const CONFIG_DEPENDENT_CHECKS: [&str; 5] = [
    "discord_token_readiness",
    "places_credentials",
    "generator_credentials",
    "nutrition_credentials",
    "storage_directories",
];

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_discord_token(&config));
            checks.push(required_credential(
                "places_credentials",
                config.gateway.google_api_key().is_some(),
                "GOOGLE_API_KEY",
            ));
            checks.push(optional_credential(
                "generator_credentials",
                config.llm.api_key().is_some(),
                "LLM_API_KEY",
                "answers fall back to fixed failure messages",
            ));
            checks.push(optional_credential(
                "nutrition_credentials",
                config.gateway.usda_api_key().is_some(),
                "USDA_API_KEY",
                "nutrition lookups are disabled",
            ));
            checks.push(check_storage(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in CONFIG_DEPENDENT_CHECKS {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all required readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_discord_token(config: &AppConfig) -> DoctorCheck {
    match config.discord.require_token() {
        Ok(_) => DoctorCheck {
            name: "discord_token_readiness",
            status: CheckStatus::Pass,
            details: "bot token present".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "discord_token_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn required_credential(name: &'static str, present: bool, env_key: &str) -> DoctorCheck {
    if present {
        DoctorCheck { name, status: CheckStatus::Pass, details: format!("{env_key} present") }
    } else {
        DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("{env_key} is required"),
        }
    }
}

/// Missing optional keys degrade features, so they are reported as skipped.
fn optional_credential(
    name: &'static str,
    present: bool,
    env_key: &str,
    consequence: &str,
) -> DoctorCheck {
    if present {
        DoctorCheck { name, status: CheckStatus::Pass, details: format!("{env_key} present") }
    } else {
        DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: format!("{env_key} not set; {consequence}"),
        }
    }
}

fn check_storage(config: &AppConfig) -> DoctorCheck {
    let paths = [&config.storage.wishlist_path, &config.storage.style_path];
    for path in paths {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !directory.is_dir() {
            return DoctorCheck {
                name: "storage_directories",
                status: CheckStatus::Fail,
                details: format!("directory `{}` for `{}` does not exist", directory.display(), path.display()),
            };
        }
    }

    DoctorCheck {
        name: "storage_directories",
        status: CheckStatus::Pass,
        details: format!(
            "wishlist `{}` and style `{}` directories exist",
            config.storage.wishlist_path.display(),
            config.storage.style_path.display()
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
