use std::fs;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub provider_app_id: String,
    pub placement_id: String,
    pub test_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider_app_id: "6017455".into(),
            placement_id: "Interstitial_Android".into(),
            test_mode: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    provider_app_id: Option<String>,
    placement_id: Option<String>,
    test_mode: Option<bool>,
}

#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub app_id: Option<String>,
    pub placement_id: Option<String>,
    pub test_mode: Option<bool>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("shell.toml") {
        apply_file_settings(&mut settings, &raw);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileSettings>(raw) else {
        return;
    };

    if let Some(v) = file_cfg.provider_app_id {
        settings.provider_app_id = v;
    }
    if let Some(v) = file_cfg.placement_id {
        settings.placement_id = v;
    }
    if let Some(v) = file_cfg.test_mode {
        settings.test_mode = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, get: impl Fn(&str) -> Option<String>) {
    if let Some(v) = get("AD_APP_ID") {
        settings.provider_app_id = v;
    }
    if let Some(v) = get("AD_PLACEMENT_ID") {
        settings.placement_id = v;
    }
    if let Some(v) = get("AD_TEST_MODE") {
        if let Some(parsed) = parse_bool(&v) {
            settings.test_mode = parsed;
        }
    }
}

pub fn apply_cli_overrides(settings: &mut Settings, cli: CliOverrides) {
    if let Some(v) = cli.app_id {
        settings.provider_app_id = v;
    }
    if let Some(v) = cli.placement_id {
        settings.placement_id = v;
    }
    if let Some(v) = cli.test_mode {
        settings.test_mode = v;
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_dashboard_configuration() {
        let settings = Settings::default();
        assert_eq!(settings.provider_app_id, "6017455");
        assert_eq!(settings.placement_id, "Interstitial_Android");
        assert!(!settings.test_mode);
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AD_APP_ID", "999"),
            ("AD_PLACEMENT_ID", "Rewarded_Android"),
            ("AD_TEST_MODE", "true"),
        ]);

        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert_eq!(settings.provider_app_id, "999");
        assert_eq!(settings.placement_id, "Rewarded_Android");
        assert!(settings.test_mode);
    }

    #[test]
    fn cli_wins_over_env_which_wins_over_file() {
        let mut settings = Settings::default();

        apply_file_settings(
            &mut settings,
            "provider_app_id = \"file-app\"\n\
             placement_id = \"File_Placement\"\n\
             test_mode = true\n",
        );

        let env: HashMap<&str, &str> = HashMap::from([
            ("AD_APP_ID", "env-app"),
            ("AD_PLACEMENT_ID", "Env_Placement"),
        ]);
        apply_env_overrides(&mut settings, |key| {
            env.get(key).map(|v| v.to_string())
        });

        apply_cli_overrides(
            &mut settings,
            CliOverrides {
                app_id: Some("cli-app".to_string()),
                ..CliOverrides::default()
            },
        );

        // app id set at all three layers: CLI wins; placement set in file
        // and env: env wins; test mode set only in file: file wins.
        assert_eq!(settings.provider_app_id, "cli-app");
        assert_eq!(settings.placement_id, "Env_Placement");
        assert!(settings.test_mode);
    }

    #[test]
    fn unparseable_test_mode_is_ignored() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |key| {
            (key == "AD_TEST_MODE").then(|| "maybe".to_string())
        });
        assert!(!settings.test_mode);
    }

    #[test]
    fn parses_common_bool_spellings() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("definitely"), None);
    }

    #[test]
    fn partial_file_settings_keep_remaining_defaults() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "placement_id = \"Interstitial_iOS\"");

        assert_eq!(settings.placement_id, "Interstitial_iOS");
        assert_eq!(settings.provider_app_id, "6017455");
        assert!(!settings.test_mode);
    }

    #[test]
    fn malformed_file_settings_are_ignored() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "placement_id = [not toml");

        assert_eq!(settings, Settings::default());
    }
}
