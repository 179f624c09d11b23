use hashi::config::{Config, HashiConfig};
use hashi::dispatch::PrivilegePolicy;
use hashi::error::ConfigError;
use std::collections::HashMap;
use std::io::Write;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

const SAMPLE: &str = r#"{
    "projectName": "shrine",
    "intents": 513,
    "guildId": "123456789012345678",
    "channels": { "status": "223456789012345678" },
    "database": { "connectionURI": "postgres://localhost/hashi", "databaseName": "hashi_dev" },
    "privilegePolicy": "strict"
}"#;

#[test]
fn parses_project_file() {
    let file = HashiConfig::from_json(SAMPLE).unwrap();
    assert_eq!(file.project_name, "shrine");
    assert_eq!(file.intents, 513);
    assert_eq!(file.guild_id.as_deref(), Some("123456789012345678"));
    assert_eq!(file.channels.status.as_deref(), Some("223456789012345678"));
    assert_eq!(
        file.database.connection_uri.as_deref(),
        Some("postgres://localhost/hashi")
    );
    assert_eq!(file.privilege_policy, PrivilegePolicy::Strict);
}

#[test]
fn empty_document_yields_defaults() {
    assert_eq!(HashiConfig::from_json("{}").unwrap(), HashiConfig::default());
    assert!(matches!(
        HashiConfig::from_json("{ nope"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn environment_overrides_file() {
    let file = HashiConfig::from_json(SAMPLE).unwrap();
    let config = Config::resolve(
        file,
        env(&[
            ("DISCORD_TOKEN", "secret"),
            ("PROJECT_NAME", "override"),
            ("DEV_MODE", "true"),
            ("DATABASE_URL", "postgres://db/other"),
            ("GUILD_ID", "42"),
        ]),
    )
    .unwrap();
    assert_eq!(config.token, "secret");
    assert_eq!(config.project_name, "override");
    assert!(config.dev_mode);
    assert_eq!(config.database_url.as_deref(), Some("postgres://db/other"));
    assert_eq!(config.database_name.as_deref(), Some("hashi_dev"));
    assert_eq!(config.guild_id.map(|id| id.get()), Some(42));
    assert_eq!(
        config.status_channel.map(|id| id.get()),
        Some(223456789012345678)
    );
    assert!(!format!("{config:?}").contains("secret"));
}

#[test]
fn legacy_token_names_are_accepted() {
    let config = Config::resolve(HashiConfig::default(), env(&[("token", "lower")])).unwrap();
    assert_eq!(config.token, "lower");
    assert!(!config.dev_mode);
    assert!(config.guild_id.is_none());
    assert!(config.database_url.is_none());
}

#[test]
fn invalid_values_are_reported() {
    assert!(matches!(
        Config::resolve(HashiConfig::default(), env(&[])),
        Err(ConfigError::Missing("DISCORD_TOKEN"))
    ));
    assert!(matches!(
        Config::resolve(
            HashiConfig::default(),
            env(&[("TOKEN", "t"), ("DEV_MODE", "sometimes")])
        ),
        Err(ConfigError::Invalid {
            name: "DEV_MODE",
            ..
        })
    ));
    assert!(matches!(
        Config::resolve(
            HashiConfig::default(),
            env(&[("TOKEN", "t"), ("GUILD_ID", "guild")])
        ),
        Err(ConfigError::Invalid {
            name: "GUILD_ID",
            ..
        })
    ));
}

#[test]
fn reads_file_from_disk_and_tolerates_absence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hashi.config.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();

    let parsed = HashiConfig::from_path(&path).unwrap();
    assert_eq!(parsed.project_name, "shrine");

    let missing = HashiConfig::from_path(&dir.path().join("absent.json")).unwrap();
    assert_eq!(missing, HashiConfig::default());
}
