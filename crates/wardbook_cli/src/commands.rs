use crate::cli::{Cli, CollectionsCommand, Command};
use anyhow::{bail, Context};
use log::info;
use serde_json::Value;
use std::path::PathBuf;
use wardbook_core::config::ENV_DB_PATH;
use wardbook_core::{
    init_from_config, parse_object_id, CollectionName, HospitalService, ListOptions, ObjectStore,
    Payload, StoreConfig,
};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let loaded = StoreConfig::load(cli.config.as_deref()).context("loading config")?;
    let config = with_required_db_path(loaded, cli.db)?;
    init_from_config(&config).context("initializing logging")?;
    info!(
        "event=cli_start module=cli status=ok mode=file command={}",
        cli.command.name()
    );

    let store = ObjectStore::open(&config).await.context("opening store")?;

    match cli.command {
        Command::Create(args) => {
            let collection = collection(&args.collection)?;
            let created = store.create(&collection, parse_payload(&args.json)?).await?;
            print_json(&created)
        }
        Command::Get(args) => {
            let collection = collection(&args.collection)?;
            let object = store.get(&collection, parse_object_id(&args.id)?).await?;
            print_json(&object)
        }
        Command::List(args) => {
            let collection = collection(&args.collection)?;
            let options = ListOptions {
                limit: args.limit,
                newest_first: args.newest_first,
            };
            print_json(&store.list_with(&collection, options).await?)
        }
        Command::Update(args) => {
            let collection = collection(&args.collection)?;
            let id = parse_object_id(&args.id)?;
            let updated = store
                .update(&collection, id, parse_payload(&args.json)?)
                .await?;
            print_json(&updated)
        }
        Command::Delete(args) => {
            let collection = collection(&args.collection)?;
            store.delete(&collection, parse_object_id(&args.id)?).await?;
            Ok(())
        }
        Command::Stats => {
            let stats = HospitalService::new(store).hospital_stats().await?;
            print_json(&stats)
        }
        Command::Collections(CollectionsCommand::List) => {
            print_json(&store.list_collections().await?)
        }
        Command::Collections(CollectionsCommand::Add { name }) => {
            store.ensure_collection(&collection(&name)?).await?;
            Ok(())
        }
    }
}

/// Applies `--db` on top of `config`. The CLI never runs against an
/// in-memory store.
pub(crate) fn with_required_db_path(
    mut config: StoreConfig,
    db: Option<PathBuf>,
) -> anyhow::Result<StoreConfig> {
    if let Some(db) = db {
        config.db_path = Some(db);
    }
    if config.db_path.is_none() {
        bail!("no database file configured; pass --db, set {ENV_DB_PATH} or `db_path` in --config");
    }
    Ok(config)
}

fn collection(raw: &str) -> anyhow::Result<CollectionName> {
    CollectionName::new(raw.trim()).with_context(|| format!("bad collection `{raw}`"))
}

pub(crate) fn parse_payload(raw: &str) -> anyhow::Result<Payload> {
    match serde_json::from_str::<Value>(raw).context("payload is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("payload must be a JSON object, got {other}"),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_payload, run_command, with_required_db_path};
    use crate::cli::Cli;
    use clap::Parser;
    use std::path::PathBuf;
    use wardbook_core::{CollectionName, ObjectStore, StoreConfig};

    #[test]
    fn parse_payload_accepts_objects_only() {
        let map = parse_payload(r#"{"name": "Ana"}"#).unwrap();
        assert_eq!(map["name"], "Ana");
        assert!(parse_payload("[1]").is_err());
        assert!(parse_payload("{").is_err());
    }

    #[test]
    fn missing_db_path_is_rejected() {
        let err = with_required_db_path(StoreConfig::default(), None).unwrap_err();
        assert!(err.to_string().contains("--db"));
    }

    #[test]
    fn db_flag_overrides_config_path() {
        let config = with_required_db_path(
            StoreConfig::with_db_path("/tmp/from-config.sqlite3"),
            Some(PathBuf::from("/tmp/from-flag.sqlite3")),
        )
        .unwrap();
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/tmp/from-flag.sqlite3"))
        );

        let kept =
            with_required_db_path(StoreConfig::with_db_path("/tmp/a.sqlite3"), None).unwrap();
        assert_eq!(kept.db_path, Some(PathBuf::from("/tmp/a.sqlite3")));
    }

    #[tokio::test]
    async fn created_record_persists_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("wardbook.sqlite3");
        let db_arg = db.to_str().unwrap();

        let create = Cli::parse_from([
            "wardbook",
            "--db",
            db_arg,
            "create",
            "patient",
            r#"{"name": "Ana"}"#,
        ]);
        run_command(create).await.unwrap();
        let second = Cli::parse_from(["wardbook", "--db", db_arg, "list", "patient"]);
        run_command(second).await.unwrap();

        let store = ObjectStore::open(&StoreConfig::with_db_path(&db))
            .await
            .unwrap();
        let patients = store.list(&CollectionName::patient(), None).await.unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].field_str("name"), Some("Ana"));
    }
}
