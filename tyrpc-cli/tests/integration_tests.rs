//! Integration tests for tyrpc-cli.
//!
//! These drive the library the binary is built on: config in, definition
//! in, files out.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use tyrpc_cli::{
    config::{CliArgs, ConfigManager},
    error::{CliError, LoadError},
    generator::render_all,
    loader::load_definition,
};

/// Get the path to test fixtures.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("tyrpc.toml");
    fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_fixture_definition_loads() {
    let app = load_definition(&fixtures_path().join("app_definition.json")).unwrap();
    assert_eq!(app.procedures.len(), 3);
    assert_eq!(app.models.len(), 4);
    assert_eq!(
        app.info.as_ref().and_then(|i| i.title.as_deref()),
        Some("Shop API")
    );
}

#[test]
fn test_non_object_model_is_invalid_definition() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.json");
    fs::write(
        &path,
        r#"{
            "arriSchemaVersion": "0.0.4",
            "procedures": {},
            "models": { "Status": { "enum": ["A", "B"] } },
            "errors": { "properties": {} }
        }"#,
    )
    .unwrap();

    let err = load_definition(&path).unwrap_err();
    assert!(err.is_invalid_definition());
    assert!(matches!(err, CliError::Load(LoadError::Invalid { .. })));
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_generate_from_config() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        &dir,
        r#"
[[generators]]
kind = "typescript"
client_name = "ShopClient"
output_file = "web/shop.ts"

[[generators]]
client_name = "AdminClient"
output_file = "admin/shop.ts"
type_prefix = "Admin"
generate_docs = false
"#,
    );

    let config = ConfigManager::load(Some(&config_path)).unwrap();
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            definition: Some(fixtures_path().join("app_definition.json")),
            output: Some(dir.path().join("out")),
        },
    );
    let app = load_definition(&config.input.definition).unwrap();

    let runs = render_all(&app, &config);
    assert_eq!(runs.len(), 2);

    for run in runs {
        for file in run.result.unwrap() {
            file.write().unwrap();
        }
    }

    let shop = fs::read_to_string(dir.path().join("out/web/shop.ts")).unwrap();
    assert!(shop.contains("export class ShopClientOrdersService {"));
    assert!(shop.contains("  async create(params: CreateOrderParams): Promise<Order> {"));
    assert!(shop.contains("  watch(params: OrderId, hooks: EventStreamHooks<Order> = {}): EventStreamController {"));
    assert!(shop.contains("  async health(): Promise<undefined> {"));
    assert!(shop.contains("export type OrderPayment = OrderPaymentCard | OrderPaymentInvoice;"));
    assert!(shop.contains("  method: \"CARD\";"));
    assert!(shop.contains("  priceCents: bigint;"));
    assert!(shop.contains("export interface ShopClientError {"));

    let admin = fs::read_to_string(dir.path().join("out/admin/shop.ts")).unwrap();
    assert!(admin.contains("export interface AdminOrder {"));
    assert!(admin.contains("  items: AdminLineItem[];"));
}

#[test]
fn test_rendering_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        &dir,
        "[[generators]]\nclient_name = \"ShopClient\"\noutput_file = \"shop.ts\"\n",
    );
    let config = ConfigManager::merge_cli_args(
        ConfigManager::load(Some(&config_path)).unwrap(),
        &CliArgs {
            definition: Some(fixtures_path().join("app_definition.json")),
            output: Some(dir.path().to_path_buf()),
        },
    );
    let app = load_definition(&config.input.definition).unwrap();

    let runs = render_all(&app, &config);
    let files = runs[0].result.as_ref().unwrap();
    assert_eq!(files[0].path, dir.path().join("shop.ts"));
    assert!(files[0].contents.contains("export class ShopClient {"));
    assert!(!dir.path().join("shop.ts").exists());
}

#[test]
fn test_invalid_config_reports_path() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, "[output\ndir = 1");

    let err = ConfigManager::load(Some(&config_path)).unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
    assert!(err.to_string().contains("tyrpc.toml"));
}
