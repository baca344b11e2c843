use std::fs;

use docfs::config::DocfsConfig;
use docfs::tooling::cli::{CliContext, Commands};
use docfs::ApiError;
use tempfile::TempDir;

fn workspace() -> (TempDir, CliContext) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("sdmc/switch")).unwrap();
    fs::write(root.join("sdmc/switch/app.nro"), b"nro").unwrap();
    let cli = CliContext::new(&root, DocfsConfig::default()).unwrap();
    (temp, cli)
}

#[test]
fn ls_json_contract_has_required_fields() {
    let (_temp, cli) = workspace();
    let output = cli
        .execute(&Commands::Ls {
            path: "sdmc/switch".to_string(),
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].get("name").and_then(|v| v.as_str()).is_some());
    assert!(entries[0].get("is_directory").and_then(|v| v.as_bool()).is_some());
    assert!(entries[0].get("size").and_then(|v| v.as_i64()).is_some());
}

#[test]
fn stat_json_contract_has_required_fields() {
    let (_temp, cli) = workspace();
    let output = cli
        .execute(&Commands::Stat {
            path: "sdmc".to_string(),
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.get("is_directory").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(parsed.get("size").and_then(|v| v.as_i64()), Some(0));
    assert!(parsed.get("handle").and_then(|v| v.as_str()).is_some());
    assert!(parsed.get("parent").and_then(|v| v.as_str()).is_some());
}

#[test]
fn stat_text_for_missing_path_is_an_error() {
    let (_temp, cli) = workspace();
    let result = cli.execute(&Commands::Stat {
        path: "sdmc/nothing".to_string(),
        format: "text".to_string(),
    });
    assert!(matches!(result, Err(ApiError::PathNotFound(p)) if p == "sdmc/nothing"));
}

#[test]
fn unzip_of_corrupt_archive_reports_transfer_error() {
    let (temp, cli) = workspace();
    let archive = temp.path().join("broken.zip");
    fs::write(&archive, b"not a zip").unwrap();

    let result = cli.execute(&Commands::Unzip {
        archive,
        dest: String::new(),
    });
    assert!(matches!(result, Err(ApiError::Transfer(_))));
}
