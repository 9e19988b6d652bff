use std::fs;
use std::path::Path;

use anyhow::Result;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

const PRODUCTS: &str = r#"[
    {"id": "A", "title": "Anorak", "price": 180.0, "currency": "USD"},
    {"id": "B", "title": "Beanie", "price": 15.0, "currency": "USD"},
    {"id": "C", "title": "Cap", "price": 20.0, "currency": "USD"},
    {"id": "D", "title": "Down vest", "price": 140.0, "currency": "USD"}
]"#;

// Mixes current and legacy field names
const INTERACTIONS: &str = r#"[
    {"user_id": "user1", "product_id": "A", "event_type": "purchase", "timestamp": "2024-03-01T10:00:00Z"},
    {"user_id": "user1", "product_id": "B", "event_type": "add_to_cart", "timestamp": "2024-03-01T10:05:00Z"},
    {"user_id": "user2", "product_id": "A", "interaction_type": "view", "timestamp": "2024-03-02T09:00:00Z"},
    {"user_id": "user2", "product_id": "B", "interaction_type": "cart_add", "timestamp": "2024-03-02T09:01:00Z"},
    {"user_id": "user3", "product_id": "A", "event_type": "purchase", "timestamp": "2024-03-03T12:00:00Z"},
    {"user_id": "user3", "product_id": "C", "event_type": "purchase", "timestamp": "2024-03-03T12:00:00Z"}
]"#;

const NEIGHBORS: &str = r#"{
    "A": [{"product_id": "D", "score": 0.9}]
}"#;

fn write_fixture(dir: &Path) -> Result<()> {
    fs::write(dir.join("products.json"), PRODUCTS)?;
    fs::write(dir.join("interactions.json"), INTERACTIONS)?;
    fs::write(dir.join("neighbors.json"), NEIGHBORS)?;
    Ok(())
}

fn cobuy_command(data_dir: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("cobuy")?;
    cmd.arg("--data-dir").arg(data_dir);
    cmd.env("NO_COLOR", "1").env_remove("FORCE_COLOR");
    for var in [
        "COBUY_CONFIG",
        "COLLABORATIVE_WEIGHT",
        "CONTENT_WEIGHT",
        "ENRICHMENT_WEIGHT",
        "TOP_N_RECOMMENDATIONS",
        "TOP_K_SIMILAR",
        "TOP_M_ENRICHMENT",
    ] {
        cmd.env_remove(var);
    }
    Ok(cmd)
}

fn recommended_ids(json: &JsonValue) -> Vec<String> {
    json["recommendations"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e["product_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn build_writes_interaction_tables() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    cobuy_command(data.path())?
        .arg("build")
        .assert()
        .success()
        .stdout(contains("Tables built"))
        .stdout(contains("Users: 3"));

    let lift: JsonValue =
        serde_json::from_str(&fs::read_to_string(data.path().join("lift_scores.json"))?)?;
    assert_eq!(lift["total_users"], 3);
    assert_eq!(lift["scores"]["A"]["B"], 1.0);

    let co_occurrence: JsonValue =
        serde_json::from_str(&fs::read_to_string(data.path().join("co_occurrence.json"))?)?;
    assert_eq!(co_occurrence["A"]["B"], 2);
    assert_eq!(co_occurrence["B"]["A"], 2);

    Ok(())
}

#[test]
fn recommend_computes_ranked_json() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    let output = cobuy_command(data.path())?
        .args(["recommend", "A", "--json"])
        .output()?;
    assert!(output.status.success());

    let json: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["target_product_id"], "A");
    // B and C tie on lift and break by id; D comes from similarity only
    assert_eq!(recommended_ids(&json), vec!["B", "C", "D"]);
    assert_eq!(
        json["recommendations"][0]["components"]["collaborative_interactions"],
        2
    );

    Ok(())
}

#[test]
fn recommend_honors_flags() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    let output = cobuy_command(data.path())?
        .args(["recommend", "A", "--json", "--top-n", "1", "--content-weight", "5"])
        .output()?;
    assert!(output.status.success());

    let json: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(recommended_ids(&json), vec!["D"]);

    Ok(())
}

#[test]
fn recommend_reads_weights_from_env() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    let output = cobuy_command(data.path())?
        .env("COLLABORATIVE_WEIGHT", "0")
        .env("TOP_N_RECOMMENDATIONS", "2")
        .args(["recommend", "A", "--json"])
        .output()?;
    assert!(output.status.success());

    let json: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(recommended_ids(&json), vec!["D", "B"]);

    Ok(())
}

#[test]
fn recommend_unknown_product_fails() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    cobuy_command(data.path())?
        .args(["recommend", "Z"])
        .assert()
        .failure()
        .stderr(contains("Product not found in catalog: Z"));

    Ok(())
}

#[test]
fn rejects_invalid_configuration() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    cobuy_command(data.path())?
        .args(["recommend", "A", "--top-k", "0"])
        .assert()
        .failure()
        .stderr(contains("top_k_candidates must be > 0"));

    Ok(())
}

#[test]
fn batch_then_recommend_serves_stored_results() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    cobuy_command(data.path())?
        .arg("batch")
        .assert()
        .success()
        .stdout(contains("Batch complete"))
        .stdout(contains("Succeeded: 4"));

    let store: JsonValue =
        serde_json::from_str(&fs::read_to_string(data.path().join("recommendations.json"))?)?;
    assert_eq!(store["version"], 1);
    assert_eq!(store["products"]["A"]["status"], "recommended");
    assert_eq!(recommended_ids(&store["products"]["A"]), vec!["B", "C", "D"]);

    cobuy_command(data.path())?
        .args(["recommend", "A"])
        .assert()
        .success()
        .stdout(contains("(stored)"))
        .stdout(contains("Beanie"));

    cobuy_command(data.path())?
        .args(["recommend", "A", "--fresh"])
        .assert()
        .success()
        .stdout(contains("(computed)"));

    Ok(())
}

#[test]
fn batch_rebuilds_tables_from_current_log() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    cobuy_command(data.path())?.arg("build").assert().success();

    fs::write(
        data.path().join("interactions.json"),
        r#"[
            {"user_id": "user1", "product_id": "A", "event_type": "purchase", "timestamp": "2024-04-01T10:00:00Z"},
            {"user_id": "user1", "product_id": "C", "event_type": "purchase", "timestamp": "2024-04-01T10:00:00Z"}
        ]"#,
    )?;

    cobuy_command(data.path())?
        .arg("batch")
        .assert()
        .success()
        .stdout(contains("Batch complete"));

    let store: JsonValue =
        serde_json::from_str(&fs::read_to_string(data.path().join("recommendations.json"))?)?;
    let ids = recommended_ids(&store["products"]["A"]);
    assert!(ids.contains(&"C".to_string()), "{ids:?}");
    assert!(!ids.contains(&"B".to_string()), "{ids:?}");

    let lift: JsonValue =
        serde_json::from_str(&fs::read_to_string(data.path().join("lift_scores.json"))?)?;
    assert_eq!(lift["total_users"], 1);
    assert_eq!(lift["scores"]["A"]["C"], 1.0);
    assert!(lift["scores"]["A"].get("B").is_none());

    Ok(())
}

#[test]
fn recommend_with_scoring_flags_skips_stored_results() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    cobuy_command(data.path())?.arg("batch").assert().success();

    let output = cobuy_command(data.path())?
        .args(["recommend", "A", "--json", "--top-n", "1"])
        .output()?;
    assert!(output.status.success());
    let json: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(recommended_ids(&json), vec!["B"]);

    let output = cobuy_command(data.path())?
        .args(["recommend", "A", "--json", "--collaborative-weight", "0"])
        .output()?;
    assert!(output.status.success());
    let json: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(recommended_ids(&json).first().map(String::as_str), Some("D"));

    cobuy_command(data.path())?
        .args(["recommend", "A", "--top-n", "2"])
        .assert()
        .success()
        .stdout(contains("(computed)"));

    cobuy_command(data.path())?
        .args(["recommend", "A"])
        .assert()
        .success()
        .stdout(contains("(stored)"));

    Ok(())
}

#[test]
fn status_reports_counts() -> Result<()> {
    let data = TempDir::new()?;
    write_fixture(data.path())?;

    cobuy_command(data.path())?
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Products: 4"))
        .stdout(contains("Interactions: 6"))
        .stdout(contains("Tables: not built"))
        .stdout(contains("Stored recommendations: none"));

    cobuy_command(data.path())?.arg("build").assert().success();
    cobuy_command(data.path())?.arg("batch").assert().success();

    cobuy_command(data.path())?
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Lift rows: 3"))
        .stdout(contains("Similarity index: neighbors.json (1 products)"))
        .stdout(contains("Stored recommendations: 4 (0 failed)"));

    Ok(())
}
