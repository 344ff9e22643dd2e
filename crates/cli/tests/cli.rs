use assert_cmd::Command;

fn shopkeep() -> Command {
    let mut cmd = Command::cargo_bin("shopkeep").unwrap();
    cmd.env("SHOPKEEP_CONFIG_DIR", "/nonexistent/shopkeep-config")
        .env_remove("SHOPKEEP_ENV")
        .env_remove("SHOPKEEP__APP_USER__PASSWORD")
        .env_remove("SHOPKEEP__APP_USER__PASSWORD_FILE")
        .env_remove("SHOPKEEP__DATABASE__NAME")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let output = shopkeep().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["init", "plan", "verify"] {
        assert!(stdout.contains(command), "missing {command} in:\n{stdout}");
    }
}

#[test]
fn plan_prints_calls_in_provisioning_order() {
    let output = shopkeep().arg("plan").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 19);
    assert_eq!(lines[0], "use ecommerce_db");
    assert_eq!(
        lines[1],
        "ecommerce_db.createUser ecommerce_user [readWrite@ecommerce_db]"
    );
    assert_eq!(lines[2], "ecommerce_db.createCollection customers");
    assert_eq!(
        lines[3],
        "ecommerce_db.customers.createIndex customer_id_1 unique"
    );
    assert_eq!(lines[4], "ecommerce_db.customers.createIndex email_1 unique");
    assert_eq!(
        lines[18],
        "ecommerce_db.product_reviews.createIndex customer_id_1"
    );
}

#[test]
fn plan_json_is_machine_readable() {
    let output = shopkeep().args(["plan", "--json"]).output().unwrap();
    assert!(output.status.success());

    let calls: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let calls = calls.as_array().unwrap();
    assert_eq!(calls.len(), 19);
    assert_eq!(calls[0]["call"], "select_database");
    assert_eq!(calls[1]["call"], "create_user");
    assert_eq!(calls[1]["roles"][0]["role"], "readWrite");
    assert_eq!(calls[1]["roles"][0]["db"], "ecommerce_db");
    assert!(calls[1].get("password").is_none());
}

#[test]
fn plan_respects_database_override() {
    let output = shopkeep()
        .env("SHOPKEEP__DATABASE__NAME", "shop_test")
        .arg("plan")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().next(), Some("use shop_test"));
}

#[test]
fn init_without_password_fails_before_connecting() {
    let output = shopkeep().arg("init").output().unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("no password configured"), "{stderr}");
}

#[test]
fn unknown_policy_is_rejected() {
    let output = shopkeep()
        .args(["--on-existing", "maybe", "plan"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
