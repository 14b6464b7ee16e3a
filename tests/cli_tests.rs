use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn sprints_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("sprints"))
}

fn init(dir: &Path) {
    sprints_cmd()
        .args(["init", "--project", "web", "--sequential"])
        .current_dir(dir)
        .assert()
        .success();
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = sprints_cmd()
        .args(args)
        .arg("--json")
        .current_dir(dir)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

fn create_sprint(dir: &Path) -> String {
    let json = run_json(
        dir,
        &["sprint", "create", "--start", "2026-06-01", "--end", "2026-06-12"],
    );
    json["id"].as_str().unwrap().to_string()
}

fn create_task(dir: &Path, title: &str, sprint: &str) -> String {
    let json = run_json(dir, &["task", "create", title, "--sprint", sprint]);
    json["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Basic CLI
// =============================================================================

#[test]
fn test_help() {
    sprints_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sprint lifecycle"));
}

#[test]
fn test_version() {
    sprints_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sprints"));
}

#[test]
fn test_not_initialized_error() {
    let temp_dir = TempDir::new().unwrap();

    sprints_cmd()
        .args(["sprint", "list"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();

    sprints_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(temp_dir.path().join(".sprints.toml").exists());
    assert!(temp_dir.path().join(".sprints").join("sprints").exists());
    assert!(temp_dir.path().join(".sprints").join("tasks").exists());
}

#[test]
fn test_init_twice_fails() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());

    sprints_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_init_with_yaml_frontmatter() {
    let temp_dir = TempDir::new().unwrap();

    sprints_cmd()
        .args(["init", "--frontmatter", "yaml", "--sequential"])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    let id = create_sprint(temp_dir.path());
    assert_eq!(id, "sp-00001");

    let dir = temp_dir.path().join(".sprints").join("sprints");
    let file = std::fs::read_dir(&dir).unwrap().next().unwrap().unwrap();
    let content = std::fs::read_to_string(file.path()).unwrap();
    assert!(content.starts_with("---"));
    assert!(content.contains("name: Sprint 1"));
}

// =============================================================================
// Sprints
// =============================================================================

#[test]
fn test_sprint_create_auto_names() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());

    create_sprint(temp_dir.path());
    create_sprint(temp_dir.path());

    sprints_cmd()
        .args(["sprint", "list"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Sprint 1"))
        .stdout(predicate::str::contains("Sprint 2"));
}

#[test]
fn test_sprint_create_rejects_reversed_dates() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());

    sprints_cmd()
        .args(["sprint", "create", "--start", "2026-06-12", "--end", "2026-06-01"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));
}

#[test]
fn test_start_empty_sprint_fails() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let sprint = create_sprint(temp_dir.path());

    sprints_cmd()
        .args(["sprint", "start", &sprint])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tasks"));

    let json = run_json(temp_dir.path(), &["sprint", "show", &sprint]);
    assert_eq!(json["sprint"]["status"], "planning");
}

#[test]
fn test_complete_moves_unfinished_to_backlog() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let sprint = create_sprint(temp_dir.path());
    let done = create_task(temp_dir.path(), "Ship login", &sprint);
    let open = create_task(temp_dir.path(), "Ship signup", &sprint);

    sprints_cmd()
        .args(["task", "status", &done, "done"])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    sprints_cmd()
        .args(["sprint", "start", &sprint])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("active"));

    let report = run_json(temp_dir.path(), &["sprint", "complete", &sprint]);
    assert_eq!(report["sprint"]["status"], "completed");
    assert_eq!(report["sprint"]["snapshot"]["tasks_completed"], 1);
    assert_eq!(report["sprint"]["snapshot"]["total_tasks"], 2);
    assert_eq!(report["moved_to_backlog"][0], open.as_str());

    let task = run_json(temp_dir.path(), &["task", "show", &open]);
    assert!(task.get("sprint").is_none());
    assert_eq!(task["moved_to_backlog"], true);
    assert_eq!(task["moved_from_sprint"], sprint.as_str());

    sprints_cmd()
        .args(["task", "list", "--backlog"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Ship signup"))
        .stdout(predicate::str::contains("Ship login").not());
}

#[test]
fn test_complete_into_new_sprint() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let sprint = create_sprint(temp_dir.path());
    let carried = create_task(temp_dir.path(), "Carry me", &sprint);
    let dropped = create_task(temp_dir.path(), "Drop me", &sprint);

    sprints_cmd()
        .args(["sprint", "start", &sprint])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    let report = run_json(
        temp_dir.path(),
        &[
            "sprint",
            "complete",
            &sprint,
            "--select",
            &carried,
            "--new-auto-name",
        ],
    );
    let created = &report["created_sprint"];
    assert_eq!(created["name"], "Sprint 2");
    assert_eq!(created["status"], "planning");
    assert_eq!(created["start_date"], "2026-06-13");
    assert_eq!(report["moved_to_sprint"][0], carried.as_str());
    assert_eq!(report["moved_to_backlog"][0], dropped.as_str());

    let task = run_json(temp_dir.path(), &["task", "show", &carried]);
    assert_eq!(task["sprint"], created["id"]);
}

#[test]
fn test_complete_rejects_closed_target() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let sprint = create_sprint(temp_dir.path());
    let other = create_sprint(temp_dir.path());
    let task = create_task(temp_dir.path(), "Stay put", &sprint);

    sprints_cmd()
        .args(["sprint", "cancel", &other])
        .current_dir(temp_dir.path())
        .assert()
        .success();
    sprints_cmd()
        .args(["sprint", "start", &sprint])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    sprints_cmd()
        .args(["sprint", "complete", &sprint, "--select", &task, "--target", &other])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid migration target"));

    let shown = run_json(temp_dir.path(), &["sprint", "show", &sprint]);
    assert_eq!(shown["sprint"]["status"], "active");
}

#[test]
fn test_complete_twice_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let sprint = create_sprint(temp_dir.path());
    create_task(temp_dir.path(), "Only task", &sprint);

    for args in [vec!["sprint", "start", &sprint], vec!["sprint", "complete", &sprint]] {
        sprints_cmd()
            .args(args)
            .current_dir(temp_dir.path())
            .assert()
            .success();
    }

    sprints_cmd()
        .args(["sprint", "complete", &sprint])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conflict"));
}

#[test]
fn test_incomplete_lists_open_subtasks() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let sprint = create_sprint(temp_dir.path());

    let json = run_json(
        temp_dir.path(),
        &[
            "task", "create", "Checkout", "--sprint", &sprint, "--subtask", "cart", "--subtask",
            "payment",
        ],
    );
    let task = json["id"].as_str().unwrap().to_string();

    sprints_cmd()
        .args(["task", "subtask-status", &task, "1", "done"])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    let incomplete = run_json(temp_dir.path(), &["sprint", "incomplete", &sprint]);
    assert_eq!(incomplete[0]["task_id"], task.as_str());
    assert_eq!(incomplete[0]["subtasks"].as_array().unwrap().len(), 2);
    assert_eq!(incomplete[0]["incomplete_subtasks"][0]["title"], "payment");
}

// =============================================================================
// Tasks
// =============================================================================

#[test]
fn test_task_assign_and_archive() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let sprint = create_sprint(temp_dir.path());

    let json = run_json(temp_dir.path(), &["task", "create", "Loose end"]);
    let task = json["id"].as_str().unwrap().to_string();
    assert_eq!(task, "tk-00001");

    sprints_cmd()
        .args(["task", "assign", &task, &sprint])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Assigned"));

    sprints_cmd()
        .args(["task", "archive", &task])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    sprints_cmd()
        .args(["task", "list", "--sprint", &sprint])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found"));

    let incomplete = run_json(temp_dir.path(), &["sprint", "incomplete", &sprint]);
    assert_eq!(incomplete.as_array().unwrap().len(), 0);
}

#[test]
fn test_migrate_retry_command() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    let from = create_sprint(temp_dir.path());
    let to = create_sprint(temp_dir.path());
    let task = create_task(temp_dir.path(), "Move me", &from);

    let summary = run_json(
        temp_dir.path(),
        &["sprint", "migrate", &from, &task, "--to", &to],
    );
    assert_eq!(summary["moved"][0], task.as_str());

    let again = run_json(
        temp_dir.path(),
        &["sprint", "migrate", &from, &task, "--to", &to],
    );
    assert_eq!(again["skipped"][0], task.as_str());
}

// =============================================================================
// GraphQL
// =============================================================================

#[test]
fn test_query_command() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());
    create_sprint(temp_dir.path());

    sprints_cmd()
        .args(["query", "{ sprints { name status } }"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Sprint 1"))
        .stdout(predicate::str::contains("PLANNING"));
}

#[test]
fn test_query_error_has_code() {
    let temp_dir = TempDir::new().unwrap();
    init(temp_dir.path());

    sprints_cmd()
        .args(["query", r#"mutation { startSprint(id: "sp-99999") { id } }"#])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("NOT_FOUND"));
}
