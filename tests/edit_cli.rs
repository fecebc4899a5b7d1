mod support;

use predicates::str::contains;
use serde_json::Value;

use support::{string_field, write_fixture_store, TestDir, TestResult};

const OUTLINE: &str = "aaaa0001-0000-4000-8000-000000000001";
const LOOSE: &str = "aaaa0002-0000-4000-8000-000000000002";
const REPORT: &str = "11111111-aaaa-4aaa-8aaa-aaaaaaaaaaaa";

#[test]
fn task_fields_edited_by_flags() -> TestResult {
    let dir = TestDir::new();
    write_fixture_store(&dir)?;

    let edited = dir.json(&[
        "edit",
        "11111111",
        "-t",
        "Write final report",
        "-d",
        "due friday",
        "-m",
        "aaaa0002,aaaa0001",
    ])?;
    assert_eq!(edited["kind"], "task");
    assert_eq!(edited["task"]["title"], "Write final report");
    assert_eq!(edited["task"]["description"], "due friday");
    assert_eq!(edited["task"]["memo_refs"], serde_json::json!([LOOSE, OUTLINE]));

    let stored = dir.stored_task(REPORT)?;
    assert_eq!(stored["order"], 1.0);
    assert_eq!(string_field(&stored, "created_at"), "2024-03-01T09:00:00Z");
    assert_ne!(string_field(&stored, "updated_at"), "2024-03-01T09:00:00Z");
    Ok(())
}

#[test]
fn empty_memo_flag_clears_references() -> TestResult {
    let dir = TestDir::new();
    write_fixture_store(&dir)?;

    let edited = dir.json(&["edit", REPORT, "-m"])?;
    assert_eq!(edited["task"]["memo_refs"], Value::Array(Vec::new()));
    dir.json(&["rm", "aaaa0001"])?;
    Ok(())
}

#[test]
fn unknown_memo_reference_leaves_task_untouched() -> TestResult {
    let dir = TestDir::new();
    write_fixture_store(&dir)?;
    let before = dir.store()?;

    dir.cmd()
        .args(["edit", REPORT, "-t", "Renamed", "-m", "ffff"])
        .assert()
        .code(2)
        .stderr(contains("memo not found: ffff"));
    assert_eq!(dir.store()?, before);
    Ok(())
}

#[test]
fn memo_fields_edited_by_flags() -> TestResult {
    let dir = TestDir::new();
    write_fixture_store(&dir)?;

    let edited = dir.json(&["edit", "aaaa0002", "-t", "Loose ends", "-c", "tidy up"])?;
    assert_eq!(edited["kind"], "memo");
    assert_eq!(edited["memo"]["title"], "Loose ends");
    assert_eq!(edited["memo"]["content"], "tidy up");

    let cleared = dir.json(&["edit", "aaaa0001", "--clear-title"])?;
    assert!(cleared["memo"].get("title").is_none());
    assert_eq!(cleared["memo"]["content"], "intro, body, end");
    Ok(())
}

#[test]
fn flags_for_the_other_kind_are_rejected() -> TestResult {
    let dir = TestDir::new();
    write_fixture_store(&dir)?;

    dir.cmd()
        .args(["edit", REPORT, "-c", "content"])
        .assert()
        .code(2)
        .stderr(contains("only apply to memos"));
    dir.cmd()
        .args(["edit", OUTLINE, "-d", "description"])
        .assert()
        .code(2)
        .stderr(contains("only apply to tasks"));
    Ok(())
}

#[test]
fn blank_title_edit_rejected() -> TestResult {
    let dir = TestDir::new();
    write_fixture_store(&dir)?;
    dir.cmd()
        .args(["edit", REPORT, "-t", " "])
        .assert()
        .code(2);
    Ok(())
}

#[cfg(unix)]
mod with_editor {
    use super::*;

    /// Script that replaces the edited file with `contents`.
    fn fake_editor(dir: &TestDir, contents: &str) -> Result<String, Box<dyn std::error::Error>> {
        let body = format!("cat > \"$1\" <<'TAMO_EOF'\n{contents}\nTAMO_EOF\n");
        let script = dir.write_file("fake-editor.sh", &body)?;
        Ok(format!("sh {}", script.display()))
    }

    #[test]
    fn task_edited_in_editor() -> TestResult {
        let dir = TestDir::new();
        write_fixture_store(&dir)?;
        let editor = fake_editor(
            &dir,
            &format!(
                "# Report v2\n\nrewritten body\n\n# Memo References (one ID per line):\n{LOOSE}\n"
            ),
        )?;

        let output = dir
            .cmd()
            .env("EDITOR", editor)
            .args(["--json", "edit", "11111111"])
            .assert()
            .success();
        let envelope: Value = serde_json::from_slice(&output.get_output().stdout)?;
        let task = &envelope["data"]["task"];
        assert_eq!(task["title"], "Report v2");
        assert_eq!(task["description"], "rewritten body");
        assert_eq!(task["memo_refs"], serde_json::json!([LOOSE]));
        Ok(())
    }

    #[test]
    fn memo_edited_in_editor() -> TestResult {
        let dir = TestDir::new();
        write_fixture_store(&dir)?;
        let editor = fake_editor(&dir, "# \n\nfresh content")?;

        dir.cmd()
            .env("VISUAL", editor)
            .args(["edit", "aaaa0001", "-e"])
            .assert()
            .success()
            .stdout(contains("Memo '<no title>' updated"));

        let store = dir.store()?;
        assert!(store["memos"][0].get("title").is_none());
        assert_eq!(store["memos"][0]["content"], "fresh content");
        Ok(())
    }

    #[test]
    fn editor_document_without_title_is_malformed() -> TestResult {
        let dir = TestDir::new();
        write_fixture_store(&dir)?;
        let before = dir.store()?;
        let editor = fake_editor(&dir, "no heading here")?;

        dir.cmd()
            .env("EDITOR", editor)
            .args(["edit", REPORT])
            .assert()
            .code(2)
            .stderr(contains("Malformed document"));
        assert_eq!(dir.store()?, before);
        Ok(())
    }

    #[test]
    fn failing_editor_aborts_edit() -> TestResult {
        let dir = TestDir::new();
        write_fixture_store(&dir)?;
        let before = dir.store()?;

        dir.cmd()
            .env("EDITOR", "false")
            .args(["edit", REPORT])
            .assert()
            .code(4)
            .stderr(contains("editor exited with exit code 1"));
        assert_eq!(dir.store()?, before);
        Ok(())
    }

    #[test]
    fn memo_added_through_editor() -> TestResult {
        let dir = TestDir::initialized()?;
        let editor = fake_editor(&dir, "# Drafted\n\nwritten in the editor")?;

        let output = dir
            .cmd()
            .env("EDITOR", editor)
            .args(["--json", "add", "memo", "-e"])
            .assert()
            .success();
        let envelope: Value = serde_json::from_slice(&output.get_output().stdout)?;
        assert_eq!(envelope["data"]["title"], "Drafted");
        assert_eq!(envelope["data"]["content"], "written in the editor");
        Ok(())
    }

    #[test]
    fn configured_editor_wins_over_environment() -> TestResult {
        let dir = TestDir::new();
        write_fixture_store(&dir)?;
        let editor = fake_editor(&dir, "# From config\n")?;
        dir.write_file(".tamo.toml", &format!("[editor]\ncommand = \"{editor}\"\n"))?;

        dir.cmd()
            .env("EDITOR", "false")
            .args(["edit", REPORT])
            .assert()
            .success()
            .stdout(contains("Task 'From config' updated"));
        Ok(())
    }
}
