//! Record export to the filesystem
//!
//! `DatasetExporter` writes one JSON document per record. `ExerciseExporter`
//! lays records out as ready-to-run exercise folders grouped by difficulty.

use crate::crawler::ChallengeRecord;
use crate::output::scaffold::{package_json, starter_code};
use crate::output::traits::{ExportSummary, OutputResult, RecordExporter};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `<dir>/<NNNNNNNNN>.json`, numbered from 1 in crawl order
pub struct DatasetExporter {
    dir: PathBuf,
}

impl DatasetExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RecordExporter for DatasetExporter {
    fn export(&self, records: &[ChallengeRecord]) -> OutputResult<ExportSummary> {
        fs::create_dir_all(&self.dir)?;

        for (index, record) in records.iter().enumerate() {
            let path = self.dir.join(format!("{:09}.json", index + 1));
            fs::write(&path, record_json(record)?)?;
        }

        tracing::info!("Wrote {} records to {}", records.len(), self.dir.display());
        Ok(ExportSummary {
            written: records.len(),
            ..ExportSummary::default()
        })
    }
}

/// Writes `<dir>/<difficulty>/<title>/` exercise folders
///
/// Each folder holds `challenge.json`, `README.md` (the instructions as
/// Markdown), `code.js` (an empty starter function), `code.spec.js` and
/// `package.json`. Records without code or tests are skipped; records whose
/// code has no recognizable function are reported as code problems.
pub struct ExerciseExporter {
    dir: PathBuf,
}

impl ExerciseExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_exercise(
        &self,
        folder: &Path,
        record: &ChallengeRecord,
        starter: &str,
    ) -> OutputResult<()> {
        let name = folder
            .strip_prefix(&self.dir)
            .unwrap_or(folder)
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "-");
        let readme = htmd::convert(&record.instructions)?;

        fs::create_dir_all(folder)?;
        fs::write(folder.join("challenge.json"), record_json(record)?)?;
        fs::write(
            folder.join("README.md"),
            format!("# {}\n\n{}\n", record.title, readme.trim_end()),
        )?;
        fs::write(folder.join("code.js"), starter)?;
        fs::write(folder.join("code.spec.js"), with_newline(&record.tests))?;
        fs::write(
            folder.join("package.json"),
            with_newline(&serde_json::to_string_pretty(&package_json(&name))?),
        )?;
        Ok(())
    }
}

impl RecordExporter for ExerciseExporter {
    fn export(&self, records: &[ChallengeRecord]) -> OutputResult<ExportSummary> {
        let mut summary = ExportSummary::default();
        let mut used: HashSet<PathBuf> = HashSet::new();

        for record in records {
            if record.code.trim().is_empty() || record.tests.trim().is_empty() {
                tracing::debug!("Skipping {}: no code or tests", record.source_url);
                summary.skipped += 1;
                continue;
            }

            let difficulty = slugify(&record.difficulty);
            let title = slugify(&record.title);

            let starter = match starter_code(&record.code) {
                Some(starter) => starter,
                None => {
                    tracing::warn!(
                        "No function to scaffold in {}, skipping",
                        record.source_url
                    );
                    summary.code_problems.push(format!("{}/{}", difficulty, title));
                    continue;
                }
            };

            let base = self.dir.join(&difficulty).join(&title);
            let mut folder = base.clone();
            let mut suffix = 2;
            while used.contains(&folder) {
                folder = base.with_file_name(format!("{}-{}", title, suffix));
                suffix += 1;
            }

            self.write_exercise(&folder, record, &starter)?;
            used.insert(folder);
            summary.written += 1;
        }

        Ok(summary)
    }
}

/// Lowercase ASCII alphanumerics joined by single hyphens
///
/// ```
/// use kata_harvest::output::slugify;
///
/// assert_eq!(slugify("Return the Sum of Two Numbers!"), "return-the-sum-of-two-numbers");
/// assert_eq!(slugify("Very Hard"), "very-hard");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Pretty JSON with keys in sorted order
fn record_json(record: &ChallengeRecord) -> OutputResult<String> {
    let value = serde_json::to_value(record)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn with_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, difficulty: &str, code: &str, tests: &str) -> ChallengeRecord {
        ChallengeRecord {
            source_url: format!("https://edabit.com/challenge/{}", slugify(title)),
            challenge_id: Some(slugify(title)),
            author_id: None,
            author_url: None,
            difficulty: difficulty.to_string(),
            title: title.to_string(),
            tags: vec!["math".to_string()],
            instructions: "<p>Sum two numbers.</p>".to_string(),
            code: code.to_string(),
            tests: tests.to_string(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Hello,   World  "), "hello-world");
        assert_eq!(slugify("C++ & Rust"), "c-rust");
        assert_eq!(slugify("Ünïcode"), "n-code");
        assert_eq!(slugify("!!!"), "untitled");
    }

    #[test]
    fn test_dataset_files_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DatasetExporter::new(dir.path().join("dataset"));

        let summary = exporter
            .export(&[
                record("First", "Easy", "a", "b"),
                record("Second", "Hard", "c", "d"),
            ])
            .unwrap();
        assert_eq!(summary.written, 2);

        let second = fs::read_to_string(dir.path().join("dataset/000000002.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(value["title"], "Second");
        assert_eq!(value["difficulty"], "Hard");

        // keys come out sorted
        let author = second.find("\"author_id\"").unwrap();
        let title = second.find("\"title\"").unwrap();
        assert!(author < title);
    }

    #[test]
    fn test_exercise_layout() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ExerciseExporter::new(dir.path());

        let mut challenge = record(
            "Return the Sum",
            "Very Easy",
            "function sum(a, b) {\n  return a + b;\n}",
            "Test.assertEquals(sum(1, 2), 3)",
        );
        challenge.instructions =
            "<p>Create <code>sum</code> that <strong>returns</strong> the total.</p>".to_string();

        let summary = exporter.export(&[challenge]).unwrap();
        assert_eq!(
            summary,
            ExportSummary {
                written: 1,
                ..ExportSummary::default()
            }
        );

        let folder = dir.path().join("very-easy/return-the-sum");
        assert_eq!(
            fs::read_to_string(folder.join("code.js")).unwrap(),
            "function sum(a, b) {\n  // Your code here.\n}\n\nmodule.exports = sum;\n"
        );
        assert_eq!(
            fs::read_to_string(folder.join("code.spec.js")).unwrap(),
            "Test.assertEquals(sum(1, 2), 3)\n"
        );

        let readme = fs::read_to_string(folder.join("README.md")).unwrap();
        assert!(readme.starts_with("# Return the Sum\n\n"));
        assert!(readme.contains("`sum`"));
        assert!(readme.contains("**returns**"));
        assert!(!readme.contains("<p>"));

        let package: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(folder.join("package.json")).unwrap())
                .unwrap();
        assert_eq!(package["name"], "kata-very-easy-return-the-sum");

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(folder.join("challenge.json")).unwrap())
                .unwrap();
        assert_eq!(stored["code"], "function sum(a, b) {\n  return a + b;\n}");
    }

    #[test]
    fn test_exercises_without_code_or_tests_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ExerciseExporter::new(dir.path());

        let summary = exporter
            .export(&[
                record("No Code", "Easy", "  ", "tests"),
                record("No Tests", "Easy", "function f() {}", ""),
                record("Complete", "Easy", "function f() {}", "tests"),
            ])
            .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.skipped, 2);
        assert!(summary.code_problems.is_empty());
        assert!(!dir.path().join("easy/no-code").exists());
        assert!(dir.path().join("easy/complete").exists());
    }

    #[test]
    fn test_unrecognized_code_is_a_code_problem() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ExerciseExporter::new(dir.path());

        let summary = exporter
            .export(&[
                record("Arrow", "Hard", "const arrow = (x) => x;", "tests"),
                record("Assigned", "Hard", "var assigned = function(x) {}", "tests"),
            ])
            .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.code_problems, vec!["hard/arrow".to_string()]);
        assert!(!dir.path().join("hard/arrow").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("hard/assigned/code.js")).unwrap(),
            "function assigned(x) {\n  // Your code here.\n}\n\nmodule.exports = assigned;\n"
        );
    }

    #[test]
    fn test_duplicate_titles_get_distinct_folders() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ExerciseExporter::new(dir.path());

        exporter
            .export(&[
                record("Same", "Easy", "function one() {}", "t"),
                record("Same", "Easy", "function two() {}", "t"),
            ])
            .unwrap();

        assert!(fs::read_to_string(dir.path().join("easy/same/code.js"))
            .unwrap()
            .contains("function one()"));
        assert!(fs::read_to_string(dir.path().join("easy/same-2/code.js"))
            .unwrap()
            .contains("function two()"));

        let package: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("easy/same-2/package.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(package["name"], "kata-easy-same-2");
    }
}
