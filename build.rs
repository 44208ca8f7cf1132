//! Stamps the git revision into `--version` and fails the build when the
//! source tree breaks one of the house rules below.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Non-empty lines allowed per Rust source file.
const MAX_LINES: usize = 750;

/// Calls that may only appear in test code.
const PANICKING_CALLS: &[&str] = &[".unwrap()", ".expect("];

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=studio.yaml");
    println!("cargo:rustc-env=SLIDEFORGE_GIT_SHA={}", git_sha());

    let root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let sources = rust_sources(&root.join("src"));
    for source in &sources {
        println!("cargo:rerun-if-changed={}", source.path.display());
    }

    let mut problems = Vec::new();
    problems.extend(check_default_config(&root.join("studio.yaml")));
    for source in &sources {
        problems.extend(source.check(&root));
    }

    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("  {}", problem);
        }
        panic!("{} source rule violation(s), see above", problems.len());
    }
}

fn git_sha() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|sha| sha.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The default configuration is embedded with `include_str!`, so a YAML
/// error there would only surface at runtime.
fn check_default_config(path: &Path) -> Option<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return Some(format!("studio.yaml: unreadable: {}", e)),
    };
    match serde_yaml::from_str::<serde_yaml::Value>(&content) {
        Ok(serde_yaml::Value::Mapping(_)) => None,
        Ok(_) => Some("studio.yaml: top level must be a mapping".to_string()),
        Err(e) => Some(format!("studio.yaml: {}", e)),
    }
}

struct Source {
    path: PathBuf,
    content: String,
}

impl Source {
    /// Files under a `tests/` directory or named `tests.rs` / `*_tests.rs`.
    fn is_test_file(&self) -> bool {
        let name = self.path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        name == "tests.rs"
            || name.ends_with("_tests.rs")
            || self.path.components().any(|c| c.as_os_str() == "tests")
    }

    /// Lines before the first `#[cfg(test)]` of a non-test file.
    fn production_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        let lines = if self.is_test_file() { "" } else { self.content.as_str() };
        lines
            .lines()
            .enumerate()
            .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
            .map(|(i, line)| (i + 1, line))
    }

    fn check(&self, root: &Path) -> Vec<String> {
        let rel = self.path.strip_prefix(root).unwrap_or(&self.path).display();
        let mut problems = Vec::new();

        let lines = self.content.lines().filter(|l| !l.trim().is_empty()).count();
        if lines > MAX_LINES {
            problems.push(format!("{}: {} non-empty lines (max {})", rel, lines, MAX_LINES));
        }

        for (number, line) in self.content.lines().enumerate() {
            if line.contains("allow(dead_code)") {
                problems.push(format!(
                    "{}:{}: remove the code instead of allowing dead_code",
                    rel,
                    number + 1
                ));
            }
        }

        for (number, line) in self.production_lines() {
            let code = line.split("//").next().unwrap_or("");
            if let Some(call) = PANICKING_CALLS.iter().find(|call| code.contains(**call)) {
                problems.push(format!(
                    "{}:{}: `{}` outside tests; propagate the error",
                    rel, number, call
                ));
            }
        }
        problems
    }
}

fn rust_sources(dir: &Path) -> Vec<Source> {
    let mut sources = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return sources;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            sources.extend(rust_sources(&path));
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            if let Ok(content) = fs::read_to_string(&path) {
                sources.push(Source { path, content });
            }
        }
    }
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    sources
}
