//! Static screen for generated Python before it is handed back to a client.
//!
//! This is a line-oriented scan, not a parser. It flags imports of
//! system-level modules, calls to introspection or I/O builtins, and
//! attribute access on blocked modules. Full-line comments are skipped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Modules whose import or attribute access is rejected.
pub const DISALLOWED_MODULES: &[&str] = &[
    "os",
    "sys",
    "subprocess",
    "shutil",
    "pathlib",
    "requests",
    "urllib",
    "socket",
    "builtins",
];

/// Callables rejected whether called bare or as an attribute.
pub const DISALLOWED_FUNCTIONS: &[&str] = &[
    "eval",
    "exec",
    "compile",
    "__import__",
    "open",
    "input",
    "globals",
    "locals",
    "getattr",
    "setattr",
    "delattr",
    "__builtins__",
    "file",
];

static IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*import\s+(.+)$").expect("import pattern is valid"));

static FROM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*from\s+([A-Za-z_][\w.]*)\s+import\b").expect("from-import pattern is valid")
});

static CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").expect("call pattern is valid"));

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\.\s*[A-Za-z_]").expect("attribute pattern is valid"));

fn root_module(path: &str) -> &str {
    path.split('.').next().unwrap_or(path).trim()
}

fn preceded_by_dot(line: &str, start: usize) -> bool {
    line[..start].trim_end().ends_with('.')
}

fn push_unique(issues: &mut Vec<String>, issue: String) {
    if !issues.contains(&issue) {
        issues.push(issue);
    }
}

/// Returns one message per distinct disallowed construct, in order of
/// first appearance. An empty list means the code passed.
pub fn check_code_safety(code: &str) -> Vec<String> {
    let mut issues = Vec::new();

    for line in code.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }

        if let Some(caps) = FROM_IMPORT.captures(line) {
            let module = root_module(&caps[1]);
            if DISALLOWED_MODULES.contains(&module) {
                push_unique(&mut issues, format!("Importing from disallowed module: {}", module));
            }
            continue;
        }

        if let Some(caps) = IMPORT.captures(line) {
            for item in caps[1].split(',') {
                let path = item.split(" as ").next().unwrap_or(item);
                let module = root_module(path);
                if DISALLOWED_MODULES.contains(&module) {
                    push_unique(&mut issues, format!("Importing disallowed module: {}", module));
                }
            }
            continue;
        }

        for caps in CALL.captures_iter(line) {
            let name = &caps[1];
            if DISALLOWED_FUNCTIONS.contains(&name) {
                push_unique(&mut issues, format!("Call to disallowed function: {}", name));
            }
        }

        for caps in ATTRIBUTE.captures_iter(line) {
            let Some(m) = caps.get(1) else { continue };
            if preceded_by_dot(line, m.start()) {
                continue;
            }
            if DISALLOWED_MODULES.contains(&m.as_str()) {
                push_unique(&mut issues, format!("Access to disallowed module: {}", m.as_str()));
            }
        }
    }

    issues
}
