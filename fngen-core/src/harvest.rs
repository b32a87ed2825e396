//! Harvest test functions from Rust source as extra task description
//!
//! Every function carrying a test attribute (`#[test]`, `#[tokio::test]`, ...)
//! is rendered with its name and body and appended to the function
//! description, so existing tests can coach the backend.

use crate::errors::{FunctionError, FunctionResult};
use quote::ToTokens;
use std::path::Path;
use syn::visit::{self, Visit};
use tracing::debug;
use walkdir::WalkDir;

/// Render all test functions found in a source string
pub fn harvest_source(source: &str) -> FunctionResult<String> {
    let file = syn::parse_file(source).map_err(harvest_error)?;

    let mut collector = TestCollector::default();
    collector.visit_file(&file);

    let mut rendered = String::new();
    for test in &collector.tests {
        rendered.push_str(&format!(
            "Test Method Name: {}\nTest Method Body:\n{}\n\n",
            test.name, test.body
        ));
    }
    Ok(rendered)
}

/// Render all test functions in one source file
pub fn harvest_file(path: &Path) -> FunctionResult<String> {
    let source = std::fs::read_to_string(path).map_err(harvest_error)?;
    harvest_source(&source)
}

/// Render all test functions in every `.rs` file under `dir`, in name order
pub fn harvest_dir(dir: &Path) -> FunctionResult<String> {
    let mut rendered = String::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(harvest_error)?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }
        let harvested = harvest_file(path)?;
        if !harvested.is_empty() {
            debug!("Harvested tests from {}", path.display());
            rendered.push_str(&harvested);
        }
    }

    Ok(rendered)
}

fn harvest_error(err: impl std::fmt::Display) -> FunctionError {
    FunctionError::invalid_argument(format!(
        "Failed to extract scenarios from test source: {}",
        err
    ))
}

struct HarvestedTest {
    name: String,
    body: String,
}

#[derive(Default)]
struct TestCollector {
    tests: Vec<HarvestedTest>,
}

impl<'ast> Visit<'ast> for TestCollector {
    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        if item.attrs.iter().any(is_test_attribute) {
            self.tests.push(HarvestedTest {
                name: item.sig.ident.to_string(),
                body: item.block.to_token_stream().to_string(),
            });
        }
        visit::visit_item_fn(self, item);
    }
}

fn is_test_attribute(attr: &syn::Attribute) -> bool {
    attr.path().segments.last().is_some_and(|segment| segment.ident == "test")
}
