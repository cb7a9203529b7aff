//! Test support: one-time tracing setup and fixture files.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::{debug, info};

use crate::domain::{NodeId, XmlTree};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Write `content` to `dir/rel`, creating parent directories.
///
/// # Panics
/// When the file cannot be written; meant for test fixtures only.
pub fn write_fixture(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dir");
    }
    std::fs::write(&path, content).expect("write fixture");
    path
}

/// Single-line rendering without declaration or indentation, for assertions.
///
/// `<a x="1">t<b></b>tail</a>`; comments render as `<!--body-->`.
pub fn compact(tree: &XmlTree) -> String {
    let mut out = String::new();
    render(tree, tree.root(), &mut out);
    out
}

fn render(tree: &XmlTree, id: NodeId, out: &mut String) {
    let node = &tree[id];
    if node.is_comment() {
        out.push_str(&node.to_string());
        return;
    }
    out.push_str(&node.to_string());
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for &child in tree.children(id) {
        render(tree, child, out);
        if let Some(tail) = &tree[child].tail {
            out.push_str(tail);
        }
    }
    out.push_str(&format!("</{}>", node.tag));
}
