//! Tool-call argument matching
//!
//! A [`ToolArgsMatcher`] decides whether two argument mappings for the same
//! tool are equivalent. The global [`ToolArgsMatchMode`] applies unless a
//! per-tool [`ToolArgsOverride`] replaces it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use trajeval_core::{EvalError, ToolArgs};

/// How tool-call arguments are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolArgsMatchMode {
    /// Same keys, recursively equal values
    #[default]
    Exact,
    /// Arguments are never compared
    Ignore,
    /// Every reference key/value pair must appear in the output
    Subset,
    /// Every output key/value pair must appear in the reference
    Superset,
}

impl ToolArgsMatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Ignore => "ignore",
            Self::Subset => "subset",
            Self::Superset => "superset",
        }
    }

    /// Compare two argument mappings under this mode
    pub fn matches(&self, output: &ToolArgs, reference: &ToolArgs) -> bool {
        match self {
            Self::Exact => {
                output.len() == reference.len() && contains_all(output, reference)
            }
            Self::Ignore => true,
            Self::Subset => contains_all(output, reference),
            Self::Superset => contains_all(reference, output),
        }
    }
}

impl fmt::Display for ToolArgsMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolArgsMatchMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "ignore" => Ok(Self::Ignore),
            "subset" => Ok(Self::Subset),
            "superset" => Ok(Self::Superset),
            other => Err(EvalError::InvalidMode(format!(
                "unknown tool args match mode '{}', expected exact, ignore, subset or superset",
                other
            ))),
        }
    }
}

/// Every key of `needles` is present in `haystack` with an equal value.
fn contains_all(haystack: &ToolArgs, needles: &ToolArgs) -> bool {
    needles.iter().all(|(key, value)| haystack.get(key).is_some_and(|v| values_equal(v, value)))
}

/// Deep structural equality
///
/// Numbers compare by value, so `1` and `1.0` are equal. Arrays compare
/// element-wise in order.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Custom argument comparison for one tool
#[async_trait]
pub trait ArgsPredicate: Send + Sync {
    async fn matches(&self, output: &ToolArgs, reference: &ToolArgs) -> bool;
}

struct FnPredicate<F>(F);

#[async_trait]
impl<F> ArgsPredicate for FnPredicate<F>
where
    F: Fn(&ToolArgs, &ToolArgs) -> bool + Send + Sync,
{
    async fn matches(&self, output: &ToolArgs, reference: &ToolArgs) -> bool {
        (self.0)(output, reference)
    }
}

struct AsyncFnPredicate<F>(F);

#[async_trait]
impl<F, Fut> ArgsPredicate for AsyncFnPredicate<F>
where
    F: Fn(ToolArgs, ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn matches(&self, output: &ToolArgs, reference: &ToolArgs) -> bool {
        (self.0)(output.clone(), reference.clone()).await
    }
}

/// Per-tool replacement for the global argument matching
#[derive(Clone)]
pub enum ToolArgsOverride {
    /// Use a different mode for this tool
    Mode(ToolArgsMatchMode),
    /// Compare only these dotted key paths
    KeyPaths(Vec<String>),
    /// Delegate to a custom predicate
    Predicate(Arc<dyn ArgsPredicate>),
}

impl ToolArgsOverride {
    pub fn key_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::KeyPaths(paths.into_iter().map(Into::into).collect())
    }

    /// Wrap a synchronous predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&ToolArgs, &ToolArgs) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(FnPredicate(f)))
    }

    /// Wrap an asynchronous predicate
    pub fn async_predicate<F, Fut>(f: F) -> Self
    where
        F: Fn(ToolArgs, ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::Predicate(Arc::new(AsyncFnPredicate(f)))
    }
}

impl fmt::Debug for ToolArgsOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(mode) => f.debug_tuple("Mode").field(mode).finish(),
            Self::KeyPaths(paths) => f.debug_tuple("KeyPaths").field(paths).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<ToolArgsMatchMode> for ToolArgsOverride {
    fn from(mode: ToolArgsMatchMode) -> Self {
        Self::Mode(mode)
    }
}

/// Resolves per-tool argument matching
#[derive(Debug, Clone, Default)]
pub struct ToolArgsMatcher {
    mode: ToolArgsMatchMode,
    overrides: HashMap<String, ToolArgsOverride>,
}

impl ToolArgsMatcher {
    pub fn new(mode: ToolArgsMatchMode) -> Self {
        Self { mode, overrides: HashMap::new() }
    }

    pub fn with_override(mut self, tool_name: &str, override_: ToolArgsOverride) -> Self {
        self.overrides.insert(tool_name.to_string(), override_);
        self
    }

    pub fn mode(&self) -> ToolArgsMatchMode {
        self.mode
    }

    pub fn overrides(&self) -> &HashMap<String, ToolArgsOverride> {
        &self.overrides
    }

    /// Whether `output` and `reference` are equivalent arguments for `tool_name`
    pub async fn matches(&self, tool_name: &str, output: &ToolArgs, reference: &ToolArgs) -> bool {
        let matched = match self.overrides.get(tool_name) {
            None => self.mode.matches(output, reference),
            Some(ToolArgsOverride::Mode(mode)) => mode.matches(output, reference),
            Some(ToolArgsOverride::KeyPaths(paths)) => key_paths_match(paths, output, reference),
            Some(ToolArgsOverride::Predicate(predicate)) => {
                predicate.matches(output, reference).await
            }
        };
        tracing::trace!(tool = tool_name, matched, "compared tool args");
        matched
    }
}

fn lookup<'a>(args: &'a ToolArgs, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = args.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Compare only the given dotted paths
///
/// A path missing on either side, or holding values of different JSON types,
/// fails the match. Values at a path compare like [`values_equal`], so object
/// key order is ignored and `1` equals `1.0` at any depth.
fn key_paths_match(paths: &[String], output: &ToolArgs, reference: &ToolArgs) -> bool {
    paths.iter().all(|path| match (lookup(output, path), lookup(reference, path)) {
        (Some(out), Some(reference)) => {
            std::mem::discriminant(out) == std::mem::discriminant(reference)
                && values_equal(out, reference)
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ToolArgs {
        match value {
            Value::Object(map) => map,
            _ => panic!("test args must be an object"),
        }
    }

    #[test]
    fn test_exact_mode() {
        let a = args(json!({"city": "SF", "units": ["c", "f"]}));
        let b = args(json!({"units": ["c", "f"], "city": "SF"}));
        assert!(ToolArgsMatchMode::Exact.matches(&a, &b));

        let c = args(json!({"city": "SF", "units": ["f", "c"]}));
        assert!(!ToolArgsMatchMode::Exact.matches(&a, &c));
        let d = args(json!({"city": "SF"}));
        assert!(!ToolArgsMatchMode::Exact.matches(&a, &d));
    }

    #[test]
    fn test_numeric_equality() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!("1")));
        assert!(values_equal(&json!(null), &json!(null)));
    }

    #[test]
    fn test_subset_and_superset_modes() {
        let output = args(json!({"city": "SF", "units": "f"}));
        let reference = args(json!({"city": "SF"}));
        assert!(ToolArgsMatchMode::Subset.matches(&output, &reference));
        assert!(!ToolArgsMatchMode::Superset.matches(&output, &reference));
        assert!(ToolArgsMatchMode::Superset.matches(&reference, &output));
        assert!(ToolArgsMatchMode::Ignore.matches(&output, &args(json!({}))));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("superset".parse::<ToolArgsMatchMode>().unwrap(), ToolArgsMatchMode::Superset);
        let err = "fuzzy".parse::<ToolArgsMatchMode>().unwrap_err();
        assert!(matches!(err, EvalError::InvalidMode(_)));
    }

    #[tokio::test]
    async fn test_key_path_override() {
        let matcher = ToolArgsMatcher::new(ToolArgsMatchMode::Exact)
            .with_override("book", ToolArgsOverride::key_paths(["trip.city", "trip.dates"]));

        let out = args(json!({
            "trip": {"city": "SF", "dates": {"to": "2024-05-02", "from": "2024-05-01"}},
            "note": "window seat"
        }));
        let reference = args(json!({
            "trip": {"city": "SF", "dates": {"from": "2024-05-01", "to": "2024-05-02"}}
        }));
        assert!(matcher.matches("book", &out, &reference).await);

        // Other tools still use the global mode
        assert!(!matcher.matches("other", &out, &reference).await);
    }

    #[tokio::test]
    async fn test_key_path_missing_or_type_mismatch() {
        let matcher =
            ToolArgsMatcher::default().with_override("t", ToolArgsOverride::key_paths(["a.b"]));
        let out = args(json!({"a": {"b": 1}}));
        assert!(!matcher.matches("t", &out, &args(json!({"a": {}}))).await);
        assert!(!matcher.matches("t", &out, &args(json!({"a": {"b": "1"}}))).await);
        assert!(!matcher.matches("t", &args(json!({})), &args(json!({}))).await);
    }

    #[tokio::test]
    async fn test_mode_override() {
        let matcher = ToolArgsMatcher::new(ToolArgsMatchMode::Exact)
            .with_override("search", ToolArgsMatchMode::Ignore.into());
        let a = args(json!({"q": "rust"}));
        let b = args(json!({"q": "go"}));
        assert!(matcher.matches("search", &a, &b).await);
        assert!(!matcher.matches("lookup", &a, &b).await);
    }

    #[tokio::test]
    async fn test_predicate_overrides() {
        let case_insensitive = ToolArgsOverride::predicate(|out, reference| {
            let q = |a: &ToolArgs| {
                a.get("query").and_then(Value::as_str).unwrap_or_default().to_lowercase()
            };
            q(out) == q(reference)
        });
        let matcher = ToolArgsMatcher::default().with_override("search", case_insensitive);
        assert!(
            matcher
                .matches("search", &args(json!({"query": "Rust"})), &args(json!({"query": "rust"})))
                .await
        );

        let async_match = ToolArgsOverride::async_predicate(|out, reference| async move {
            tokio::task::yield_now().await;
            out.get("id") == reference.get("id")
        });
        let matcher = ToolArgsMatcher::default().with_override("fetch", async_match);
        assert!(
            matcher
                .matches("fetch", &args(json!({"id": 7, "x": 1})), &args(json!({"id": 7})))
                .await
        );
    }

    #[tokio::test]
    async fn test_key_path_nested_numbers_compare_by_value() {
        let matcher = ToolArgsMatcher::default()
            .with_override("t", ToolArgsOverride::key_paths(["n", "o", "list"]));
        let out = args(json!({"n": 1, "o": {"n": 1, "m": [2]}, "list": [{"k": 3}]}));
        let reference = args(json!({"n": 1.0, "o": {"m": [2.0], "n": 1.0}, "list": [{"k": 3.0}]}));
        assert!(matcher.matches("t", &out, &reference).await);

        let changed = args(json!({"n": 1, "o": {"n": 2, "m": [2]}, "list": [{"k": 3}]}));
        assert!(!matcher.matches("t", &changed, &reference).await);
    }
}
