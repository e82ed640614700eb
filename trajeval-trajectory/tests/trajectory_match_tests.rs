//! Trajectory match scenarios

use serde_json::{Value, json};
use trajeval_core::{EvalError, Score};
use trajeval_trajectory::{
    ToolArgsMatchMode, ToolArgsOverride, TrajectoryMatchConfig, TrajectoryMatchMode,
    TrajectoryMatcher,
};

fn tool_call_message(name: &str, args: Value) -> Value {
    json!({
        "role": "assistant",
        "content": "",
        "tool_calls": [{"function": {"name": name, "arguments": args.to_string()}}]
    })
}

fn weather_trajectory(city: &str) -> Value {
    json!([
        {"role": "user", "content": "What is the weather in SF?"},
        tool_call_message("get_weather", json!({"city": city})),
        {"role": "tool", "content": "It's 80 degrees and sunny in SF."},
        {"role": "assistant", "content": "The weather in SF is 80 degrees and sunny."}
    ])
}

async fn score(
    mode: TrajectoryMatchMode,
    tool_args: ToolArgsMatchMode,
    a: &Value,
    b: &Value,
) -> Score {
    TrajectoryMatcher::new(mode)
        .with_tool_args_mode(tool_args)
        .evaluate(Some(a), Some(b))
        .await
        .unwrap()
        .score
}

/// Whether `a` matches `b` under `mode` with exact argument comparison
async fn exact_match(mode: TrajectoryMatchMode, a: &Value, b: &Value) -> bool {
    score(mode, ToolArgsMatchMode::Exact, a, b).await == Score::Bool(true)
}

#[tokio::test]
async fn test_strict_ignores_args_when_asked() {
    let outputs = weather_trajectory("SF");
    let reference = weather_trajectory("San Francisco");

    let ignore =
        score(TrajectoryMatchMode::Strict, ToolArgsMatchMode::Ignore, &outputs, &reference).await;
    assert_eq!(ignore, Score::Bool(true));

    assert!(!exact_match(TrajectoryMatchMode::Strict, &outputs, &reference).await);
}

#[tokio::test]
async fn test_reversed_calls_across_messages() {
    let outputs = json!({"messages": [
        {"role": "user", "content": "Weather in SF and London?"},
        tool_call_message("get_weather", json!({"city": "SF"})),
        {"role": "tool", "content": "sunny"},
        tool_call_message("get_weather", json!({"city": "London"})),
        {"role": "tool", "content": "rainy"},
        {"role": "assistant", "content": "SF is sunny, London is rainy."}
    ]});
    let reference = json!({"messages": [
        {"role": "user", "content": "Weather in SF and London?"},
        tool_call_message("get_weather", json!({"city": "London"})),
        {"role": "tool", "content": "rainy"},
        tool_call_message("get_weather", json!({"city": "SF"})),
        {"role": "tool", "content": "sunny"},
        {"role": "assistant", "content": "SF is sunny, London is rainy."}
    ]});

    assert!(!exact_match(TrajectoryMatchMode::Strict, &outputs, &reference).await);
    assert!(exact_match(TrajectoryMatchMode::Unordered, &outputs, &reference).await);
    assert!(exact_match(TrajectoryMatchMode::Subset, &outputs, &reference).await);
    assert!(exact_match(TrajectoryMatchMode::Superset, &outputs, &reference).await);
}

#[tokio::test]
async fn test_extra_tool_round() {
    let outputs = json!([
        {"role": "user", "content": "Weather and news in SF?"},
        tool_call_message("get_weather", json!({"city": "SF"})),
        {"role": "tool", "content": "sunny"},
        tool_call_message("get_news", json!({"city": "SF"})),
        {"role": "tool", "content": "no news"},
        {"role": "assistant", "content": "Sunny, no news."}
    ]);
    let reference = json!([
        {"role": "user", "content": "Weather and news in SF?"},
        tool_call_message("get_weather", json!({"city": "SF"})),
        {"role": "tool", "content": "sunny"},
        {"role": "assistant", "content": "Sunny, no news."}
    ]);

    assert!(exact_match(TrajectoryMatchMode::Superset, &outputs, &reference).await);
    assert!(!exact_match(TrajectoryMatchMode::Subset, &outputs, &reference).await);
    assert!(!exact_match(TrajectoryMatchMode::Unordered, &outputs, &reference).await);
    assert!(!exact_match(TrajectoryMatchMode::Strict, &outputs, &reference).await);
}

#[tokio::test]
async fn test_predicate_override_in_greedy_loop() {
    let outputs = weather_trajectory("sf");
    let reference = weather_trajectory("SF");

    let matcher = TrajectoryMatcher::new(TrajectoryMatchMode::Strict).with_tool_args_override(
        "get_weather",
        ToolArgsOverride::async_predicate(|out, reference| async move {
            let city = |v: &serde_json::Map<String, Value>| {
                v.get("city").and_then(Value::as_str).map(str::to_lowercase)
            };
            city(&out) == city(&reference)
        }),
    );
    let result = matcher.evaluate(Some(&outputs), Some(&reference)).await.unwrap();
    assert_eq!(result.score, Score::Bool(true));
    assert_eq!(result.key, "trajectory_strict_match");
}

#[tokio::test]
async fn test_config_driven_matcher() {
    let config = TrajectoryMatchConfig::from_json(
        r#"{
            "trajectory_match_mode": "unordered",
            "tool_args_match_overrides": {"get_weather": "ignore"}
        }"#,
    )
    .unwrap();
    let result = config
        .into_matcher()
        .evaluate(Some(&weather_trajectory("SF")), Some(&weather_trajectory("NYC")))
        .await
        .unwrap();
    assert_eq!(result.key, "trajectory_unordered_match");
    assert_eq!(result.score, Score::Bool(true));
}

#[tokio::test]
async fn test_malformed_inputs_are_errors_not_false() {
    let matcher = TrajectoryMatcher::new(TrajectoryMatchMode::Subset);

    let err = matcher.evaluate(None, Some(&weather_trajectory("SF"))).await.unwrap_err();
    assert!(matches!(err, EvalError::MissingTrajectory(_)));

    let err = matcher
        .evaluate(Some(&json!({"turns": []})), Some(&weather_trajectory("SF")))
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::InputShape(_)));
}
