//! Property-based tests for the algebra of trajectory match modes.

use proptest::prelude::*;
use serde_json::json;
use std::future::Future;
use trajeval_core::{Message, ToolCall};
use trajeval_trajectory::{ToolArgsMatchMode, TrajectoryMatchMode, TrajectoryMatcher};

// ============================================================================
// Generators
// ============================================================================

fn arb_tool_call() -> impl Strategy<Value = ToolCall> {
    (prop_oneof![Just("get_weather"), Just("search")], 0..3i64)
        .prop_map(|(name, x)| ToolCall::new(name).with_args(json!({"x": x})))
}

/// A trajectory of tool-calling rounds, each followed by its tool result
fn arb_trajectory() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(prop::collection::vec(arb_tool_call(), 0..3), 0..4).prop_map(|rounds| {
        let mut messages = vec![Message::user("go")];
        for (i, calls) in rounds.into_iter().enumerate() {
            messages.push(Message::assistant_with_tool_calls("", calls));
            messages.push(Message::tool("ok", &format!("call_{}", i)));
        }
        messages.push(Message::assistant("done"));
        messages
    })
}

fn block_on<F: Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(fut)
}

fn check(mode: TrajectoryMatchMode, args: ToolArgsMatchMode, a: &[Message], b: &[Message]) -> bool {
    block_on(TrajectoryMatcher::new(mode).with_tool_args_mode(args).score(a, b))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_strict_reflexive(t in arb_trajectory()) {
        prop_assert!(check(TrajectoryMatchMode::Strict, ToolArgsMatchMode::Exact, &t, &t));
    }

    #[test]
    fn prop_subset_superset_duality(a in arb_trajectory(), b in arb_trajectory()) {
        for args in [ToolArgsMatchMode::Exact, ToolArgsMatchMode::Ignore] {
            prop_assert_eq!(
                check(TrajectoryMatchMode::Subset, args, &a, &b),
                check(TrajectoryMatchMode::Superset, args, &b, &a)
            );
        }
    }

    #[test]
    fn prop_unordered_symmetric(a in arb_trajectory(), b in arb_trajectory()) {
        prop_assert_eq!(
            check(TrajectoryMatchMode::Unordered, ToolArgsMatchMode::Exact, &a, &b),
            check(TrajectoryMatchMode::Unordered, ToolArgsMatchMode::Exact, &b, &a)
        );
    }

    #[test]
    fn prop_strict_implies_unordered(a in arb_trajectory(), b in arb_trajectory()) {
        if check(TrajectoryMatchMode::Strict, ToolArgsMatchMode::Exact, &a, &b) {
            prop_assert!(check(TrajectoryMatchMode::Unordered, ToolArgsMatchMode::Exact, &a, &b));
        }
    }

    #[test]
    fn prop_tool_args_mode_monotonic(a in arb_trajectory(), b in arb_trajectory()) {
        for mode in [
            TrajectoryMatchMode::Strict,
            TrajectoryMatchMode::Unordered,
            TrajectoryMatchMode::Subset,
            TrajectoryMatchMode::Superset,
        ] {
            let exact = check(mode, ToolArgsMatchMode::Exact, &a, &b);
            let subset = check(mode, ToolArgsMatchMode::Subset, &a, &b);
            let superset = check(mode, ToolArgsMatchMode::Superset, &a, &b);
            let ignore = check(mode, ToolArgsMatchMode::Ignore, &a, &b);
            if exact {
                prop_assert!(subset && superset && ignore);
            }
            if subset || superset {
                prop_assert!(ignore);
            }
        }
    }
}
