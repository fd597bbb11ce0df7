//! Integration Tests for Graph Evaluation
//!
//! These tests verify that cells, nodes and argument resets work together
//! correctly, observing re-execution through counters inside node bodies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cellgraph_core::{EvalContext, Freshness, Graph, GraphBuilder, GraphError, Result};

/// Per-node body execution counters.
#[derive(Clone, Default)]
struct Counts(Arc<HashMap<&'static str, AtomicUsize>>);

impl Counts {
    fn new(names: &[&'static str]) -> Self {
        Self(Arc::new(
            names.iter().map(|&name| (name, AtomicUsize::new(0))).collect(),
        ))
    }

    fn hit(&self, name: &str) {
        self.0[name].fetch_add(1, Ordering::SeqCst);
    }

    fn get(&self, name: &str) -> usize {
        self.0[name].load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> [usize; 3] {
        [self.get("a"), self.get("b"), self.get("ans")]
    }
}

/// Register a node whose body bumps its counter before running `f`.
fn counted<F>(builder: GraphBuilder<i64>, counts: &Counts, name: &'static str, f: F) -> GraphBuilder<i64>
where
    F: Fn(&mut EvalContext<'_, i64>) -> Result<i64> + Send + Sync + 'static,
{
    let counts = counts.clone();
    builder.node(name, move |ctx| {
        counts.hit(name);
        f(ctx)
    })
}

/// cells `{x: 42, y: no default}`, nodes `a = x+1`, `b = y+1`, `ans = a+b`.
fn scenario() -> (Graph<i64>, Counts) {
    let counts = Counts::new(&["a", "b", "ans"]);
    let builder = Graph::<i64>::builder().cell("x", 42).argument("y");
    let builder = counted(builder, &counts, "a", |ctx| Ok(ctx.cell("x")? + 1));
    let builder = counted(builder, &counts, "b", |ctx| Ok(ctx.cell("y")? + 1));
    let builder = counted(builder, &counts, "ans", |ctx| {
        Ok(ctx.node("a")? + ctx.node("b")?)
    });
    (builder.build().unwrap(), counts)
}

/// The full call sequence: defaults, cache hits and partial re-execution.
#[test]
fn call_sequence_reexecutes_only_what_changed() {
    let (mut graph, counts) = scenario();
    assert_eq!(graph.result_node(), Some("ans"));

    assert_eq!(graph.call([("x", 6), ("y", 9)]).unwrap(), 17);
    assert_eq!(counts.snapshot(), [1, 1, 1]);

    // Same arguments: everything is a cache hit.
    assert_eq!(graph.call([("x", 6), ("y", 9)]).unwrap(), 17);
    assert_eq!(counts.snapshot(), [1, 1, 1]);

    // Only y changed: `a` stays cached.
    assert_eq!(graph.call([("x", 6), ("y", 7)]).unwrap(), 15);
    assert_eq!(counts.snapshot(), [1, 2, 2]);

    // x omitted: it falls back to 42 and `a` re-executes.
    assert_eq!(graph.call([("y", 7)]).unwrap(), 51);
    assert_eq!(counts.snapshot(), [2, 2, 3]);
}

/// Two evaluations without writes run the body once.
#[test]
fn repeated_evaluation_runs_body_once() {
    let (mut graph, counts) = scenario();
    graph.write_cell("y", 1).unwrap();

    assert_eq!(graph.evaluate("ans").unwrap(), 45);
    assert_eq!(graph.evaluate("ans").unwrap(), 45);
    assert_eq!(graph.evaluate("a").unwrap(), 43);
    assert_eq!(counts.snapshot(), [1, 1, 1]);
    assert!(graph.stats().cache_hits >= 2);
}

/// Writing a cell re-executes exactly the nodes that read it transitively.
#[test]
fn write_reexecutes_exactly_its_closure() {
    let (mut graph, counts) = scenario();
    graph.write_cell("y", 1).unwrap();
    graph.evaluate("ans").unwrap();

    assert_eq!(graph.affected_by("x"), vec!["a", "ans"]);
    graph.write_cell("x", 0).unwrap();
    assert_eq!(graph.evaluate("ans").unwrap(), 3);
    assert_eq!(counts.snapshot(), [2, 1, 2]);
}

/// Unconditional writes dirty readers even when the value is unchanged.
#[test]
fn identical_write_still_invalidates() {
    let (mut graph, counts) = scenario();
    graph.write_cell("y", 1).unwrap();
    graph.evaluate("ans").unwrap();

    graph.write_cell("y", 1).unwrap();
    graph.evaluate("ans").unwrap();
    assert_eq!(counts.snapshot(), [1, 2, 2]);

    // The equality-checked variant does not.
    assert!(!graph.write_cell_if_changed("y", 1).unwrap());
    graph.evaluate("ans").unwrap();
    assert_eq!(counts.snapshot(), [1, 2, 2]);
}

/// A prior call's value never leaks into a call that omits the argument.
#[test]
fn omitted_argument_uses_default() {
    let (mut graph, _) = scenario();

    assert_eq!(graph.call([("x", 6), ("y", 9)]).unwrap(), 17);
    assert_eq!(graph.call([("y", 9)]).unwrap(), 53);
    assert_eq!(graph.read_cell("x").unwrap(), &42);
}

/// A branch switch starts tracking the new cell and stops tracking the old.
#[test]
fn dependencies_follow_the_branch_taken() {
    let runs = Arc::new(AtomicUsize::new(0));
    let runs_clone = runs.clone();

    let mut graph = Graph::<i64>::builder()
        .cell("flag", 1)
        .cell("c1", 10)
        .cell("c2", 20)
        .node("pick", move |ctx| {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            if ctx.cell("flag")? != 0 {
                ctx.cell("c1")
            } else {
                ctx.cell("c2")
            }
        })
        .build()
        .unwrap();

    assert_eq!(graph.evaluate("pick").unwrap(), 10);
    assert_eq!(graph.dependencies("pick").unwrap(), vec!["flag", "c1"]);

    // c2 is not read yet, so writing it changes nothing.
    graph.write_cell("c2", 21).unwrap();
    assert_eq!(graph.evaluate("pick").unwrap(), 10);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    graph.write_cell("flag", 0).unwrap();
    assert_eq!(graph.evaluate("pick").unwrap(), 21);
    assert_eq!(graph.dependencies("pick").unwrap(), vec!["flag", "c2"]);
    assert_eq!(graph.get_dependents("c1"), Vec::<&str>::new());
    assert_eq!(graph.get_dependents("c2"), vec!["pick"]);

    // c1 is no longer read.
    graph.write_cell("c1", 11).unwrap();
    assert_eq!(graph.evaluate("pick").unwrap(), 21);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Mutually recursive nodes fail and cache nothing.
#[test]
fn mutual_recursion_is_rejected() {
    let mut graph = Graph::<i64>::builder()
        .node("a", |ctx| ctx.node("b"))
        .node("b", |ctx| ctx.node("a"))
        .build()
        .unwrap();

    let err = graph.evaluate("a").unwrap_err();
    assert_eq!(
        err,
        GraphError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        }
    );
    assert!(graph.cached_value("a").unwrap().is_none());
    assert!(graph.cached_value("b").unwrap().is_none());
    assert_eq!(graph.freshness("a").unwrap(), Freshness::Unevaluated);

    // The failure is not remembered as a value.
    assert!(graph.evaluate("b").unwrap_err().is_cycle());
}

/// A cycle that only appears on one branch is caught when that branch runs.
#[test]
fn conditional_cycle_detected_when_taken() {
    let mut graph = Graph::<i64>::builder()
        .cell("loop", 0)
        .node("a", |ctx| {
            if ctx.cell("loop")? != 0 {
                ctx.node("b")
            } else {
                Ok(1)
            }
        })
        .node("b", |ctx| Ok(ctx.node("a")? + 1))
        .build()
        .unwrap();

    assert_eq!(graph.evaluate("b").unwrap(), 2);

    graph.write_cell("loop", 1).unwrap();
    assert!(graph.evaluate("b").unwrap_err().is_cycle());

    // Earlier results survive the failed attempt.
    assert_eq!(graph.cached_value("b").unwrap(), Some(&2));

    graph.write_cell("loop", 0).unwrap();
    assert_eq!(graph.evaluate("b").unwrap(), 2);
}

/// Referencing an undeclared node is an error, not a silent default.
#[test]
fn unknown_node_reference_fails() {
    let mut graph = Graph::<i64>::builder()
        .node("a", |ctx| ctx.node("ghost"))
        .build()
        .unwrap();

    assert_eq!(
        graph.evaluate("a").unwrap_err(),
        GraphError::UnknownNode("ghost".into())
    );
    assert_eq!(
        graph.evaluate("ghost").unwrap_err(),
        GraphError::UnknownNode("ghost".into())
    );
}

/// Reading a cell that does not exist yet starts working once it is written.
#[test]
fn late_cell_write_invalidates_failed_reader() {
    let mut graph = Graph::<i64>::builder()
        .node("late", |ctx| match ctx.cell("later") {
            Ok(v) => Ok(v),
            Err(GraphError::UnknownCell(_)) => Ok(-1),
            Err(err) => Err(err),
        })
        .build()
        .unwrap();

    assert_eq!(graph.evaluate("late").unwrap(), -1);
    assert_eq!(graph.get_dependents("later"), vec!["late"]);

    graph.write_cell("later", 5).unwrap();
    assert_eq!(graph.evaluate("late").unwrap(), 5);
}

/// Independent graphs never share state.
#[test]
fn graphs_are_independent() {
    let (mut first, first_counts) = scenario();
    let (mut second, second_counts) = scenario();

    assert_eq!(first.call([("y", 0)]).unwrap(), 44);
    assert_eq!(second.call([("x", 0), ("y", 0)]).unwrap(), 2);

    assert_eq!(first_counts.snapshot(), [1, 1, 1]);
    assert_eq!(second_counts.snapshot(), [1, 1, 1]);
    assert_eq!(first.read_cell("x").unwrap(), &42);
}

/// Staleness queries predict exactly which bodies the next call executes.
#[test]
fn stale_nodes_predict_reexecution() {
    let (mut graph, counts) = scenario();
    graph.call([("y", 1)]).unwrap();

    graph.reset_argument_cells([("y", 2)]).unwrap();
    assert_eq!(graph.stale_nodes(), vec!["b", "ans"]);
    assert_eq!(graph.freshness("a").unwrap(), Freshness::Verifiable);

    graph.evaluate_result().unwrap();
    assert_eq!(counts.snapshot(), [1, 2, 2]);
}
